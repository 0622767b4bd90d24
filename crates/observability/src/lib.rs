//! Process-wide logging setup shared by binaries and integration tests.

/// Install the global tracing subscriber.
///
/// Idempotent: calling it again after a subscriber is installed is a no-op,
/// so tests and binaries can both call it unconditionally.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter, format).
pub mod tracing;
