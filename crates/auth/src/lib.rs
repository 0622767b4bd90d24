//! `eximhub-auth` — authentication boundary (token verification, roles).
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod role;
pub mod verify;

pub use claims::Claims;
pub use role::Role;
pub use verify::{AuthError, Hs256TokenVerifier, TokenVerifier};
