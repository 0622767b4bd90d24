use eximhub_core::ActorId;

/// Authenticated actor for a request.
///
/// Carries identity only; capabilities are looked up in the role directory
/// at decision time, so a role change takes effect without re-issuing
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor_id: ActorId,
    email: String,
}

impl ActorContext {
    pub fn new(actor_id: ActorId, email: String) -> Self {
        Self { actor_id, email }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
