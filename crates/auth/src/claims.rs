use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eximhub_core::ActorId;

/// JWT claims model.
///
/// Timestamps are epoch seconds so off-the-shelf `exp` validation applies
/// without custom deserializers. Tokens carry identity only: capabilities
/// come from the actor directory at check time, so a stale token can never
/// smuggle in a revoked role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the actor's identifier.
    pub sub: ActorId,

    /// Contact address the actor registered with.
    pub email: String,

    /// Issued-at, epoch seconds.
    pub iat: i64,

    /// Expiration, epoch seconds.
    pub exp: i64,
}

impl Claims {
    /// Build claims for an actor with the given validity window.
    pub fn for_actor(
        actor_id: ActorId,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            sub: actor_id,
            email: email.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_ttl() {
        let claims = Claims::for_actor(
            ActorId::new(),
            "trader@example.com",
            Utc::now(),
            chrono::Duration::hours(1),
        );
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn subject_serializes_as_uuid_string() {
        let actor = ActorId::new();
        let claims = Claims::for_actor(actor, "trader@example.com", Utc::now(), chrono::Duration::hours(1));
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], serde_json::json!(actor.to_string()));
    }
}
