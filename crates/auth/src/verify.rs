use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use thiserror::Error;

use crate::Claims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Verifies a bearer token and returns the claims it carries.
///
/// Kept as a trait so transport code can be tested against a stub and so the
/// signing scheme can change without touching the middleware.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HMAC-SHA256 verifier over a shared secret.
pub struct Hs256TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for Hs256TokenVerifier {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }
}
