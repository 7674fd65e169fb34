//! Bearer token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{AccessClaims, TokenValidationError, validate_claims};

/// Verifies a raw bearer token and returns its claims.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenValidationError>;
}

/// HMAC-SHA256 token validator sharing a secret with the token issuer.
pub struct Hs256TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run through `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl TokenValidator for Hs256TokenValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenValidationError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
