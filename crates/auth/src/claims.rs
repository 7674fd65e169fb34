use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use catalog_core::UserId;

use crate::Role;

/// Access token claims (transport-agnostic).
///
/// Timestamps are seconds since the Unix epoch, as in any JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    pub role: Role,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate the claim time window against `now`.
///
/// Signature verification happens in [`crate::validator`]; this only checks claims.
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(iat: DateTime<Utc>, exp: DateTime<Utc>) -> AccessClaims {
        AccessClaims {
            sub: UserId::new(),
            role: Role::new("vendor"),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
        }
    }

    #[test]
    fn accepts_current_window() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), now + Duration::minutes(10));
        assert_eq!(validate_claims(&c, now), Ok(()));
    }

    #[test]
    fn rejects_expired_future_and_inverted_windows() {
        let now = Utc::now();
        let expired = claims(now - Duration::hours(2), now - Duration::hours(1));
        assert_eq!(validate_claims(&expired, now), Err(TokenValidationError::Expired));

        let future = claims(now + Duration::hours(1), now + Duration::hours(2));
        assert_eq!(validate_claims(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = claims(now, now - Duration::minutes(1));
        assert_eq!(validate_claims(&inverted, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
