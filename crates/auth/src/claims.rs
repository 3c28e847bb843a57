use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims the platform encodes into access tokens.
/// The token deliberately carries only the subject id: account type, roles and
/// permissions are loaded from storage on every request so that revocations
/// take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id as a UUID string). Optional at the claims level so
    /// that the resolver can report a missing subject distinctly from an
    /// undecodable token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token is malformed or its signature does not verify: {0}")]
    Undecodable(String),

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims against a caller-supplied clock.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::token`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_offset_min: i64, expires_offset_min: i64, now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: Some(uuid::Uuid::now_v7().to_string()),
            issued_at: now + Duration::minutes(issued_offset_min),
            expires_at: now + Duration::minutes(expires_offset_min),
        }
    }

    #[test]
    fn valid_window_passes() {
        let now = Utc::now();
        assert!(validate_claims(&claims(-5, 5, now), now).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims(-10, -1, now), now),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims(1, 10, now), now),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims(5, -5, now), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
