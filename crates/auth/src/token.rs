//! Transport-level token verification.
//!
//! The platform signs access tokens with HMAC-SHA256 and a shared secret.
//! Verification is split in two deterministic steps:
//!
//! 1. signature + payload decoding (this module, via `jsonwebtoken`)
//! 2. time-window checks on the decoded claims ([`crate::claims::validate_claims`])
//!
//! Step 2 runs against a caller-supplied clock, so expiry behavior is testable
//! without minting short-lived tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

/// Verifies a raw credential string and returns its claims.
///
/// Implementations must be deterministic for a fixed `now` and must not
/// perform IO.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(&secret),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Claims carry RFC 3339 timestamps rather than numeric `exp`/`iat`,
        // so jsonwebtoken only checks the signature; the time window is
        // validated explicitly below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenValidationError::Undecodable(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn fresh_claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: Some(uuid::Uuid::now_v7().to_string()),
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn accepts_a_well_signed_token() {
        let now = Utc::now();
        let claims = fresh_claims(now);
        let token = mint("secret", &claims);

        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let decoded = validator.validate(&token, now).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let now = Utc::now();
        let token = mint("other-secret", &fresh_claims(now));

        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let err = validator.validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Undecodable(_)));
    }

    #[test]
    fn rejects_garbage_input() {
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let err = validator.validate("not.a.jwt", Utc::now()).unwrap_err();
        assert!(matches!(err, TokenValidationError::Undecodable(_)));
    }

    #[test]
    fn rejects_an_expired_token() {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: Some(uuid::Uuid::now_v7().to_string()),
            issued_at: now - Duration::minutes(30),
            expires_at: now - Duration::minutes(5),
        };
        let token = mint("secret", &claims);

        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        assert_eq!(
            validator.validate(&token, now).unwrap_err(),
            TokenValidationError::Expired
        );
    }

    #[test]
    fn keeps_a_missing_subject_decodable() {
        // A token without `sub` still verifies; the resolver is the layer
        // that decides a missing subject is a malformed credential.
        let now = Utc::now();
        let claims = JwtClaims {
            sub: None,
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        };
        let token = mint("secret", &claims);

        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let decoded = validator.validate(&token, now).unwrap();
        assert_eq!(decoded.sub, None);
    }
}
