//! Credential-to-principal resolution.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use concours_core::UserId;

use crate::directory::{PrincipalDirectory, StoreUnavailable};
use crate::token::JwtValidator;
use crate::Principal;

/// Why a credential failed to resolve into a principal.
///
/// The variants are ordered like the checks themselves; each request fails
/// with the first one that applies, so callers can rely on (say) an expired
/// token of a deleted user reporting `InvalidCredential`, not
/// `PrincipalNotFound`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Signature mismatch, undecodable payload, or expired/not-yet-valid
    /// time window.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The token verified but carries no usable subject id.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// No user row exists for the subject id.
    #[error("principal not found")]
    PrincipalNotFound,

    /// The user exists but has not completed verification.
    #[error("principal not verified")]
    PrincipalNotVerified,

    /// The directory could not answer.
    #[error(transparent)]
    Store(#[from] StoreUnavailable),
}

/// Resolves a raw bearer credential into a [`Principal`].
///
/// The checks run in a fixed order:
/// 1. signature and time-window verification of the token;
/// 2. presence of a parseable subject id in the payload;
/// 3. directory lookup of the user with all role/permission associations;
/// 4. the user's verified flag.
///
/// Resolution happens fresh on every call. Nothing is cached, so role and
/// permission changes take effect on the next request.
pub struct IdentityResolver {
    validator: Arc<dyn JwtValidator>,
    directory: Arc<dyn PrincipalDirectory>,
}

impl IdentityResolver {
    pub fn new(validator: Arc<dyn JwtValidator>, directory: Arc<dyn PrincipalDirectory>) -> Self {
        Self {
            validator,
            directory,
        }
    }

    /// Resolve `credential` (the bearer token, without the scheme prefix).
    ///
    /// The credential itself is never logged; only the failure class is.
    #[instrument(skip(self, credential), err)]
    pub async fn resolve(&self, credential: &str) -> Result<Principal, ResolveError> {
        let claims = self
            .validator
            .validate(credential, Utc::now())
            .map_err(|e| ResolveError::InvalidCredential(e.to_string()))?;

        let sub = claims
            .sub
            .as_deref()
            .ok_or_else(|| ResolveError::MalformedCredential("missing subject claim".into()))?;
        let user_id: UserId = sub
            .parse()
            .map_err(|_| ResolveError::MalformedCredential("subject is not a valid id".into()))?;

        let principal = self
            .directory
            .lookup_principal(user_id)
            .await?
            .ok_or(ResolveError::PrincipalNotFound)?;

        if !principal.verified {
            return Err(ResolveError::PrincipalNotVerified);
        }

        Ok(principal)
    }
}
