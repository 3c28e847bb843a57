//! Storage-facing port used by the resolver.

use async_trait::async_trait;
use thiserror::Error;

use concours_core::UserId;

use crate::Principal;

/// The backing store could not answer (connection loss, timeout, poisoned
/// lock). Carried as data so callers can surface a 503 instead of a 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("store unavailable: {0}")]
pub struct StoreUnavailable(pub String);

/// Read-only port that turns a subject id into a principal.
///
/// Contract:
/// - returns `Ok(None)` when no user row exists for `user_id`;
/// - a returned principal carries **all** of the user's role grants, each with
///   the full permission list for that role, in a deterministic order;
/// - implementations never filter on the `verified` flag; that policy belongs
///   to the resolver.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn lookup_principal(&self, user_id: UserId)
        -> Result<Option<Principal>, StoreUnavailable>;
}
