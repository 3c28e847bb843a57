use thiserror::Error;

use concours_core::{DomainError, RoleId, UserId};

/// Errors surfaced by the role/permission store.
///
/// Domain violations (unknown names, duplicates) are distinct variants so the
/// HTTP layer can map them to precise statuses; only genuine infrastructure
/// trouble lands in `Unavailable`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A permission name in the request does not exist in the catalog.
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    /// No role row exists for this id.
    #[error("unknown role {0}")]
    UnknownRole(RoleId),

    /// No user row exists for this id.
    #[error("unknown user {0}")]
    UnknownUser(UserId),

    /// A role with this name already exists.
    #[error("role '{0}' already exists")]
    RoleExists(String),

    /// A permission with this name already exists.
    #[error("permission '{0}' already exists")]
    PermissionExists(String),

    /// Input failed domain validation (empty name, bad id).
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// The backing store could not answer (connection loss, timeout,
    /// poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type used across the store layer.
pub type StoreResult<T> = Result<T, StoreError>;
