//! Stored row shapes returned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use concours_auth::{PermissionName, RoleName};
use concours_core::{AccountType, PermissionId, RoleId, UserId};

/// A role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: RoleName,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A role row together with its currently assigned permission names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDetail {
    pub id: RoleId,
    pub name: RoleName,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Sorted by name so listings are stable across calls.
    pub permissions: Vec<PermissionName>,
}

/// A permission catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub name: PermissionName,
    pub description: Option<String>,
}

/// A user account row as the authorization layer sees it.
///
/// Account provisioning (registration, e-mail verification) happens outside
/// this crate; the store only reads these rows, except for the in-memory
/// implementation where tests and dev wiring insert them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub account_type: AccountType,
    pub verified: bool,
}
