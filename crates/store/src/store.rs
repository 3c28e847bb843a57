//! Role/permission store abstraction.
//!
//! ## Design Principles
//!
//! - **Full replace for role permissions**: `assign_permissions` is the only
//!   way to change what a role carries, and it always replaces the whole set.
//!   There is no incremental add/remove, so concurrent editors cannot
//!   interleave into a half-merged state.
//! - **Idempotent grants**: granting a role a user already holds, or revoking
//!   one they do not, succeeds without error. Admin tooling can safely retry.
//! - **Atomicity**: every mutation either fully applies or leaves storage
//!   untouched. A bad permission name in the middle of a replacement must not
//!   leave the role half-updated.
//! - **No policy**: the store answers "what is granted", never "is this
//!   allowed". Authorization lives upstream in the gate.

use std::collections::HashSet;

use async_trait::async_trait;

use concours_auth::{PermissionName, RoleName};
use concours_core::{RoleId, UserId};

use crate::error::StoreError;
use crate::records::{PermissionRecord, RoleDetail, RoleRecord};

/// Persistence port for roles, permissions and their associations.
///
/// Implementations must be safe to share across request handlers
/// (`Send + Sync`) and must uphold the atomicity contract documented on each
/// method.
#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    /// Create a role. Fails with [`StoreError::RoleExists`] when the name is
    /// already taken.
    async fn create_role(
        &self,
        name: RoleName,
        description: Option<String>,
    ) -> Result<RoleRecord, StoreError>;

    /// Delete a role and every association that references it (both its
    /// permission assignments and user grants), atomically.
    ///
    /// Fails with [`StoreError::UnknownRole`] when no such role exists.
    async fn delete_role(&self, role_id: RoleId) -> Result<(), StoreError>;

    /// List all roles with their permission names, sorted by role name.
    async fn list_roles(&self) -> Result<Vec<RoleDetail>, StoreError>;

    /// Fetch one role with its permission names.
    ///
    /// Fails with [`StoreError::UnknownRole`] when no such role exists.
    async fn get_role(&self, role_id: RoleId) -> Result<RoleDetail, StoreError>;

    /// Create a permission catalog entry. Fails with
    /// [`StoreError::PermissionExists`] when the name is already taken.
    async fn create_permission(
        &self,
        name: PermissionName,
        description: Option<String>,
    ) -> Result<PermissionRecord, StoreError>;

    /// List the permission catalog, sorted by name.
    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, StoreError>;

    /// Replace the role's permission set with exactly `permissions`.
    ///
    /// Full-replace semantics: permissions absent from the new set are
    /// removed, new ones added, duplicates in the input collapse. The swap is
    /// atomic; if any name is not in the catalog the call fails with
    /// [`StoreError::UnknownPermission`] and the previous set stays intact.
    /// An empty slice is valid and leaves the role with no permissions.
    async fn assign_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> Result<(), StoreError>;

    /// Grant a role to a user. Granting an already-held role is a no-op.
    ///
    /// Fails with [`StoreError::UnknownUser`] / [`StoreError::UnknownRole`]
    /// when either side of the association is missing.
    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), StoreError>;

    /// Revoke a role from a user. Revoking an unheld role is a no-op.
    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), StoreError>;

    /// Flattened permission names reachable through all of the user's roles.
    ///
    /// A user with zero roles yields an empty set. Fails with
    /// [`StoreError::UnknownUser`] when no such user exists.
    async fn list_effective_permissions(
        &self,
        user_id: UserId,
    ) -> Result<HashSet<PermissionName>, StoreError>;
}
