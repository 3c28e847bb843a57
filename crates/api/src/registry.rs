//! Operation registry: the static map from operation identifier to the
//! permission names that operation requires.
//!
//! The map is built once at startup and never mutated afterwards; changing
//! what an operation requires is a deploy, not a data migration. Handlers and
//! the access-check endpoint both read requirements from here, so there is a
//! single source of truth for "what does this operation need".

use std::collections::HashMap;

use concours_auth::PermissionName;

/// Every operation the platform exposes, admin surface and business modules
/// alike.
///
/// Business-module operations (departments, payments, candidate dispatch,
/// results) are handled by their own services; they are registered here so
/// the back office can preflight access to them through one policy table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateRole,
    DeleteRole,
    ListRoles,
    GetRole,
    AssignRolePermissions,
    CreatePermission,
    ListPermissions,
    GrantUserRole,
    RevokeUserRole,
    ListUserPermissions,
    ListOperations,
    Whoami,
    CreateDepartment,
    UpdateDepartment,
    DeleteDepartment,
    ValidatePayment,
    DispatchCandidates,
    PublishResults,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::CreateRole,
        Operation::DeleteRole,
        Operation::ListRoles,
        Operation::GetRole,
        Operation::AssignRolePermissions,
        Operation::CreatePermission,
        Operation::ListPermissions,
        Operation::GrantUserRole,
        Operation::RevokeUserRole,
        Operation::ListUserPermissions,
        Operation::ListOperations,
        Operation::Whoami,
        Operation::CreateDepartment,
        Operation::UpdateDepartment,
        Operation::DeleteDepartment,
        Operation::ValidatePayment,
        Operation::DispatchCandidates,
        Operation::PublishResults,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateRole => "roles.create",
            Self::DeleteRole => "roles.delete",
            Self::ListRoles => "roles.list",
            Self::GetRole => "roles.get",
            Self::AssignRolePermissions => "roles.assign_permissions",
            Self::CreatePermission => "permissions.create",
            Self::ListPermissions => "permissions.list",
            Self::GrantUserRole => "users.grant_role",
            Self::RevokeUserRole => "users.revoke_role",
            Self::ListUserPermissions => "users.permissions",
            Self::ListOperations => "operations.list",
            Self::Whoami => "whoami",
            Self::CreateDepartment => "departements.create",
            Self::UpdateDepartment => "departements.update",
            Self::DeleteDepartment => "departements.delete",
            Self::ValidatePayment => "paiements.validate",
            Self::DispatchCandidates => "candidats.dispatch",
            Self::PublishResults => "resultats.publish",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default requirements for every operation.
///
/// Exhaustive on purpose: adding an operation without deciding its
/// requirements must not compile. Several read operations accept more than
/// one permission; holding any one of them suffices at the gate.
fn default_requirements(operation: Operation) -> Vec<PermissionName> {
    let names: &[&'static str] = match operation {
        Operation::CreateRole => &["creer_role"],
        Operation::DeleteRole => &["supprimer_role"],
        Operation::ListRoles => &["lister_roles", "assigner_permissions_role"],
        Operation::GetRole => &["lister_roles", "assigner_permissions_role"],
        Operation::AssignRolePermissions => &["assigner_permissions_role"],
        Operation::CreatePermission => &["creer_permission"],
        Operation::ListPermissions => &["lister_permissions", "assigner_permissions_role"],
        Operation::GrantUserRole => &["assigner_role_utilisateur"],
        Operation::RevokeUserRole => &["retirer_role_utilisateur"],
        Operation::ListUserPermissions => {
            &["lister_permissions_utilisateur", "assigner_role_utilisateur"]
        }
        Operation::ListOperations => &["lister_permissions"],
        // Authenticated but public: any resolved principal may ask who it is.
        Operation::Whoami => &[],
        Operation::CreateDepartment => &["creer_departement"],
        Operation::UpdateDepartment => &["modifier_departement"],
        Operation::DeleteDepartment => &["supprimer_departement"],
        Operation::ValidatePayment => &["valider_paiement"],
        Operation::DispatchCandidates => &["repartir_candidats"],
        Operation::PublishResults => &["publier_resultats"],
    };
    names.iter().map(|n| PermissionName::new(*n)).collect()
}

/// Immutable operation → required-permissions table.
#[derive(Debug, Clone)]
pub struct OperationRegistry {
    required: HashMap<Operation, Vec<PermissionName>>,
}

impl OperationRegistry {
    /// Build the table with the platform's default policy.
    pub fn with_default_policy() -> Self {
        let required = Operation::ALL
            .into_iter()
            .map(|op| (op, default_requirements(op)))
            .collect();
        Self { required }
    }

    /// Permissions required for `operation`. Empty means public.
    pub fn required(&self, operation: Operation) -> &[PermissionName] {
        self.required
            .get(&operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All registered operations with their requirements, sorted by
    /// operation id for stable listings.
    pub fn entries(&self) -> Vec<(Operation, &[PermissionName])> {
        let mut entries: Vec<(Operation, &[PermissionName])> = self
            .required
            .iter()
            .map(|(op, perms)| (*op, perms.as_slice()))
            .collect();
        entries.sort_by_key(|(op, _)| op.as_str());
        entries
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_default_policy()
    }
}
