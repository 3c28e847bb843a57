//! API-side authorization guard.
//!
//! This enforces authorization at the handler boundary: resolve (done by the
//! middleware), aggregate, authorize. Handlers call [`require`] before doing
//! any work, so the pipeline is explicit at every call site instead of hidden
//! in a route decorator.

use concours_auth::{authorize, effective_permissions, Decision, Principal};

use crate::registry::{Operation, OperationRegistry};

/// Run the aggregate + authorize steps for one operation.
///
/// Logs the decision with its failure class; never the credential.
pub fn decide(registry: &OperationRegistry, operation: Operation, principal: &Principal) -> Decision {
    let required = registry.required(operation);
    let granted = effective_permissions(principal);
    let decision = authorize(principal.account_type, required, &granted);

    match &decision {
        Decision::Allow => tracing::debug!(
            operation = operation.as_str(),
            user_id = %principal.user_id,
            "authorization allowed"
        ),
        Decision::Deny { reason } => tracing::debug!(
            operation = operation.as_str(),
            user_id = %principal.user_id,
            %reason,
            "authorization denied"
        ),
    }

    decision
}

/// Check authorization for an operation in the current request context.
///
/// Returns the denial reason for the handler to wrap into a 403 body.
pub fn require(
    registry: &OperationRegistry,
    operation: Operation,
    principal: &Principal,
) -> Result<(), String> {
    match decide(registry, operation, principal) {
        Decision::Allow => Ok(()),
        Decision::Deny { reason } => Err(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concours_auth::{PermissionName, RoleGrant, RoleName};
    use concours_core::{AccountType, UserId};

    fn principal(account_type: AccountType, permissions: &[&'static str]) -> Principal {
        Principal {
            user_id: UserId::new(),
            account_type,
            verified: true,
            grants: vec![RoleGrant::new(
                RoleName::new("TEST"),
                permissions.iter().map(|p| PermissionName::new(*p)).collect(),
            )],
        }
    }

    #[test]
    fn require_passes_when_any_required_permission_is_held() {
        let registry = OperationRegistry::with_default_policy();
        let p = principal(AccountType::Admin, &["assigner_permissions_role"]);
        // ListRoles accepts either lister_roles or assigner_permissions_role.
        assert!(require(&registry, Operation::ListRoles, &p).is_ok());
    }

    #[test]
    fn require_reports_the_full_required_set_on_denial() {
        let registry = OperationRegistry::with_default_policy();
        let p = principal(AccountType::Admin, &["lister_roles"]);
        let reason = require(&registry, Operation::DeleteDepartment, &p).unwrap_err();
        assert_eq!(reason, "missing one of [supprimer_departement]");
    }

    #[test]
    fn superadmin_passes_every_operation() {
        let registry = OperationRegistry::with_default_policy();
        let p = principal(AccountType::Superadmin, &[]);
        for op in Operation::ALL {
            assert!(require(&registry, op, &p).is_ok());
        }
    }
}
