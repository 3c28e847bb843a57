//! Permission aggregation.

use std::collections::HashSet;

use crate::{PermissionName, Principal};

/// Flatten every permission reachable through the principal's role grants
/// into one deduplicated set.
///
/// - No IO
/// - No panics
/// - Zero roles (or roles with zero permissions) produce an empty set, which
///   is a valid input to the gate, not an error.
pub fn effective_permissions(principal: &Principal) -> HashSet<PermissionName> {
    principal
        .grants
        .iter()
        .flat_map(|grant| grant.permissions.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleGrant;
    use concours_core::{AccountType, UserId};

    fn principal_with(grants: Vec<RoleGrant>) -> Principal {
        Principal {
            user_id: UserId::new(),
            account_type: AccountType::Admin,
            verified: true,
            grants,
        }
    }

    #[test]
    fn no_roles_means_empty_set() {
        let p = principal_with(vec![]);
        assert!(effective_permissions(&p).is_empty());
    }

    #[test]
    fn permissions_union_across_roles() {
        let p = principal_with(vec![
            RoleGrant::new(
                crate::RoleName::new("EDITOR"),
                vec![
                    PermissionName::new("modifier_departement"),
                    PermissionName::new("lister_roles"),
                ],
            ),
            RoleGrant::new(
                crate::RoleName::new("GESTIONNAIRE"),
                vec![PermissionName::new("assigner_role_utilisateur")],
            ),
        ]);

        let set = effective_permissions(&p);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&PermissionName::new("modifier_departement")));
        assert!(set.contains(&PermissionName::new("lister_roles")));
        assert!(set.contains(&PermissionName::new("assigner_role_utilisateur")));
    }

    #[test]
    fn duplicate_permissions_collapse() {
        let p = principal_with(vec![
            RoleGrant::new(
                crate::RoleName::new("EDITOR"),
                vec![PermissionName::new("lister_roles")],
            ),
            RoleGrant::new(
                crate::RoleName::new("VIEWER"),
                vec![PermissionName::new("lister_roles")],
            ),
        ]);

        let set = effective_permissions(&p);
        assert_eq!(set.len(), 1);
    }
}
