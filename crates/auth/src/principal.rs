use concours_core::{AccountType, UserId};

use crate::{PermissionName, RoleName};

/// One role held by a principal, with the permissions that role carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: RoleName,
    pub permissions: Vec<PermissionName>,
}

impl RoleGrant {
    pub fn new(role: RoleName, permissions: Vec<PermissionName>) -> Self {
        Self { role, permissions }
    }
}

/// A fully resolved principal, derived fresh from stored user + role rows on
/// every request.
///
/// Construction is intentionally decoupled from transport: the resolver builds
/// one from a verified credential and a [`PrincipalDirectory`] lookup, and the
/// result is never persisted or cached across requests.
///
/// [`PrincipalDirectory`]: crate::directory::PrincipalDirectory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub account_type: AccountType,
    /// Email-verification flag copied from the user row. The resolver refuses
    /// to hand out principals where this is false.
    pub verified: bool,
    pub grants: Vec<RoleGrant>,
}

impl Principal {
    pub fn role_names(&self) -> impl Iterator<Item = &RoleName> {
        self.grants.iter().map(|g| &g.role)
    }

    pub fn holds_role(&self, name: &str) -> bool {
        self.grants.iter().any(|g| g.role.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Principal {
        Principal {
            user_id: UserId::new(),
            account_type: AccountType::Admin,
            verified: true,
            grants: vec![
                RoleGrant::new(
                    RoleName::new("EDITOR"),
                    vec![PermissionName::new("modifier_departement")],
                ),
                RoleGrant::new(RoleName::new("VIEWER"), vec![]),
            ],
        }
    }

    #[test]
    fn role_names_lists_every_grant() {
        let p = sample();
        let names: Vec<&str> = p.role_names().map(|r| r.as_str()).collect();
        assert_eq!(names, vec!["EDITOR", "VIEWER"]);
    }

    #[test]
    fn holds_role_is_exact_match() {
        let p = sample();
        assert!(p.holds_role("EDITOR"));
        assert!(!p.holds_role("editor"));
    }
}
