use std::collections::HashSet;

use serde::Serialize;

use concours_core::AccountType;

use crate::PermissionName;

/// Outcome of an authorization check.
///
/// A denial is ordinary data flowing back to the caller, never an error or a
/// panic. The HTTP layer turns it into a 403; embedding code is free to do
/// something else with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn deny_reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Deny { reason } => Some(reason),
        }
    }
}

/// Authorize one operation for a resolved principal.
///
/// - No IO
/// - No panics
/// - Pure function of its three inputs; same inputs, same decision.
///
/// Semantics:
/// - the superadmin account type is allowed unconditionally. The bypass is
///   keyed on `account_type` right here and nowhere else; it is never
///   expressed through role or permission names.
/// - an empty `required` list means the operation is public: always allowed,
///   even for a principal with zero permissions.
/// - otherwise the check is an OR: holding **any one** of the required
///   permissions suffices.
pub fn authorize(
    account_type: AccountType,
    required: &[PermissionName],
    granted: &HashSet<PermissionName>,
) -> Decision {
    if account_type.is_superadmin() {
        return Decision::Allow;
    }

    if required.is_empty() {
        return Decision::Allow;
    }

    if required.iter().any(|needed| granted.contains(needed)) {
        Decision::Allow
    } else {
        Decision::Deny {
            reason: missing_reason(required),
        }
    }
}

/// Human-readable denial reason listing the full required set.
fn missing_reason(required: &[PermissionName]) -> String {
    let names = required
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("missing one of [{names}]")
}
