//! User account classification.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of user account.
///
/// `Superadmin` is the designated super-administrator type: the authorization
/// gate grants it every operation without consulting role grants. That bypass
/// is keyed on this enum only, never inferred from role or permission names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Exam candidate (self-service surface only).
    Candidate,
    /// Back-office administrator; access governed by role grants.
    Admin,
    /// Platform owner; bypasses permission checks entirely.
    Superadmin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    pub fn is_superadmin(&self) -> bool {
        matches!(self, Self::Superadmin)
    }
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "candidate" => Ok(Self::Candidate),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(DomainError::validation(format!(
                "unknown account type '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_round_trip() {
        for kind in [AccountType::Candidate, AccountType::Admin, AccountType::Superadmin] {
            assert_eq!(kind.as_str().parse::<AccountType>().unwrap(), kind);
        }
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!("root".parse::<AccountType>().is_err());
    }

    #[test]
    fn only_superadmin_reports_superadmin() {
        assert!(AccountType::Superadmin.is_superadmin());
        assert!(!AccountType::Admin.is_superadmin());
        assert!(!AccountType::Candidate.is_superadmin());
    }
}
