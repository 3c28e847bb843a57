use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use concours_core::DomainError;

/// Permission identifier.
///
/// Permissions are modeled as opaque names (e.g. "creer_role"). The catalog of
/// known names lives in storage; a name by itself carries no grant and no
/// special meaning. In particular there is no wildcard name: the only total
/// bypass is the superadmin account type, enforced by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse an externally supplied name (trims surrounding whitespace).
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("permission name must not be empty"));
        }
        Ok(Self(Cow::Owned(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let p = PermissionName::parse("  modifier_departement  ").unwrap();
        assert_eq!(p.as_str(), "modifier_departement");
    }

    #[test]
    fn parse_rejects_blank_names() {
        assert!(PermissionName::parse("   ").is_err());
    }
}
