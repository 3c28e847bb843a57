use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use concours_core::DomainError;

/// Role name (e.g. "EDITOR", "CHEF_DEPARTEMENT").
///
/// Roles are plain labels over a set of permissions. A role name grants
/// nothing on its own; the gate only ever looks at the flattened permission
/// set plus the account type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse an externally supplied name (trims surrounding whitespace).
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("role name must not be empty"));
        }
        Ok(Self(Cow::Owned(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
