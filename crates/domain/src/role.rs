//! Role catalog types.

use std::fmt::{Display, Formatter};

use portcullis_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a role catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role catalog entry.
///
/// A role is a named bundle of permissions. Membership and bundling live in
/// the grant relations, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    description: Option<String>,
}

impl Role {
    /// Creates a validated role catalog entry.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            description,
        })
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the globally unique role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns an optional human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleId};

    #[test]
    fn role_requires_a_name() {
        assert!(Role::new(RoleId::new(), "  ", None).is_err());
    }

    #[test]
    fn role_keeps_description() {
        let role = Role::new(RoleId::new(), "manager", Some("Management access".to_owned()));
        assert!(role.is_ok());
        assert!(
            role.map(|value| value.description() == Some("Management access"))
                .unwrap_or(false)
        );
    }
}
