//! Permission catalog types and the catalog naming scheme.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use portcullis_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length for a permission name.
pub const PERMISSION_NAME_MAX_LENGTH: usize = 100;

/// Unique identifier for a permission catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a new random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated permission name following the `module_action` catalog scheme.
///
/// Names are lowercase ASCII alphanumeric segments joined by single
/// underscores, with at least two segments and a leading letter:
/// `user_view`, `tour_create`, `report_export`. The same rule is enforced
/// by a CHECK constraint on the permissions table, so a name that passes
/// here is storable as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionName(String);

impl PermissionName {
    /// Creates a validated permission name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation(
                "permission name must not be empty".to_owned(),
            ));
        }

        if value.len() > PERMISSION_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission name must not exceed {PERMISSION_NAME_MAX_LENGTH} characters"
            )));
        }

        if !value
            .chars()
            .next()
            .map(|first| first.is_ascii_lowercase())
            .unwrap_or(false)
        {
            return Err(AppError::Validation(format!(
                "permission name '{value}' must start with a lowercase letter"
            )));
        }

        let segments: Vec<&str> = value.split('_').collect();
        if segments.len() < 2 {
            return Err(AppError::Validation(format!(
                "permission name '{value}' must follow the module_action scheme"
            )));
        }

        for segment in &segments {
            if segment.is_empty() {
                return Err(AppError::Validation(format!(
                    "permission name '{value}' must not contain empty segments"
                )));
            }

            if !segment
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
            {
                return Err(AppError::Validation(format!(
                    "permission name '{value}' must use lowercase letters, digits \
                     and single underscores"
                )));
            }
        }

        Ok(Self(value))
    }

    /// Returns the validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

/// Permission catalog entry.
///
/// `module` is a free-form grouping label used for presentation only; it
/// carries no enforcement semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    name: PermissionName,
    description: Option<String>,
    module: NonEmptyString,
}

impl Permission {
    /// Creates a validated permission catalog entry.
    pub fn new(
        id: PermissionId,
        name: impl Into<String>,
        description: Option<String>,
        module: impl Into<String>,
    ) -> AppResult<Self> {
        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            name: PermissionName::new(name)?,
            description,
            module: NonEmptyString::new(module)?,
        })
    }

    /// Returns the stable permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the globally unique permission name.
    #[must_use]
    pub fn name(&self) -> &PermissionName {
        &self.name
    }

    /// Returns an optional human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the presentation grouping label.
    #[must_use]
    pub fn module(&self) -> &NonEmptyString {
        &self.module
    }
}
