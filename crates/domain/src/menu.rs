//! Navigation menu catalog.
//!
//! The catalog is a fixed, ordered list of menu entries. Each entry is
//! either always visible or gated behind a single permission name. Building
//! the visible menu for a user is an application concern; this module only
//! describes the catalog itself.

use std::collections::HashSet;

use portcullis_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::permission::PermissionName;

/// Visibility rule attached to a menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuVisibility {
    /// The entry is shown to every user.
    Always,
    /// The entry is shown only to users holding the named permission.
    RequiresPermission(PermissionName),
}

/// Single entry of the navigation menu catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    key: NonEmptyString,
    title: NonEmptyString,
    icon: NonEmptyString,
    target: NonEmptyString,
    visibility: MenuVisibility,
}

impl MenuEntry {
    /// Creates a validated menu entry.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        icon: impl Into<String>,
        target: impl Into<String>,
        visibility: MenuVisibility,
    ) -> AppResult<Self> {
        Ok(Self {
            key: NonEmptyString::new(key)?,
            title: NonEmptyString::new(title)?,
            icon: NonEmptyString::new(icon)?,
            target: NonEmptyString::new(target)?,
            visibility,
        })
    }

    /// Returns the stable entry key.
    #[must_use]
    pub fn key(&self) -> &NonEmptyString {
        &self.key
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the icon class name.
    #[must_use]
    pub fn icon(&self) -> &NonEmptyString {
        &self.icon
    }

    /// Returns the navigation target.
    #[must_use]
    pub fn target(&self) -> &NonEmptyString {
        &self.target
    }

    /// Returns the visibility rule.
    #[must_use]
    pub fn visibility(&self) -> &MenuVisibility {
        &self.visibility
    }
}

/// Ordered menu catalog with unique entry keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCatalog {
    entries: Vec<MenuEntry>,
}

impl MenuCatalog {
    /// Creates a catalog from an ordered list of entries.
    ///
    /// Entry keys must be unique; the order of `entries` is the order the
    /// rendered menu follows.
    pub fn new(entries: Vec<MenuEntry>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.key().as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "menu catalog contains duplicate key '{}'",
                    entry.key()
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Returns the catalog entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Returns the standard application menu catalog.
    pub fn standard() -> AppResult<Self> {
        let gated = |key: &str, title: &str, icon: &str, target: &str, permission: &str| {
            MenuEntry::new(
                key,
                title,
                icon,
                target,
                MenuVisibility::RequiresPermission(PermissionName::new(permission)?),
            )
        };

        Self::new(vec![
            MenuEntry::new(
                "dashboard",
                "Dashboard",
                "fas fa-tachometer-alt",
                "/dashboard",
                MenuVisibility::Always,
            )?,
            gated("users", "User Management", "fas fa-users", "/users", "user_view")?,
            gated("tours", "Tour Management", "fas fa-route", "#", "tour_view")?,
            gated("costs", "Cost Management", "fas fa-calculator", "#", "cost_view")?,
            gated("reports", "Reports", "fas fa-chart-bar", "#", "report_view")?,
            gated("settings", "Settings", "fas fa-cog", "#", "settings_view")?,
            MenuEntry::new(
                "support",
                "Support",
                "fas fa-question-circle",
                "#",
                MenuVisibility::Always,
            )?,
        ])
    }
}
