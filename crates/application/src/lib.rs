//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod grant_service;
mod menu_service;

pub use authorization_service::{
    AuthorizationRepository, AuthorizationService, EffectivePermission, RoleSummary,
};
pub use grant_service::{
    BatchOutcome, GrantAction, GrantRepository, GrantService, PermissionChange,
};
pub use menu_service::{MenuItem, MenuService};
