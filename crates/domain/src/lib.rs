//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod menu;
mod permission;
mod role;
mod user;

pub use menu::{MenuCatalog, MenuEntry, MenuVisibility};
pub use permission::{PERMISSION_NAME_MAX_LENGTH, Permission, PermissionId, PermissionName};
pub use role::{Role, RoleId};
pub use user::UserId;
