//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_authorization_store;
mod postgres_authorization_repository;
mod postgres_grant_repository;
mod seed;

pub use in_memory_authorization_store::InMemoryAuthorizationStore;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use seed::{
    ADMIN_ROLE_NAME, DEFAULT_PERMISSIONS, DEFAULT_ROLES, assign_admin_role, ensure_user,
    seed_catalogs,
};
