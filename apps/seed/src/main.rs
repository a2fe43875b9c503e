//! Portcullis authorization catalog seeder.

#![forbid(unsafe_code)]

use std::env;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portcullis_core::{AppError, AppResult};
use portcullis_infrastructure::{assign_admin_role, ensure_user, seed_catalogs};

#[derive(Debug, Clone)]
struct SeedConfig {
    database_url: String,
    admin_username: Option<String>,
    max_connections: u32,
}

impl SeedConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let admin_username = env::var("SEED_ADMIN_USERNAME")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let max_connections = parse_env_u32("SEED_MAX_CONNECTIONS", 5)?;

        if max_connections == 0 {
            return Err(AppError::Validation(
                "SEED_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            admin_username,
            max_connections,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = SeedConfig::load()?;
    let pool = connect_pool(config.database_url.as_str(), config.max_connections).await?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;
    info!("database migrations applied");

    seed_catalogs(&pool).await?;

    if let Some(admin_username) = config.admin_username.as_deref() {
        let user_id = ensure_user(&pool, admin_username).await?;
        assign_admin_role(&pool, user_id).await?;
        info!(
            username = admin_username,
            user_id = %user_id,
            "bootstrap administrator ready"
        );
    }

    info!("portcullis-seed finished");
    Ok(())
}

async fn connect_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
