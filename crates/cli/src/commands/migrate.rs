//! Database migration commands.
//!
//! Applies the embedded schema migrations from `crates/web/migrations/`
//! and then creates the `tower_sessions` schema used by the session store.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use cat_collector_web::db::{MIGRATOR, create_pool};

use super::database_url;

/// Errors that can occur while migrating or seeding.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running schema migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}
