//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

use crate::commands::migrate::MigrationError;

/// Read the database URL, preferring the app-specific variable.
pub(crate) fn database_url() -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();

    std::env::var("CAT_COLLECTOR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("DATABASE_URL"))
}
