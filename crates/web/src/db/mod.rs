//! Persistence layer for Cat Collector.
//!
//! # Tables
//!
//! - `users` / `user_passwords` - Site accounts and their argon2 hashes
//! - `cats` - Tracked cats, optionally scoped to an owner
//! - `feedings` - Feeding log, one row per meal (cascades with its cat)
//! - `photos` - URLs of photos in object storage (cascades with its cat)
//! - `toys` - Toys shared between cats
//! - `cat_toys` - Cat/toy association table
//! - `tower_sessions.session` - Session storage (created by `cat-cli migrate`)
//!
//! # Implementations
//!
//! - [`PgStore`]: `PostgreSQL` storage for production
//! - [`InMemoryStore`]: Mutex-guarded tables for tests and local experiments
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p cat-collector-cli -- migrate
//! ```

mod memory;
mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cat_collector_core::{CatId, ToyId, UserId, Username};

use crate::models::{Cat, CatUpdate, Feeding, NewCat, NewFeeding, NewToy, OwnerScope, Photo, Toy, User};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Cats and the collections they own (feedings, photos, toy associations).
#[async_trait]
pub trait CatRepository: Send + Sync {
    /// Cats visible in `scope`, ordered by id.
    async fn list_cats(&self, scope: OwnerScope) -> Result<Vec<Cat>, RepositoryError>;

    /// Get a cat by id, regardless of owner.
    async fn get_cat(&self, id: CatId) -> Result<Option<Cat>, RepositoryError>;

    /// Insert a cat stamped with `owner`.
    async fn create_cat(
        &self,
        cat: &NewCat,
        owner: Option<UserId>,
    ) -> Result<Cat, RepositoryError>;

    /// Overwrite a cat's mutable fields.
    ///
    /// Returns `RepositoryError::NotFound` if the cat doesn't exist.
    async fn update_cat(&self, id: CatId, update: &CatUpdate) -> Result<Cat, RepositoryError>;

    /// Delete a cat with its feedings, photos and toy associations.
    ///
    /// Toys themselves are kept. Returns `RepositoryError::NotFound` if the
    /// cat doesn't exist.
    async fn delete_cat(&self, id: CatId) -> Result<(), RepositoryError>;

    /// Feedings of a cat, most recent date first.
    async fn list_feedings(&self, cat_id: CatId) -> Result<Vec<Feeding>, RepositoryError>;

    /// Record a feeding. Returns `RepositoryError::NotFound` if the cat doesn't exist.
    async fn add_feeding(
        &self,
        cat_id: CatId,
        feeding: &NewFeeding,
    ) -> Result<Feeding, RepositoryError>;

    /// Number of feedings of a cat dated `date`.
    async fn count_feedings_on(
        &self,
        cat_id: CatId,
        date: NaiveDate,
    ) -> Result<usize, RepositoryError>;

    /// Photos of a cat, oldest first.
    async fn list_photos(&self, cat_id: CatId) -> Result<Vec<Photo>, RepositoryError>;

    /// Record a photo URL. Returns `RepositoryError::NotFound` if the cat doesn't exist.
    async fn add_photo(&self, cat_id: CatId, url: &str) -> Result<Photo, RepositoryError>;

    /// Toys associated with a cat, ordered by id.
    async fn list_cat_toys(&self, cat_id: CatId) -> Result<Vec<Toy>, RepositoryError>;

    /// Toys not associated with a cat, ordered by id.
    async fn list_available_toys(&self, cat_id: CatId) -> Result<Vec<Toy>, RepositoryError>;

    /// Associate a toy with a cat. Associating twice is not an error.
    ///
    /// Returns `RepositoryError::NotFound` if the cat or the toy doesn't exist.
    async fn associate_toy(&self, cat_id: CatId, toy_id: ToyId) -> Result<(), RepositoryError>;

    /// Remove a toy association. Removing a missing association is not an error.
    async fn dissociate_toy(&self, cat_id: CatId, toy_id: ToyId) -> Result<(), RepositoryError>;
}

/// Toys shared between cats.
#[async_trait]
pub trait ToyRepository: Send + Sync {
    /// All toys, ordered by id.
    async fn list_toys(&self) -> Result<Vec<Toy>, RepositoryError>;

    /// Get a toy by id.
    async fn get_toy(&self, id: ToyId) -> Result<Option<Toy>, RepositoryError>;

    /// Insert a toy.
    async fn create_toy(&self, toy: &NewToy) -> Result<Toy, RepositoryError>;

    /// Overwrite a toy. Returns `RepositoryError::NotFound` if it doesn't exist.
    async fn update_toy(&self, id: ToyId, toy: &NewToy) -> Result<Toy, RepositoryError>;

    /// Delete a toy and its associations (never the cats).
    ///
    /// Returns `RepositoryError::NotFound` if it doesn't exist.
    async fn delete_toy(&self, id: ToyId) -> Result<(), RepositoryError>;

    /// Cats in `scope` that have a toy, ordered by id.
    async fn list_toy_cats(
        &self,
        toy_id: ToyId,
        scope: OwnerScope,
    ) -> Result<Vec<Cat>, RepositoryError>;
}

/// Site accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user by username.
    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError>;

    /// Create a user with a password hash.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create_user_with_password(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Get a user and their password hash by username.
    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Everything the application persists.
#[async_trait]
pub trait Store: CatRepository + ToyRepository + UserRepository {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
