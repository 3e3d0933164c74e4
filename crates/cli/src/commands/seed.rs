//! Seed the database with sample toys and cats.
//!
//! Toys are matched by name, so running the command twice does not
//! duplicate them. Sample cats are only inserted for an owner that has
//! none yet.

use thiserror::Error;

use cat_collector_core::{Username, UsernameError};
use cat_collector_web::db::{
    CatRepository, PgStore, RepositoryError, ToyRepository, UserRepository, create_pool,
};
use cat_collector_web::models::{NewCat, NewToy, OwnerScope, ValidationErrors};

use super::database_url;
use super::migrate::MigrationError;

/// Toys every fresh install starts with, as `(name, color)`.
const DEFAULT_TOYS: &[(&str, &str)] = &[
    ("Feather Wand", "rainbow"),
    ("Catnip Mouse", "grey"),
    ("Laser Pointer", "red"),
    ("Crinkle Ball", "silver"),
];

/// Sample cats, as `(name, breed, description, age)`.
const SAMPLE_CATS: &[(&str, &str, &str, &str)] = &[
    ("Lolo", "tabby", "furry little demon", "3"),
    ("Sachi", "calico", "gentle and loving", "2"),
    ("Chunky Monkey", "long hair", "sweet and cuddly", "0"),
];

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Could not connect to the database.
    #[error(transparent)]
    Connection(#[from] MigrationError),

    /// The owner username is malformed.
    #[error("Invalid owner username: {0}")]
    InvalidOwner(#[from] UsernameError),

    /// The owner does not have an account.
    #[error("No user named {0}; sign up first")]
    UnknownOwner(String),

    /// Seed data failed validation.
    #[error("Invalid seed data: {0}")]
    Validation(#[from] ValidationErrors),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Insert the default toys and, when `owner` is given, the sample cats.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the owner doesn't
/// exist, or an insert fails.
pub async fn run(owner: Option<&str>) -> Result<(), SeedError> {
    let database_url = database_url()?;
    let pool = create_pool(&database_url)
        .await
        .map_err(MigrationError::from)?;
    let store = PgStore::new(pool);

    let added = seed_toys(&store).await?;
    tracing::info!(added, "Seeded toys");

    if let Some(owner) = owner {
        let added = seed_cats(&store, owner).await?;
        tracing::info!(added, owner, "Seeded cats");
    }

    Ok(())
}

async fn seed_toys<S: ToyRepository>(store: &S) -> Result<usize, SeedError> {
    let existing = store.list_toys().await?;
    let mut added = 0;

    for (name, color) in DEFAULT_TOYS {
        if existing.iter().any(|t| t.name == *name) {
            continue;
        }
        store.create_toy(&NewToy::parse(name, color)?).await?;
        added += 1;
    }

    Ok(added)
}

async fn seed_cats<S: CatRepository + UserRepository>(
    store: &S,
    owner: &str,
) -> Result<usize, SeedError> {
    let username = Username::parse(owner)?;
    let user = store
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| SeedError::UnknownOwner(owner.to_owned()))?;

    if !store.list_cats(OwnerScope::Owner(user.id)).await?.is_empty() {
        tracing::warn!(owner, "Owner already has cats, skipping");
        return Ok(0);
    }

    for (name, breed, description, age) in SAMPLE_CATS {
        let cat = NewCat::parse(name, breed, description, age)?;
        store.create_cat(&cat, Some(user.id)).await?;
    }

    Ok(SAMPLE_CATS.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cat_collector_web::db::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_seed_toys_is_repeatable() {
        let store = InMemoryStore::new();

        assert_eq!(seed_toys(&store).await.unwrap(), DEFAULT_TOYS.len());
        assert_eq!(seed_toys(&store).await.unwrap(), 0);
        assert_eq!(store.list_toys().await.unwrap().len(), DEFAULT_TOYS.len());
    }

    #[tokio::test]
    async fn test_seed_cats_for_owner() {
        let store = InMemoryStore::new();
        let username = Username::parse("sylvia").unwrap();
        let user = store
            .create_user_with_password(&username, "hash")
            .await
            .unwrap();

        assert_eq!(seed_cats(&store, "sylvia").await.unwrap(), 3);
        assert_eq!(seed_cats(&store, "sylvia").await.unwrap(), 0);

        let cats = store.list_cats(OwnerScope::Owner(user.id)).await.unwrap();
        let names: Vec<_> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Lolo", "Sachi", "Chunky Monkey"]);
    }

    #[tokio::test]
    async fn test_seed_cats_unknown_owner() {
        let store = InMemoryStore::new();
        let err = seed_cats(&store, "nobody").await.unwrap_err();
        assert!(matches!(err, SeedError::UnknownOwner(_)));
    }
}
