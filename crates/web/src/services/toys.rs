//! Toy catalogue.

use tracing::instrument;

use cat_collector_core::ToyId;

use super::ServiceError;
use crate::db::Store;
use crate::models::{Cat, NewToy, OwnerScope, Toy};

/// A toy with the cats (visible to the caller) that have it.
#[derive(Debug, Clone)]
pub struct ToyDetail {
    pub toy: Toy,
    pub cats: Vec<Cat>,
}

/// Toy operations. Toys are shared by every user.
pub struct ToyService<'a> {
    store: &'a dyn Store,
}

impl<'a> ToyService<'a> {
    /// Create a new toy service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All toys, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<Toy>, ServiceError> {
        Ok(self.store.list_toys().await?)
    }

    /// Get a toy.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the toy doesn't exist.
    pub async fn get(&self, id: ToyId) -> Result<Toy, ServiceError> {
        self.store
            .get_toy(id)
            .await?
            .ok_or(ServiceError::NotFound("toy"))
    }

    /// Get a toy with the cats in `scope` that have it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the toy doesn't exist.
    #[instrument(skip(self))]
    pub async fn detail(&self, scope: OwnerScope, id: ToyId) -> Result<ToyDetail, ServiceError> {
        let toy = self.get(id).await?;
        let cats = self.store.list_toy_cats(id, scope).await?;
        Ok(ToyDetail { toy, cats })
    }

    /// Create a toy.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the insert fails.
    #[instrument(skip(self, toy), fields(name = %toy.name))]
    pub async fn create(&self, toy: &NewToy) -> Result<Toy, ServiceError> {
        let toy = self.store.create_toy(toy).await?;
        tracing::info!(toy_id = %toy.id, "Toy created");
        Ok(toy)
    }

    /// Overwrite a toy's name and color.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the toy doesn't exist.
    #[instrument(skip(self, toy))]
    pub async fn update(&self, id: ToyId, toy: &NewToy) -> Result<Toy, ServiceError> {
        self.store
            .update_toy(id, toy)
            .await
            .map_err(|e| ServiceError::from_repository("toy", e))
    }

    /// Delete a toy. Cats that had it are kept.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the toy doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ToyId) -> Result<(), ServiceError> {
        self.store
            .delete_toy(id)
            .await
            .map_err(|e| ServiceError::from_repository("toy", e))?;
        tracing::info!(toy_id = %id, "Toy deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cat_collector_core::Username;

    use super::*;
    use crate::db::{CatRepository, InMemoryStore, UserRepository};
    use crate::models::NewCat;

    #[tokio::test]
    async fn test_detail_lists_only_visible_cats() {
        let store = InMemoryStore::new();
        let alice = store
            .create_user_with_password(&Username::parse("alice").unwrap(), "hash")
            .await
            .unwrap();
        let bob = store
            .create_user_with_password(&Username::parse("bob").unwrap(), "hash")
            .await
            .unwrap();
        let service = ToyService::new(&store);
        let ball = service.create(&NewToy::parse("ball", "red").unwrap()).await.unwrap();

        let new_cat = NewCat::parse("Sachi", "tortoise shell", "diluted tortoise shell", "0").unwrap();
        let sachi = store.create_cat(&new_cat, Some(alice.id)).await.unwrap();
        store.associate_toy(sachi.id, ball.id).await.unwrap();

        let detail = service.detail(OwnerScope::Owner(alice.id), ball.id).await.unwrap();
        assert_eq!(detail.cats.len(), 1);
        let detail = service.detail(OwnerScope::Owner(bob.id), ball.id).await.unwrap();
        assert!(detail.cats.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::new();
        let service = ToyService::new(&store);
        let ball = service.create(&NewToy::parse("ball", "red").unwrap()).await.unwrap();

        let updated = service
            .update(ball.id, &NewToy::parse("ball", "blue").unwrap())
            .await
            .unwrap();
        assert_eq!(updated.color, "blue");

        service.delete(ball.id).await.unwrap();
        let err = service.get(ball.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("toy")));
        let err = service.delete(ball.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("toy")));
    }
}
