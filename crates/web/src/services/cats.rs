//! Cat management, feeding log and toy association.

use chrono::NaiveDate;
use tracing::instrument;

use cat_collector_core::{CatId, ToyId};

use super::ServiceError;
use crate::config::FailurePolicy;
use crate::db::Store;
use crate::models::{Cat, CatUpdate, Feeding, NewCat, NewFeeding, OwnerScope, Photo, Toy, is_fed};

/// Everything shown on a cat's detail page.
#[derive(Debug, Clone)]
pub struct CatDetail {
    pub cat: Cat,
    /// Most recent first.
    pub feedings: Vec<Feeding>,
    pub toys: Vec<Toy>,
    /// Toys the cat does not have yet.
    pub available_toys: Vec<Toy>,
    pub photos: Vec<Photo>,
    pub fed_today: bool,
}

/// Cat operations, authorized against an explicit [`OwnerScope`].
pub struct CatService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatService<'a> {
    /// Create a new cat service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Cats visible in `scope`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, scope: OwnerScope) -> Result<Vec<Cat>, ServiceError> {
        Ok(self.store.list_cats(scope).await?)
    }

    /// Get a cat the caller may see.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the cat doesn't exist and
    /// `ServiceError::Forbidden` if it belongs to someone else.
    #[instrument(skip(self))]
    pub async fn get(&self, scope: OwnerScope, id: CatId) -> Result<Cat, ServiceError> {
        let cat = self
            .store
            .get_cat(id)
            .await?
            .ok_or(ServiceError::NotFound("cat"))?;

        if !cat.is_visible_to(scope) {
            tracing::warn!(cat_id = %id, ?scope, "Cat access denied");
            return Err(ServiceError::Forbidden);
        }

        Ok(cat)
    }

    /// Create a cat owned by the scope's user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the insert fails.
    #[instrument(skip(self, cat), fields(name = %cat.name))]
    pub async fn create(&self, scope: OwnerScope, cat: &NewCat) -> Result<Cat, ServiceError> {
        let cat = self.store.create_cat(cat, scope.owner()).await?;
        tracing::info!(cat_id = %cat.id, "Cat created");
        Ok(cat)
    }

    /// Update a cat's breed, description and age.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` as for [`Self::get`].
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        scope: OwnerScope,
        id: CatId,
        update: &CatUpdate,
    ) -> Result<Cat, ServiceError> {
        self.get(scope, id).await?;
        self.store
            .update_cat(id, update)
            .await
            .map_err(|e| ServiceError::from_repository("cat", e))
    }

    /// Delete a cat with its feedings, photos and toy associations.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` as for [`Self::get`].
    #[instrument(skip(self))]
    pub async fn delete(&self, scope: OwnerScope, id: CatId) -> Result<(), ServiceError> {
        self.get(scope, id).await?;
        self.store
            .delete_cat(id)
            .await
            .map_err(|e| ServiceError::from_repository("cat", e))?;
        tracing::info!(cat_id = %id, "Cat deleted");
        Ok(())
    }

    /// Load a cat with its feedings, toys, photos and fed status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` as for [`Self::get`].
    #[instrument(skip(self))]
    pub async fn detail(
        &self,
        scope: OwnerScope,
        id: CatId,
        today: NaiveDate,
    ) -> Result<CatDetail, ServiceError> {
        let cat = self.get(scope, id).await?;

        Ok(CatDetail {
            feedings: self.store.list_feedings(id).await?,
            toys: self.store.list_cat_toys(id).await?,
            available_toys: self.store.list_available_toys(id).await?,
            photos: self.store.list_photos(id).await?,
            fed_today: self.is_fed_for_today(id, today).await?,
            cat,
        })
    }

    /// Whether the cat has at least three feedings dated `today`.
    ///
    /// Only the count matters: three breakfasts count as fed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn is_fed_for_today(&self, id: CatId, today: NaiveDate) -> Result<bool, ServiceError> {
        let count = self.store.count_feedings_on(id, today).await?;
        Ok(is_fed(count))
    }

    /// Record a feeding from raw form input.
    ///
    /// Invalid input is dropped with a warning under [`FailurePolicy::Silent`]
    /// and returned as `ServiceError::Validation` under [`FailurePolicy::Surface`].
    ///
    /// # Returns
    ///
    /// The new feeding, or `None` if the input was dropped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` as for [`Self::get`].
    #[instrument(skip(self))]
    pub async fn add_feeding(
        &self,
        scope: OwnerScope,
        id: CatId,
        date: &str,
        meal: Option<&str>,
        policy: FailurePolicy,
    ) -> Result<Option<Feeding>, ServiceError> {
        self.get(scope, id).await?;

        let feeding = match NewFeeding::parse(date, meal) {
            Ok(feeding) => feeding,
            Err(errors) => match policy {
                FailurePolicy::Silent => {
                    tracing::warn!(cat_id = %id, %errors, "Dropping invalid feeding");
                    return Ok(None);
                }
                FailurePolicy::Surface => return Err(errors.into()),
            },
        };

        let feeding = self
            .store
            .add_feeding(id, &feeding)
            .await
            .map_err(|e| ServiceError::from_repository("cat", e))?;
        tracing::info!(cat_id = %id, feeding_id = %feeding.id, "Feeding recorded");
        Ok(Some(feeding))
    }

    /// Give a toy to a cat. Giving it twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the cat or toy doesn't exist and
    /// `ServiceError::Forbidden` if the cat belongs to someone else.
    #[instrument(skip(self))]
    pub async fn associate_toy(
        &self,
        scope: OwnerScope,
        cat_id: CatId,
        toy_id: ToyId,
    ) -> Result<(), ServiceError> {
        self.get(scope, cat_id).await?;
        self.store
            .associate_toy(cat_id, toy_id)
            .await
            .map_err(|e| ServiceError::from_repository("toy", e))
    }

    /// Take a toy away from a cat. Removing a toy it doesn't have is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` as for [`Self::get`].
    #[instrument(skip(self))]
    pub async fn dissociate_toy(
        &self,
        scope: OwnerScope,
        cat_id: CatId,
        toy_id: ToyId,
    ) -> Result<(), ServiceError> {
        self.get(scope, cat_id).await?;
        Ok(self.store.dissociate_toy(cat_id, toy_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cat_collector_core::{Meal, UserId, Username};

    use super::*;
    use crate::db::{InMemoryStore, ToyRepository, UserRepository};
    use crate::models::NewToy;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    async fn user(store: &InMemoryStore, name: &str) -> UserId {
        store
            .create_user_with_password(&Username::parse(name).unwrap(), "hash")
            .await
            .unwrap()
            .id
    }

    async fn lolo(service: &CatService<'_>, scope: OwnerScope) -> Cat {
        let cat = NewCat::parse("Lolo", "tabby", "furry little demon", "3").unwrap();
        service.create(scope, &cat).await.unwrap()
    }

    #[tokio::test]
    async fn test_lolo_fed_after_three_feedings() {
        let store = InMemoryStore::new();
        let service = CatService::new(&store);
        let cat = lolo(&service, OwnerScope::All).await;

        for meal in ["B", "L"] {
            service
                .add_feeding(OwnerScope::All, cat.id, "2026-10-18", Some(meal), FailurePolicy::Silent)
                .await
                .unwrap();
        }
        assert!(!service.is_fed_for_today(cat.id, today()).await.unwrap());

        service
            .add_feeding(OwnerScope::All, cat.id, "2026-10-18", Some("D"), FailurePolicy::Silent)
            .await
            .unwrap();
        assert!(service.is_fed_for_today(cat.id, today()).await.unwrap());
    }

    #[tokio::test]
    async fn test_three_breakfasts_count_as_fed() {
        let store = InMemoryStore::new();
        let service = CatService::new(&store);
        let cat = lolo(&service, OwnerScope::All).await;

        for _ in 0..3 {
            service
                .add_feeding(OwnerScope::All, cat.id, "2026-10-18", None, FailurePolicy::Silent)
                .await
                .unwrap();
        }

        let detail = service.detail(OwnerScope::All, cat.id, today()).await.unwrap();
        assert!(detail.fed_today);
        assert!(detail.feedings.iter().all(|f| f.meal == Meal::Breakfast));
    }

    #[tokio::test]
    async fn test_invalid_meal_dropped_or_rejected() {
        let store = InMemoryStore::new();
        let service = CatService::new(&store);
        let cat = lolo(&service, OwnerScope::All).await;

        let dropped = service
            .add_feeding(OwnerScope::All, cat.id, "2026-10-18", Some("X"), FailurePolicy::Silent)
            .await
            .unwrap();
        assert!(dropped.is_none());

        let err = service
            .add_feeding(OwnerScope::All, cat.id, "2026-10-18", Some("X"), FailurePolicy::Surface)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let detail = service.detail(OwnerScope::All, cat.id, today()).await.unwrap();
        assert!(detail.feedings.is_empty());
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let service = CatService::new(&store);
        let cat = lolo(&service, OwnerScope::Owner(alice)).await;

        assert_eq!(cat.owner, Some(alice));
        assert!(service.list(OwnerScope::Owner(bob)).await.unwrap().is_empty());

        let err = service.get(OwnerScope::Owner(bob), cat.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        let err = service.delete(OwnerScope::Owner(bob), cat.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
        assert!(service.get(OwnerScope::Owner(alice), cat.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_keeps_name() {
        let store = InMemoryStore::new();
        let service = CatService::new(&store);
        let cat = lolo(&service, OwnerScope::All).await;

        let update = CatUpdate::parse("calico", "", "4").unwrap();
        let updated = service.update(OwnerScope::All, cat.id, &update).await.unwrap();

        assert_eq!(updated.name, "Lolo");
        assert_eq!(updated.breed, "calico");
        assert_eq!(updated.age, 4);
    }

    #[tokio::test]
    async fn test_missing_cat_is_not_found() {
        let store = InMemoryStore::new();
        let service = CatService::new(&store);
        let err = service.get(OwnerScope::All, CatId::new(42)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("cat")));
    }

    #[tokio::test]
    async fn test_toy_association_round_trip() {
        let store = InMemoryStore::new();
        let service = CatService::new(&store);
        let cat = lolo(&service, OwnerScope::All).await;
        let mouse = store
            .create_toy(&NewToy::parse("mouse", "grey").unwrap())
            .await
            .unwrap();

        service.associate_toy(OwnerScope::All, cat.id, mouse.id).await.unwrap();
        let detail = service.detail(OwnerScope::All, cat.id, today()).await.unwrap();
        assert_eq!(detail.toys, vec![mouse.clone()]);
        assert!(detail.available_toys.is_empty());

        service.dissociate_toy(OwnerScope::All, cat.id, mouse.id).await.unwrap();
        service.dissociate_toy(OwnerScope::All, cat.id, mouse.id).await.unwrap();
        let detail = service.detail(OwnerScope::All, cat.id, today()).await.unwrap();
        assert!(detail.toys.is_empty());
        assert_eq!(detail.available_toys, vec![mouse]);

        let err = service
            .associate_toy(OwnerScope::All, cat.id, ToyId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("toy")));
    }
}
