//! In-memory repository implementation.
//!
//! All tables live behind one mutex so cascading deletes touch every
//! table atomically. The cat/toy association is indexed in both
//! directions.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use cat_collector_core::{CatId, FeedingId, PhotoId, ToyId, UserId, Username};

use super::{CatRepository, RepositoryError, Store, ToyRepository, UserRepository};
use crate::models::{Cat, CatUpdate, Feeding, NewCat, NewFeeding, NewToy, OwnerScope, Photo, Toy, User};

#[derive(Debug, Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, (User, String)>,
    cats: BTreeMap<CatId, Cat>,
    feedings: BTreeMap<FeedingId, Feeding>,
    photos: BTreeMap<PhotoId, Photo>,
    toys: BTreeMap<ToyId, Toy>,
    toys_by_cat: BTreeSet<(CatId, ToyId)>,
    cats_by_toy: BTreeSet<(ToyId, CatId)>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn toy_ids_of(&self, cat_id: CatId) -> impl Iterator<Item = ToyId> + '_ {
        self.toys_by_cat
            .range((cat_id, ToyId::new(i32::MIN))..=(cat_id, ToyId::new(i32::MAX)))
            .map(|&(_, toy_id)| toy_id)
    }

    fn cat_ids_of(&self, toy_id: ToyId) -> impl Iterator<Item = CatId> + '_ {
        self.cats_by_toy
            .range((toy_id, CatId::new(i32::MIN))..=(toy_id, CatId::new(i32::MAX)))
            .map(|&(_, cat_id)| cat_id)
    }
}

/// In-memory store for tests and local development.
///
/// Ids are drawn from a single counter shared by every table.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatRepository for InMemoryStore {
    async fn list_cats(&self, scope: OwnerScope) -> Result<Vec<Cat>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .cats
            .values()
            .filter(|cat| cat.is_visible_to(scope))
            .cloned()
            .collect())
    }

    async fn get_cat(&self, id: CatId) -> Result<Option<Cat>, RepositoryError> {
        Ok(self.tables.lock().await.cats.get(&id).cloned())
    }

    async fn create_cat(
        &self,
        cat: &NewCat,
        owner: Option<UserId>,
    ) -> Result<Cat, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(owner) = owner
            && !tables.users.contains_key(&owner)
        {
            return Err(RepositoryError::NotFound);
        }
        let cat = Cat {
            id: CatId::new(tables.next_id()),
            name: cat.name.clone(),
            breed: cat.breed.clone(),
            description: cat.description.clone(),
            age: cat.age,
            owner,
        };
        tables.cats.insert(cat.id, cat.clone());
        Ok(cat)
    }

    async fn update_cat(&self, id: CatId, update: &CatUpdate) -> Result<Cat, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let cat = tables.cats.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        cat.breed.clone_from(&update.breed);
        cat.description.clone_from(&update.description);
        cat.age = update.age;
        Ok(cat.clone())
    }

    async fn delete_cat(&self, id: CatId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.cats.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.feedings.retain(|_, f| f.cat_id != id);
        tables.photos.retain(|_, p| p.cat_id != id);
        let toy_ids: Vec<ToyId> = tables.toy_ids_of(id).collect();
        for toy_id in toy_ids {
            tables.toys_by_cat.remove(&(id, toy_id));
            tables.cats_by_toy.remove(&(toy_id, id));
        }
        Ok(())
    }

    async fn list_feedings(&self, cat_id: CatId) -> Result<Vec<Feeding>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut feedings: Vec<Feeding> = tables
            .feedings
            .values()
            .filter(|f| f.cat_id == cat_id)
            .cloned()
            .collect();
        feedings.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(feedings)
    }

    async fn add_feeding(
        &self,
        cat_id: CatId,
        feeding: &NewFeeding,
    ) -> Result<Feeding, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.cats.contains_key(&cat_id) {
            return Err(RepositoryError::NotFound);
        }
        let feeding = Feeding {
            id: FeedingId::new(tables.next_id()),
            cat_id,
            date: feeding.date,
            meal: feeding.meal,
        };
        tables.feedings.insert(feeding.id, feeding.clone());
        Ok(feeding)
    }

    async fn count_feedings_on(
        &self,
        cat_id: CatId,
        date: NaiveDate,
    ) -> Result<usize, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .feedings
            .values()
            .filter(|f| f.cat_id == cat_id && f.date == date)
            .count())
    }

    async fn list_photos(&self, cat_id: CatId) -> Result<Vec<Photo>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .photos
            .values()
            .filter(|p| p.cat_id == cat_id)
            .cloned()
            .collect())
    }

    async fn add_photo(&self, cat_id: CatId, url: &str) -> Result<Photo, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.cats.contains_key(&cat_id) {
            return Err(RepositoryError::NotFound);
        }
        let photo = Photo {
            id: PhotoId::new(tables.next_id()),
            cat_id,
            url: url.to_owned(),
        };
        tables.photos.insert(photo.id, photo.clone());
        Ok(photo)
    }

    async fn list_cat_toys(&self, cat_id: CatId) -> Result<Vec<Toy>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .toy_ids_of(cat_id)
            .filter_map(|toy_id| tables.toys.get(&toy_id).cloned())
            .collect())
    }

    async fn list_available_toys(&self, cat_id: CatId) -> Result<Vec<Toy>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .toys
            .values()
            .filter(|toy| !tables.toys_by_cat.contains(&(cat_id, toy.id)))
            .cloned()
            .collect())
    }

    async fn associate_toy(&self, cat_id: CatId, toy_id: ToyId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.cats.contains_key(&cat_id) || !tables.toys.contains_key(&toy_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.toys_by_cat.insert((cat_id, toy_id));
        tables.cats_by_toy.insert((toy_id, cat_id));
        Ok(())
    }

    async fn dissociate_toy(&self, cat_id: CatId, toy_id: ToyId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.toys_by_cat.remove(&(cat_id, toy_id));
        tables.cats_by_toy.remove(&(toy_id, cat_id));
        Ok(())
    }
}

#[async_trait]
impl ToyRepository for InMemoryStore {
    async fn list_toys(&self) -> Result<Vec<Toy>, RepositoryError> {
        Ok(self.tables.lock().await.toys.values().cloned().collect())
    }

    async fn get_toy(&self, id: ToyId) -> Result<Option<Toy>, RepositoryError> {
        Ok(self.tables.lock().await.toys.get(&id).cloned())
    }

    async fn create_toy(&self, toy: &NewToy) -> Result<Toy, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let toy = Toy {
            id: ToyId::new(tables.next_id()),
            name: toy.name.clone(),
            color: toy.color.clone(),
        };
        tables.toys.insert(toy.id, toy.clone());
        Ok(toy)
    }

    async fn update_toy(&self, id: ToyId, update: &NewToy) -> Result<Toy, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let toy = tables.toys.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        toy.name.clone_from(&update.name);
        toy.color.clone_from(&update.color);
        Ok(toy.clone())
    }

    async fn delete_toy(&self, id: ToyId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.toys.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let cat_ids: Vec<CatId> = tables.cat_ids_of(id).collect();
        for cat_id in cat_ids {
            tables.cats_by_toy.remove(&(id, cat_id));
            tables.toys_by_cat.remove(&(cat_id, id));
        }
        Ok(())
    }

    async fn list_toy_cats(
        &self,
        toy_id: ToyId,
        scope: OwnerScope,
    ) -> Result<Vec<Cat>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .cat_ids_of(toy_id)
            .filter_map(|cat_id| tables.cats.get(&cat_id))
            .filter(|cat| cat.is_visible_to(scope))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).map(|(user, _)| user.clone()))
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.username == username)
            .map(|(user, _)| user.clone()))
    }

    async fn create_user_with_password(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|(u, _)| &u.username == username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }
        let user = User {
            id: UserId::new(tables.next_id()),
            username: username.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.id, (user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.username == username)
            .cloned())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
