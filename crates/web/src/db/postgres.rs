//! `PostgreSQL` repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use cat_collector_core::{CatId, FeedingId, Meal, PhotoId, ToyId, UserId, Username};

use super::{CatRepository, RepositoryError, Store, ToyRepository, UserRepository};
use crate::models::{Cat, CatUpdate, Feeding, NewCat, NewFeeding, NewToy, OwnerScope, Photo, Toy, User};

/// Repository backed by a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CatRow {
    id: CatId,
    name: String,
    breed: String,
    description: String,
    age: i32,
    owner_id: Option<UserId>,
}

impl From<CatRow> for Cat {
    fn from(row: CatRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            breed: row.breed,
            description: row.description,
            age: row.age,
            owner: row.owner_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeedingRow {
    id: FeedingId,
    cat_id: CatId,
    date: NaiveDate,
    meal: String,
}

impl TryFrom<FeedingRow> for Feeding {
    type Error = RepositoryError;

    fn try_from(row: FeedingRow) -> Result<Self, Self::Error> {
        let meal = Meal::parse(&row.meal)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid meal in database: {e}")))?;
        Ok(Self {
            id: row.id,
            cat_id: row.cat_id,
            date: row.date,
            meal,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ToyRow {
    id: ToyId,
    name: String,
    color: String,
}

impl From<ToyRow> for Toy {
    fn from(row: ToyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color: row.color,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PhotoRow {
    id: PhotoId,
    cat_id: CatId,
    url: String,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            cat_id: row.cat_id,
            url: row.url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            username,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserPasswordRow {
    id: UserId,
    username: String,
    created_at: DateTime<Utc>,
    password_hash: Option<String>,
}

/// Map a foreign key violation (missing parent row) to `NotFound`.
fn missing_parent(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Cats
// =============================================================================

#[async_trait]
impl CatRepository for PgStore {
    async fn list_cats(&self, scope: OwnerScope) -> Result<Vec<Cat>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatRow>(
            r"
            SELECT id, name, breed, description, age, owner_id
            FROM cats
            WHERE $1::INTEGER IS NULL OR owner_id = $1
            ORDER BY id
            ",
        )
        .bind(scope.owner())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Cat::from).collect())
    }

    async fn get_cat(&self, id: CatId) -> Result<Option<Cat>, RepositoryError> {
        let row = sqlx::query_as::<_, CatRow>(
            r"
            SELECT id, name, breed, description, age, owner_id
            FROM cats
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cat::from))
    }

    async fn create_cat(
        &self,
        cat: &NewCat,
        owner: Option<UserId>,
    ) -> Result<Cat, RepositoryError> {
        let row = sqlx::query_as::<_, CatRow>(
            r"
            INSERT INTO cats (name, breed, description, age, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, breed, description, age, owner_id
            ",
        )
        .bind(&cat.name)
        .bind(&cat.breed)
        .bind(&cat.description)
        .bind(cat.age)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(row.into())
    }

    async fn update_cat(&self, id: CatId, update: &CatUpdate) -> Result<Cat, RepositoryError> {
        let row = sqlx::query_as::<_, CatRow>(
            r"
            UPDATE cats
            SET breed = $2, description = $3, age = $4
            WHERE id = $1
            RETURNING id, name, breed, description, age, owner_id
            ",
        )
        .bind(id)
        .bind(&update.breed)
        .bind(&update.description)
        .bind(update.age)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Cat::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete_cat(&self, id: CatId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for statement in [
            "DELETE FROM feedings WHERE cat_id = $1",
            "DELETE FROM photos WHERE cat_id = $1",
            "DELETE FROM cat_toys WHERE cat_id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM cats WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_feedings(&self, cat_id: CatId) -> Result<Vec<Feeding>, RepositoryError> {
        let rows = sqlx::query_as::<_, FeedingRow>(
            r"
            SELECT id, cat_id, date, meal
            FROM feedings
            WHERE cat_id = $1
            ORDER BY date DESC, id DESC
            ",
        )
        .bind(cat_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Feeding::try_from).collect()
    }

    async fn add_feeding(
        &self,
        cat_id: CatId,
        feeding: &NewFeeding,
    ) -> Result<Feeding, RepositoryError> {
        let row = sqlx::query_as::<_, FeedingRow>(
            r"
            INSERT INTO feedings (cat_id, date, meal)
            VALUES ($1, $2, $3)
            RETURNING id, cat_id, date, meal
            ",
        )
        .bind(cat_id)
        .bind(feeding.date)
        .bind(feeding.meal.code())
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent)?;

        row.try_into()
    }

    async fn count_feedings_on(
        &self,
        cat_id: CatId,
        date: NaiveDate,
    ) -> Result<usize, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM feedings WHERE cat_id = $1 AND date = $2")
                .bind(cat_id)
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        usize::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
    }

    async fn list_photos(&self, cat_id: CatId) -> Result<Vec<Photo>, RepositoryError> {
        let rows = sqlx::query_as::<_, PhotoRow>(
            "SELECT id, cat_id, url FROM photos WHERE cat_id = $1 ORDER BY id",
        )
        .bind(cat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Photo::from).collect())
    }

    async fn add_photo(&self, cat_id: CatId, url: &str) -> Result<Photo, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(
            r"
            INSERT INTO photos (cat_id, url)
            VALUES ($1, $2)
            RETURNING id, cat_id, url
            ",
        )
        .bind(cat_id)
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(row.into())
    }

    async fn list_cat_toys(&self, cat_id: CatId) -> Result<Vec<Toy>, RepositoryError> {
        let rows = sqlx::query_as::<_, ToyRow>(
            r"
            SELECT t.id, t.name, t.color
            FROM toys t
            JOIN cat_toys ct ON ct.toy_id = t.id
            WHERE ct.cat_id = $1
            ORDER BY t.id
            ",
        )
        .bind(cat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Toy::from).collect())
    }

    async fn list_available_toys(&self, cat_id: CatId) -> Result<Vec<Toy>, RepositoryError> {
        let rows = sqlx::query_as::<_, ToyRow>(
            r"
            SELECT t.id, t.name, t.color
            FROM toys t
            WHERE NOT EXISTS (
                SELECT 1 FROM cat_toys ct
                WHERE ct.toy_id = t.id AND ct.cat_id = $1
            )
            ORDER BY t.id
            ",
        )
        .bind(cat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Toy::from).collect())
    }

    async fn associate_toy(&self, cat_id: CatId, toy_id: ToyId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cat_toys (cat_id, toy_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(cat_id)
        .bind(toy_id)
        .execute(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(())
    }

    async fn dissociate_toy(&self, cat_id: CatId, toy_id: ToyId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cat_toys WHERE cat_id = $1 AND toy_id = $2")
            .bind(cat_id)
            .bind(toy_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Toys
// =============================================================================

#[async_trait]
impl ToyRepository for PgStore {
    async fn list_toys(&self) -> Result<Vec<Toy>, RepositoryError> {
        let rows = sqlx::query_as::<_, ToyRow>("SELECT id, name, color FROM toys ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Toy::from).collect())
    }

    async fn get_toy(&self, id: ToyId) -> Result<Option<Toy>, RepositoryError> {
        let row = sqlx::query_as::<_, ToyRow>("SELECT id, name, color FROM toys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Toy::from))
    }

    async fn create_toy(&self, toy: &NewToy) -> Result<Toy, RepositoryError> {
        let row = sqlx::query_as::<_, ToyRow>(
            "INSERT INTO toys (name, color) VALUES ($1, $2) RETURNING id, name, color",
        )
        .bind(&toy.name)
        .bind(&toy.color)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_toy(&self, id: ToyId, toy: &NewToy) -> Result<Toy, RepositoryError> {
        let row = sqlx::query_as::<_, ToyRow>(
            r"
            UPDATE toys
            SET name = $2, color = $3
            WHERE id = $1
            RETURNING id, name, color
            ",
        )
        .bind(id)
        .bind(&toy.name)
        .bind(&toy.color)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Toy::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete_toy(&self, id: ToyId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cat_toys WHERE toy_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM toys WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_toy_cats(
        &self,
        toy_id: ToyId,
        scope: OwnerScope,
    ) -> Result<Vec<Cat>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatRow>(
            r"
            SELECT c.id, c.name, c.breed, c.description, c.age, c.owner_id
            FROM cats c
            JOIN cat_toys ct ON ct.cat_id = c.id
            WHERE ct.toy_id = $1
              AND ($2::INTEGER IS NULL OR c.owner_id = $2)
            ORDER BY c.id
            ",
        )
        .bind(toy_id)
        .bind(scope.owner())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Cat::from).collect())
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserRepository for PgStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE username = $1",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_user_with_password(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING id, username, created_at
            ",
        )
        .bind(username.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let user = User::try_from(row)?;

        sqlx::query("INSERT INTO user_passwords (user_id, password_hash) VALUES ($1, $2)")
            .bind(user.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserPasswordRow>(
            r"
            SELECT u.id, u.username, u.created_at, p.password_hash
            FROM users u
            LEFT JOIN user_passwords p ON u.id = p.user_id
            WHERE u.username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        let user = User::try_from(UserRow {
            id: r.id,
            username: r.username,
            created_at: r.created_at,
        })?;

        Ok(Some((user, password_hash)))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
