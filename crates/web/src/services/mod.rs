//! Business logic services for Cat Collector.
//!
//! # Services
//!
//! - `auth` - Signup and password login
//! - `cats` - Cats, their feeding log and toy associations
//! - `photos` - Photo upload to object storage
//! - `toys` - Toy catalogue
//!
//! Every cat-facing operation takes an explicit [`OwnerScope`](crate::models::OwnerScope).

pub mod auth;
pub mod cats;
pub mod photos;
pub mod toys;

pub use cats::{CatDetail, CatService};
pub use photos::{PhotoService, PhotoUpload};
pub use toys::{ToyDetail, ToyService};

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationErrors;
use crate::storage::StorageError;

/// Errors returned by the cat, toy and photo services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The entity exists but belongs to another user.
    #[error("forbidden")]
    Forbidden,

    /// Submitted fields failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Object storage rejected or failed an upload.
    #[error("upstream error: {0}")]
    Upstream(#[from] StorageError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl ServiceError {
    /// Map a repository error, naming the entity for `NotFound`.
    pub(crate) fn from_repository(entity: &'static str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(entity),
            other => Self::Repository(other),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}
