//! Photo upload route handler.

use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};
use tracing::instrument;

use cat_collector_core::CatId;

use crate::error::{AppError, Result};
use crate::middleware::Scoped;
use crate::services::{PhotoService, PhotoUpload};
use crate::state::AppState;

/// Multipart field carrying the photo.
pub const PHOTO_FIELD: &str = "photo-file";

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upload a photo of a cat and return to the cat.
///
/// A form without a file is accepted and does nothing.
#[instrument(skip(scoped, state, multipart))]
pub async fn create(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
    multipart: Multipart,
) -> Result<Redirect> {
    let upload = read_photo_field(multipart).await?;

    let config = state.config();
    PhotoService::new(state.store(), state.storage(), &config.storage)
        .add_photo(scoped.scope, id, upload, config.upload_policy)
        .await?;

    Ok(Redirect::to(&format!("/cats/{id}")))
}

/// Pull the photo field out of the form, skipping everything else.
async fn read_photo_field(mut multipart: Multipart) -> Result<Option<PhotoUpload>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(ToOwned::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        return Ok(Some(PhotoUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}
