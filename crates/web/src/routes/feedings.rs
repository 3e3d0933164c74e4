//! Feeding log route handlers.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use cat_collector_core::CatId;

use crate::error::{AppError, Result};
use crate::middleware::Scoped;
use crate::services::{CatService, ServiceError};
use crate::state::AppState;

/// Feeding form data.
///
/// Fields default to empty so malformed submissions reach the feeding
/// policy instead of being rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedingForm {
    pub date: String,
    pub meal: Option<String>,
}

/// Record a feeding and return to the cat.
///
/// Invalid submissions are dropped or rejected with 400 depending on
/// `FEEDING_VALIDATION_POLICY`.
#[instrument(skip(scoped, state))]
pub async fn create(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
    Form(form): Form<FeedingForm>,
) -> Result<Redirect> {
    CatService::new(state.store())
        .add_feeding(
            scoped.scope,
            id,
            &form.date,
            form.meal.as_deref(),
            state.config().feeding_policy,
        )
        .await
        .map_err(|e| match e {
            ServiceError::Validation(errors) => AppError::BadRequest(errors.to_string()),
            other => other.into(),
        })?;

    Ok(Redirect::to(&format!("/cats/{id}")))
}
