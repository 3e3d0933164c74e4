//! Cat route handlers.
//!
//! Every handler resolves the request's [`OwnerScope`](crate::models::OwnerScope)
//! through the [`Scoped`] extractor before touching a cat.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use cat_collector_core::{CatId, Meal, ToyId};

use crate::error::Result;
use crate::middleware::Scoped;
use crate::models::{Cat, CatUpdate, NewCat, ValidationErrors};
use crate::services::{CatDetail, CatService};
use crate::state::AppState;

use super::today;

// =============================================================================
// Form Types
// =============================================================================

/// Cat form data, also used to refill the form after a validation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatForm {
    pub name: String,
    pub breed: String,
    pub description: String,
    pub age: String,
}

impl From<&Cat> for CatForm {
    fn from(cat: &Cat) -> Self {
        Self {
            name: cat.name.clone(),
            breed: cat.breed.clone(),
            description: cat.description.clone(),
            age: cat.age.to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cat list page template.
#[derive(Template, WebTemplate)]
#[template(path = "cats/index.html")]
pub struct CatsIndexTemplate {
    pub username: Option<String>,
    pub cats: Vec<Cat>,
}

/// Cat detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "cats/detail.html")]
pub struct CatDetailTemplate {
    pub username: Option<String>,
    pub detail: CatDetail,
    pub meals: [Meal; 3],
    pub today: String,
}

/// Create/edit cat form template.
///
/// `cat` is set when editing; the name field is then read-only.
#[derive(Template, WebTemplate)]
#[template(path = "cats/form.html")]
pub struct CatFormTemplate {
    pub username: Option<String>,
    pub cat: Option<Cat>,
    pub form: CatForm,
    pub errors: ValidationErrors,
}

impl CatFormTemplate {
    fn action(&self) -> String {
        self.cat
            .as_ref()
            .map_or_else(|| "/cats".to_string(), Cat::detail_path)
    }
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "cats/confirm_delete.html")]
pub struct CatConfirmDeleteTemplate {
    pub username: Option<String>,
    pub cat: Cat,
}

// =============================================================================
// Cat CRUD
// =============================================================================

/// List the caller's cats.
#[instrument(skip(scoped, state))]
pub async fn index(scoped: Scoped, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cats = CatService::new(state.store()).list(scoped.scope).await?;

    Ok(CatsIndexTemplate {
        username: scoped.username(),
        cats,
    })
}

/// Show a cat with its feedings, toys and photos.
#[instrument(skip(scoped, state))]
pub async fn show(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
) -> Result<impl IntoResponse> {
    let today = today();
    let detail = CatService::new(state.store())
        .detail(scoped.scope, id, today)
        .await?;

    Ok(CatDetailTemplate {
        username: scoped.username(),
        detail,
        meals: Meal::ALL,
        today: today.format(crate::models::feeding::DATE_FORMAT).to_string(),
    })
}

/// Display the new cat form.
pub async fn new_cat(scoped: Scoped) -> impl IntoResponse {
    CatFormTemplate {
        username: scoped.username(),
        cat: None,
        form: CatForm::default(),
        errors: ValidationErrors::new(),
    }
}

/// Handle new cat form submission.
#[instrument(skip(scoped, state, form))]
pub async fn create(
    scoped: Scoped,
    State(state): State<AppState>,
    Form(form): Form<CatForm>,
) -> Result<Response> {
    let new_cat = match NewCat::parse(&form.name, &form.breed, &form.description, &form.age) {
        Ok(cat) => cat,
        Err(errors) => {
            let page = CatFormTemplate {
                username: scoped.username(),
                cat: None,
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let cat = CatService::new(state.store())
        .create(scoped.scope, &new_cat)
        .await?;

    Ok(Redirect::to(&cat.detail_path()).into_response())
}

/// Display the edit form.
#[instrument(skip(scoped, state))]
pub async fn edit(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
) -> Result<impl IntoResponse> {
    let cat = CatService::new(state.store()).get(scoped.scope, id).await?;

    Ok(CatFormTemplate {
        username: scoped.username(),
        form: CatForm::from(&cat),
        cat: Some(cat),
        errors: ValidationErrors::new(),
    })
}

/// Handle edit form submission. A submitted name is ignored.
#[instrument(skip(scoped, state, form))]
pub async fn update(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
    Form(form): Form<CatForm>,
) -> Result<Response> {
    let service = CatService::new(state.store());

    let update = match CatUpdate::parse(&form.breed, &form.description, &form.age) {
        Ok(update) => update,
        Err(errors) => {
            let cat = service.get(scoped.scope, id).await?;
            let page = CatFormTemplate {
                username: scoped.username(),
                form: CatForm {
                    name: cat.name.clone(),
                    ..form
                },
                cat: Some(cat),
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let cat = service.update(scoped.scope, id, &update).await?;

    Ok(Redirect::to(&cat.detail_path()).into_response())
}

/// Display the delete confirmation page.
#[instrument(skip(scoped, state))]
pub async fn confirm_delete(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
) -> Result<impl IntoResponse> {
    let cat = CatService::new(state.store()).get(scoped.scope, id).await?;

    Ok(CatConfirmDeleteTemplate {
        username: scoped.username(),
        cat,
    })
}

/// Delete a cat and return to the list.
#[instrument(skip(scoped, state))]
pub async fn delete(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<CatId>,
) -> Result<Redirect> {
    CatService::new(state.store())
        .delete(scoped.scope, id)
        .await?;

    Ok(Redirect::to("/cats"))
}

// =============================================================================
// Toy Association
// =============================================================================

/// Give a toy to a cat.
#[instrument(skip(scoped, state))]
pub async fn associate_toy(
    scoped: Scoped,
    State(state): State<AppState>,
    Path((id, toy_id)): Path<(CatId, ToyId)>,
) -> Result<Redirect> {
    CatService::new(state.store())
        .associate_toy(scoped.scope, id, toy_id)
        .await?;

    Ok(Redirect::to(&format!("/cats/{id}")))
}

/// Take a toy away from a cat (HTML form variant).
#[instrument(skip(scoped, state))]
pub async fn remove_toy(
    scoped: Scoped,
    State(state): State<AppState>,
    Path((id, toy_id)): Path<(CatId, ToyId)>,
) -> Result<Redirect> {
    CatService::new(state.store())
        .dissociate_toy(scoped.scope, id, toy_id)
        .await?;

    Ok(Redirect::to(&format!("/cats/{id}")))
}

/// Take a toy away from a cat.
#[instrument(skip(scoped, state))]
pub async fn dissociate_toy(
    scoped: Scoped,
    State(state): State<AppState>,
    Path((id, toy_id)): Path<(CatId, ToyId)>,
) -> Result<StatusCode> {
    CatService::new(state.store())
        .dissociate_toy(scoped.scope, id, toy_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
