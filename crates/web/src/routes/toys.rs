//! Toy route handlers.

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

use cat_collector_core::ToyId;

use crate::error::Result;
use crate::middleware::Scoped;
use crate::models::{NewToy, Toy, ValidationErrors};
use crate::services::{ToyDetail, ToyService};
use crate::state::AppState;

/// Toy form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToyForm {
    pub name: String,
    pub color: String,
}

impl From<&Toy> for ToyForm {
    fn from(toy: &Toy) -> Self {
        Self {
            name: toy.name.clone(),
            color: toy.color.clone(),
        }
    }
}

/// Toy list page template.
#[derive(Template, WebTemplate)]
#[template(path = "toys/index.html")]
pub struct ToysIndexTemplate {
    pub username: Option<String>,
    pub toys: Vec<Toy>,
}

/// Toy detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "toys/detail.html")]
pub struct ToyDetailTemplate {
    pub username: Option<String>,
    pub detail: ToyDetail,
}

/// Create/edit toy form template.
#[derive(Template, WebTemplate)]
#[template(path = "toys/form.html")]
pub struct ToyFormTemplate {
    pub username: Option<String>,
    pub toy: Option<Toy>,
    pub form: ToyForm,
    pub errors: ValidationErrors,
}

impl ToyFormTemplate {
    fn action(&self) -> String {
        self.toy
            .as_ref()
            .map_or_else(|| "/toys".to_string(), Toy::detail_path)
    }
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "toys/confirm_delete.html")]
pub struct ToyConfirmDeleteTemplate {
    pub username: Option<String>,
    pub toy: Toy,
}

/// List all toys.
#[instrument(skip(scoped, state))]
pub async fn index(scoped: Scoped, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let toys = ToyService::new(state.store()).list().await?;

    Ok(ToysIndexTemplate {
        username: scoped.username(),
        toys,
    })
}

/// Show a toy and the cats that have it.
#[instrument(skip(scoped, state))]
pub async fn show(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<ToyId>,
) -> Result<impl IntoResponse> {
    let detail = ToyService::new(state.store())
        .detail(scoped.scope, id)
        .await?;

    Ok(ToyDetailTemplate {
        username: scoped.username(),
        detail,
    })
}

/// Display the new toy form.
pub async fn new_toy(scoped: Scoped) -> impl IntoResponse {
    ToyFormTemplate {
        username: scoped.username(),
        toy: None,
        form: ToyForm::default(),
        errors: ValidationErrors::new(),
    }
}

/// Handle new toy form submission.
#[instrument(skip(scoped, state, form))]
pub async fn create(
    scoped: Scoped,
    State(state): State<AppState>,
    Form(form): Form<ToyForm>,
) -> Result<Response> {
    let new_toy = match NewToy::parse(&form.name, &form.color) {
        Ok(toy) => toy,
        Err(errors) => {
            let page = ToyFormTemplate {
                username: scoped.username(),
                toy: None,
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let toy = ToyService::new(state.store()).create(&new_toy).await?;

    Ok(Redirect::to(&toy.detail_path()).into_response())
}

/// Display the edit form.
#[instrument(skip(scoped, state))]
pub async fn edit(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<ToyId>,
) -> Result<impl IntoResponse> {
    let toy = ToyService::new(state.store()).get(id).await?;

    Ok(ToyFormTemplate {
        username: scoped.username(),
        form: ToyForm::from(&toy),
        toy: Some(toy),
        errors: ValidationErrors::new(),
    })
}

/// Handle edit form submission.
#[instrument(skip(scoped, state, form))]
pub async fn update(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<ToyId>,
    Form(form): Form<ToyForm>,
) -> Result<Response> {
    let service = ToyService::new(state.store());

    let update = match NewToy::parse(&form.name, &form.color) {
        Ok(update) => update,
        Err(errors) => {
            let toy = service.get(id).await?;
            let page = ToyFormTemplate {
                username: scoped.username(),
                toy: Some(toy),
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let toy = service.update(id, &update).await?;

    Ok(Redirect::to(&toy.detail_path()).into_response())
}

/// Display the delete confirmation page.
#[instrument(skip(scoped, state))]
pub async fn confirm_delete(
    scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<ToyId>,
) -> Result<impl IntoResponse> {
    let toy = ToyService::new(state.store()).get(id).await?;

    Ok(ToyConfirmDeleteTemplate {
        username: scoped.username(),
        toy,
    })
}

/// Delete a toy and return to the list (HTML form variant).
#[instrument(skip(_scoped, state))]
pub async fn delete(
    _scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<ToyId>,
) -> Result<Redirect> {
    ToyService::new(state.store()).delete(id).await?;

    Ok(Redirect::to("/toys"))
}

/// Delete a toy.
#[instrument(skip(_scoped, state))]
pub async fn destroy(
    _scoped: Scoped,
    State(state): State<AppState>,
    Path(id): Path<ToyId>,
) -> Result<StatusCode> {
    ToyService::new(state.store()).delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
