//! HTTP route handlers for Cat Collector.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /about                  - About page
//!
//! # Cats (owner-scoped)
//! GET  /cats                   - Cat list
//! POST /cats                   - Create cat
//! GET  /cats/new               - New cat form
//! GET  /cats/{id}              - Cat detail (feedings, toys, photos)
//! POST /cats/{id}              - Update cat
//! GET  /cats/{id}/edit         - Edit cat form
//! GET  /cats/{id}/delete       - Delete confirmation
//! POST /cats/{id}/delete       - Delete cat
//! POST /cats/{id}/feedings     - Add feeding
//! POST /cats/{id}/photos       - Upload photo (multipart field `photo-file`)
//! POST /cats/{id}/toys/{toy_id}        - Give toy to cat
//! DELETE /cats/{id}/toys/{toy_id}      - Take toy from cat
//! POST /cats/{id}/toys/{toy_id}/remove - Take toy from cat (HTML form)
//!
//! # Toys
//! GET  /toys                   - Toy list
//! POST /toys                   - Create toy
//! GET  /toys/new               - New toy form
//! GET  /toys/{id}              - Toy detail
//! POST /toys/{id}              - Update toy
//! DELETE /toys/{id}            - Delete toy
//! GET  /toys/{id}/edit         - Edit toy form
//! GET  /toys/{id}/delete       - Delete confirmation
//! POST /toys/{id}/delete       - Delete toy (HTML form)
//!
//! # Accounts
//! GET  /signup                 - Signup page
//! POST /signup                 - Signup action
//! GET  /accounts/login         - Login page
//! POST /accounts/login         - Login action
//! POST /accounts/logout        - Logout action
//! ```

pub mod auth;
pub mod cats;
pub mod feedings;
pub mod home;
pub mod photos;
pub mod toys;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use chrono::NaiveDate;

use crate::state::AppState;

/// The server's local calendar date.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Create the cat routes router.
pub fn cat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cats::index).post(cats::create))
        .route("/new", get(cats::new_cat))
        .route("/{id}", get(cats::show).post(cats::update))
        .route("/{id}/edit", get(cats::edit))
        .route(
            "/{id}/delete",
            get(cats::confirm_delete).post(cats::delete),
        )
        .route("/{id}/feedings", post(feedings::create))
        .route(
            "/{id}/photos",
            post(photos::create).layer(DefaultBodyLimit::max(photos::MAX_UPLOAD_BYTES)),
        )
        .route(
            "/{id}/toys/{toy_id}",
            post(cats::associate_toy).delete(cats::dissociate_toy),
        )
        .route("/{id}/toys/{toy_id}/remove", post(cats::remove_toy))
}

/// Create the toy routes router.
pub fn toy_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(toys::index).post(toys::create))
        .route("/new", get(toys::new_toy))
        .route(
            "/{id}",
            get(toys::show).post(toys::update).delete(toys::destroy),
        )
        .route("/{id}/edit", get(toys::edit))
        .route(
            "/{id}/delete",
            get(toys::confirm_delete).post(toys::delete),
        )
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for Cat Collector.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/about", get(home::about))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .nest("/cats", cat_routes())
        .nest("/toys", toy_routes())
        .nest("/accounts", account_routes())
}
