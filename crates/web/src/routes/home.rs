//! Home and about page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::middleware::OptionalAuth;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: Option<String>,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub username: Option<String>,
}

/// Home page handler.
pub async fn home(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    HomeTemplate {
        username: user.map(|u| u.username.to_string()),
    }
}

/// About page handler.
pub async fn about(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    AboutTemplate {
        username: user.map(|u| u.username.to_string()),
    }
}
