//! Authentication route handlers.
//!
//! Handles signup, login and logout with username/password accounts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{LOGIN_PATH, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Where to land after logging in when no `next` is given.
const DEFAULT_REDIRECT: &str = "/cats";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error display and post-login redirect.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "registration/login.html")]
pub struct LoginTemplate {
    pub username: Option<String>,
    pub error: Option<String>,
    pub next: String,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "registration/signup.html")]
pub struct SignupTemplate {
    pub username: Option<String>,
    pub error: Option<String>,
}

/// Message shown for an error code passed back in the query string.
fn error_message(code: &str) -> String {
    match code {
        "credentials" => "Please enter a correct username and password.",
        "username" => {
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters."
        }
        "taken" => "A user with that username already exists.",
        "mismatch" => "The two password fields didn't match.",
        "weak" => "This password is too short. It must contain at least 8 characters.",
        "session" => "Could not start your session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
    .to_string()
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
        .unwrap_or(DEFAULT_REDIRECT)
}

async fn start_session(session: &Session, user: &User) -> Result<(), Response> {
    let current_user = CurrentUser::from(user);
    if let Err(e) = set_current_user(session, &current_user).await {
        tracing::error!("Failed to set session: {}", e);
        return Err(Redirect::to(&format!("{LOGIN_PATH}?error=session")).into_response());
    }
    set_sentry_user(&user.id, user.username.as_str());
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        username: user.map(|u| u.username.to_string()),
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match AuthService::new(state.store())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            return Redirect::to(&format!("{LOGIN_PATH}?error=credentials")).into_response();
        }
    };

    if let Err(response) = start_session(&session, &user).await {
        return response;
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Redirect::to(safe_next(form.next.as_deref())).into_response()
}

/// Handle logout.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    Redirect::to("/")
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
pub async fn signup_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    SignupTemplate {
        username: user.map(|u| u.username.to_string()),
        error: query.error.as_deref().map(error_message),
    }
}

/// Handle signup form submission. The new user is logged in straight away.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let result = AuthService::new(state.store())
        .signup(&form.username, &form.password, &form.password_confirm)
        .await;

    let user = match result {
        Ok(user) => user,
        Err(e) => {
            let code = match e {
                AuthError::InvalidUsername(_) => "username",
                AuthError::UserAlreadyExists => "taken",
                AuthError::PasswordMismatch => "mismatch",
                AuthError::WeakPassword(_) => "weak",
                AuthError::InvalidCredentials
                | AuthError::Repository(_)
                | AuthError::PasswordHash => {
                    tracing::error!("Signup failed: {}", e);
                    "server"
                }
            };
            return Redirect::to(&format!("/signup?error={code}")).into_response();
        }
    };

    if let Err(response) = start_session(&session, &user).await {
        return response;
    }

    Redirect::to(DEFAULT_REDIRECT).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/cats/3")), "/cats/3");
        assert_eq!(safe_next(Some("//evil.example.com")), DEFAULT_REDIRECT);
        assert_eq!(safe_next(Some("https://evil.example.com")), DEFAULT_REDIRECT);
        assert_eq!(safe_next(None), DEFAULT_REDIRECT);
    }

    #[test]
    fn test_safe_next_rejects_backslashes() {
        // Browsers treat `\` like `/`, so `/\host` is protocol-relative
        assert_eq!(safe_next(Some("/\\evil.example")), DEFAULT_REDIRECT);
        assert_eq!(safe_next(Some("/cats\\3")), DEFAULT_REDIRECT);
        assert_eq!(safe_next(Some("/cats/3?tab=photos")), "/cats/3?tab=photos");
    }

    #[test]
    fn test_unknown_error_code_has_generic_message() {
        assert_eq!(
            error_message("nope"),
            "Something went wrong. Please try again."
        );
    }
}
