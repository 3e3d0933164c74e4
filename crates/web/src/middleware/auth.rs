//! Authentication middleware and extractors.
//!
//! Provides extractors for reading the logged-in user from the session and
//! for resolving the [`OwnerScope`] a request runs under.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{Method, StatusCode, header::ACCEPT, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, OwnerScope, session_keys};
use crate::state::AppState;

/// Login page path.
pub const LOGIN_PATH: &str = "/accounts/login";

/// Extractor that requires authentication.
///
/// If the user is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin(String),
    /// Unauthorized response (for non-HTML requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => {
                Redirect::to(&format!("{LOGIN_PATH}?next={next}")).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl AuthRejection {
    /// Pick the rejection that suits the request.
    ///
    /// `DELETE` requests and requests that accept JSON but not HTML get a
    /// bare 401; everything else is sent to the login page.
    fn for_request(parts: &Parts) -> Self {
        let accept = parts
            .headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let wants_json = accept.contains("application/json") && !accept.contains("text/html");

        if parts.method == Method::DELETE || wants_json {
            Self::Unauthorized
        } else {
            // Nested routers strip their prefix from `parts.uri`
            let path = parts
                .extensions
                .get::<OriginalUri>()
                .map_or_else(|| parts.uri.path(), |uri| uri.path());
            Self::RedirectToLogin(path.to_owned())
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match current_user(parts).await {
            Some(user) => Ok(Self(user)),
            None => Err(AuthRejection::for_request(parts)),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Extractor for the owner scope of the request.
///
/// With ownership scoping enabled the user must be logged in and only sees
/// their own cats; otherwise every cat is visible and login is optional.
pub struct Scoped {
    pub scope: OwnerScope,
    pub user: Option<CurrentUser>,
}

impl Scoped {
    /// Username for the page header.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.user.as_ref().map(|u| u.username.to_string())
    }
}

impl FromRequestParts<AppState> for Scoped {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await;
        let scope = state
            .scope_for(user.as_ref())
            .ok_or_else(|| AuthRejection::for_request(parts))?;
        Ok(Self { scope, user })
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session.
///
/// Cycles the session id to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
