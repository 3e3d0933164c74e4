//! Authentication service.
//!
//! Provides username/password signup and login.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use cat_collector_core::Username;

use crate::db::{RepositoryError, Store};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles user signup and password login.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user with a username and a confirmed password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password, confirm))]
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username.trim())?;

        if password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user_with_password(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username =
            Username::parse(username.trim()).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    #[tokio::test]
    async fn test_signup_then_login() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth.signup("catlady", "whiskers123", "whiskers123").await.unwrap();
        assert_eq!(user.username.as_str(), "catlady");

        let logged_in = auth.login("catlady", "whiskers123").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let err = auth.login("catlady", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_signup_rejections() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);

        let err = auth.signup("catlady", "whiskers123", "whiskers124").await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));

        let err = auth.signup("catlady", "short", "short").await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));

        let err = auth.signup("cat lady", "whiskers123", "whiskers123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername(_)));

        auth.signup("catlady", "whiskers123", "whiskers123").await.unwrap();
        let err = auth.signup("catlady", "whiskers123", "whiskers123").await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);
        let err = auth.login("nobody", "whiskers123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("whiskers123").unwrap();
        assert!(verify_password("whiskers123", &hash).is_ok());
        assert!(verify_password("whiskers124", &hash).is_err());
    }
}
