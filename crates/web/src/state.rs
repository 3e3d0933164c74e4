//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use url::Url;

use crate::config::AppConfig;
use crate::db::Store;
use crate::models::{CurrentUser, OwnerScope};
use crate::storage::ObjectStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the repository, the object storage client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn Store>,
    storage: Arc<dyn ObjectStorage>,
    content_security_policy: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `store` - Repository for cats, toys and users
    /// * `storage` - Object storage client for photo uploads
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let content_security_policy = build_content_security_policy(&config.storage.base_url);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                storage,
                content_security_policy,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the repository.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the object storage client.
    #[must_use]
    pub fn storage(&self) -> &dyn ObjectStorage {
        self.inner.storage.as_ref()
    }

    /// CSP header value allowing photos from the storage origin.
    #[must_use]
    pub fn content_security_policy(&self) -> &HeaderValue {
        &self.inner.content_security_policy
    }

    /// The owner scope for a request made by `user`.
    ///
    /// Returns `None` when scoping is enabled and nobody is logged in.
    #[must_use]
    pub fn scope_for(&self, user: Option<&CurrentUser>) -> Option<OwnerScope> {
        if !self.inner.config.ownership_scoped {
            return Some(OwnerScope::All);
        }
        user.map(|u| OwnerScope::Owner(u.id))
    }
}

/// Build the CSP, adding the origin photos are served from to `img-src`.
fn build_content_security_policy(storage_base_url: &str) -> HeaderValue {
    let img_origin = Url::parse(storage_base_url)
        .ok()
        .map(|url| url.origin().ascii_serialization())
        .filter(|origin| origin != "null")
        .unwrap_or_default();

    let policy = format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' {img_origin}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    );

    HeaderValue::from_str(&policy).unwrap_or_else(|_| {
        HeaderValue::from_static(
            "default-src 'none'; script-src 'self'; style-src 'self'; img-src 'self'; \
             form-action 'self'; frame-ancestors 'none'",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_storage_origin() {
        let csp = build_content_security_policy("https://s3.us-east-1.amazonaws.com/");
        let csp = csp.to_str().unwrap_or_default();
        assert!(csp.contains("img-src 'self' https://s3.us-east-1.amazonaws.com;"));
    }

    #[test]
    fn test_csp_ignores_bad_url() {
        let csp = build_content_security_policy("not a url");
        let csp = csp.to_str().unwrap_or_default();
        assert!(csp.contains("img-src 'self' ;"));
    }
}
