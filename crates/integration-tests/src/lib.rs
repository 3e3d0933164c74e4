//! Integration tests for Cat Collector.
//!
//! The full router is driven in-process with `tower::ServiceExt::oneshot`,
//! backed by the in-memory repository, tower-sessions' `MemoryStore`, and
//! [`FakeStorage`] in place of the object storage API. No database or
//! network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cat-collector-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use cat_collector_core::CatId;
use cat_collector_web::config::{AppConfig, FailurePolicy, ObjectStorageConfig};
use cat_collector_web::db::InMemoryStore;
use cat_collector_web::middleware::create_session_layer;
use cat_collector_web::state::AppState;
use cat_collector_web::storage::{ObjectStorage, StorageError};

/// Session cookie name set by the app.
const SESSION_COOKIE: &str = "cat_session";

/// Multipart boundary used by [`TestApp::post_multipart`].
const BOUNDARY: &str = "----cat-collector-test-boundary";

/// Password that passes the length check.
pub const PASSWORD: &str = "whiskers-and-yarn";

/// An object recorded by [`FakeStorage`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size: usize,
    pub content_type: Option<String>,
}

/// Object storage that keeps uploads in memory, or fails on demand.
#[derive(Debug, Default)]
pub struct FakeStorage {
    fail: AtomicBool,
    objects: Mutex<Vec<StoredObject>>,
}

impl FakeStorage {
    /// Make every following upload fail.
    pub fn fail_uploads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Everything uploaded so far.
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects
            .lock()
            .map(|objects| objects.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Api {
                status: 503,
                message: "storage unavailable".to_owned(),
            });
        }

        if let Ok(mut objects) = self.objects.lock() {
            objects.push(StoredObject {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                size: body.len(),
                content_type: content_type.map(str::to_owned),
            });
        }
        Ok(())
    }
}

/// Configuration for tests: scoped ownership, lenient policies.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://localhost/cat_collector_unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 8000,
        base_url: "http://localhost:8000".to_owned(),
        ownership_scoped: true,
        feeding_policy: FailurePolicy::Silent,
        upload_policy: FailurePolicy::Silent,
        storage: ObjectStorageConfig {
            bucket: "catcollector".to_owned(),
            base_url: "https://s3.us-east-1.amazonaws.com/".to_owned(),
            endpoint: "https://s3.us-east-1.amazonaws.com".to_owned(),
            token: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// The cat id at the end of a `/cats/{id}` redirect.
    #[must_use]
    pub fn redirected_cat_id(&self) -> CatId {
        let id = self
            .location()
            .and_then(|l| l.strip_prefix("/cats/"))
            .and_then(|id| id.parse::<i32>().ok())
            .expect("response should redirect to a cat");
        CatId::new(id)
    }
}

/// The app under test plus handles on its backing stores.
///
/// Acts like a browser with a cookie jar holding the session cookie.
pub struct TestApp {
    router: Router,
    pub store: Arc<InMemoryStore>,
    pub storage: Arc<FakeStorage>,
    cookie: Option<String>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App with [`test_config`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// App with a custom configuration.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let storage = Arc::new(FakeStorage::default());
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, store.clone(), storage.clone());

        Self {
            router: cat_collector_web::app(state, session_layer),
            store,
            storage,
            cookie: None,
        }
    }

    /// Send a request carrying the session cookie, remembering any new one.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            let value = HeaderValue::from_str(cookie).expect("cookie is a valid header value");
            request.headers_mut().insert(header::COOKIE, value);
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let Ok(set_cookie) = set_cookie.to_str() else {
                continue;
            };
            let pair = set_cookie.split(';').next().unwrap_or_default();
            if let Some(value) = pair.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                self.cookie = (!value.is_empty()).then(|| pair.to_owned());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body should be readable");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET path`.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path)
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    /// `DELETE path`.
    pub async fn delete(&mut self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(path)
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    /// `POST path` with a url-encoded form.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("valid request");
        self.send(request).await
    }

    /// `POST path` with a multipart form holding one file field.
    ///
    /// `file` is `(file name, content type, bytes)`; `None` sends only a
    /// text field, the way a browser submits a form with no file chosen.
    pub async fn post_multipart(
        &mut self,
        path: &str,
        field: &str,
        file: Option<(&str, &str, &[u8])>,
    ) -> TestResponse {
        let mut body = Vec::new();
        match file {
            Some((file_name, content_type, bytes)) => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\n\
                         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\n\
                         Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
                         no file\r\n"
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("valid request");
        self.send(request).await
    }

    /// Sign up (which also logs in) as `username`.
    pub async fn signup(&mut self, username: &str) -> TestResponse {
        let response = self
            .post_form(
                "/signup",
                &[
                    ("username", username),
                    ("password", PASSWORD),
                    ("password_confirm", PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.location(), Some("/cats"), "signup should succeed");
        response
    }

    /// Log in as an existing user.
    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            "/accounts/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Log out, dropping the session.
    pub async fn logout(&mut self) -> TestResponse {
        self.post_form("/accounts/logout", &[]).await
    }

    /// Create a cat through the form and return its id.
    pub async fn create_cat(&mut self, name: &str, breed: &str, age: &str) -> CatId {
        let response = self
            .post_form(
                "/cats",
                &[
                    ("name", name),
                    ("breed", breed),
                    ("description", "a very good cat"),
                    ("age", age),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.redirected_cat_id()
    }

    /// Create a toy through the form and return its detail path.
    pub async fn create_toy(&mut self, name: &str, color: &str) -> String {
        let response = self
            .post_form("/toys", &[("name", name), ("color", color)])
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response
            .location()
            .expect("toy creation should redirect")
            .to_owned()
    }
}

/// Today's date the way the feeding form submits it.
#[must_use]
pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}
