//! Object storage client for cat photos.
//!
//! Photos are PUT to `<endpoint>/<bucket>/<key>` and served back from
//! `<base_url>/<bucket>/<key>`. Stored objects are never deleted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use thiserror::Error;
use uuid::Uuid;

use crate::config::ObjectStorageConfig;

/// Upload timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of hex characters of the random part of a photo key.
const KEY_HEX_CHARS: usize = 12;

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage service rejected the upload.
    #[error("storage error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client configuration is invalid.
    #[error("invalid storage configuration: {0}")]
    Config(String),
}

/// Something that can store uploaded bytes under a key.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` as `bucket/key`.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;
}

/// Object storage reached over a plain HTTP PUT API.
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpObjectStorage {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ObjectStorageConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = config.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| StorageError::Config(format!("invalid token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let url = object_url(&self.endpoint, bucket, key);

        let mut request = self.client.put(&url).body(body);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Join a base URL, bucket and key with exactly one `/` between each part.
#[must_use]
pub fn object_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        bucket.trim_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Longest extension kept in an object key, not counting the `.`.
pub const MAX_EXTENSION_CHARS: usize = 10;

/// Extension of a file name: everything from the last `.`, or empty.
///
/// Only short ASCII-alphanumeric suffixes are kept; anything else would end
/// up verbatim in the storage URL.
#[must_use]
pub fn file_extension(file_name: &str) -> &str {
    let Some(i) = file_name.rfind('.') else {
        return "";
    };
    let suffix = &file_name[i + 1..];
    if suffix.is_empty()
        || suffix.len() > MAX_EXTENSION_CHARS
        || !suffix.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return "";
    }
    &file_name[i..]
}

/// Random object key for an uploaded photo, keeping the file's extension.
#[must_use]
pub fn photo_key(file_name: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", &random[..KEY_HEX_CHARS], file_extension(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_single_slash() {
        assert_eq!(
            object_url("https://s3.us-east-1.amazonaws.com/", "catcollector", "abc.png"),
            "https://s3.us-east-1.amazonaws.com/catcollector/abc.png"
        );
        assert_eq!(
            object_url("https://cdn.example.com", "catcollector", "abc.png"),
            "https://cdn.example.com/catcollector/abc.png"
        );
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("lolo.png"), ".png");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_file_extension_drops_unsafe_suffixes() {
        assert_eq!(file_extension("evil./nested/path"), "");
        assert_eq!(file_extension("x.png?acl=public-read"), "");
        assert_eq!(file_extension("y.p g#frag"), "");
        assert_eq!(file_extension("photo."), "");
        assert_eq!(file_extension(&format!("photo.{}", "j".repeat(200))), "");
        assert_eq!(file_extension("café.jpé"), "");
        assert_eq!(file_extension("scan.abcdefghij"), ".abcdefghij");
    }

    #[test]
    fn test_photo_key_of_hostile_name_is_plain_hex() {
        let key = photo_key("x.png?acl=public-read");
        assert_eq!(key.len(), KEY_HEX_CHARS);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_photo_key_shape() {
        let key = photo_key("lolo.JPG");
        assert_eq!(key.len(), KEY_HEX_CHARS + 4);
        assert!(key.ends_with(".JPG"));
        assert!(
            key[..KEY_HEX_CHARS]
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_photo_keys_differ() {
        assert_ne!(photo_key("a.png"), photo_key("a.png"));
    }
}
