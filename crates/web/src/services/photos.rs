//! Photo upload.

use tracing::instrument;

use cat_collector_core::CatId;

use super::{CatService, ServiceError};
use crate::config::{FailurePolicy, ObjectStorageConfig};
use crate::db::Store;
use crate::models::photo::URL_MAX_CHARS;
use crate::models::{OwnerScope, Photo, ValidationErrors};
use crate::storage::{ObjectStorage, StorageError, photo_key};

/// A file submitted through the photo form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Client-side file name; only its extension is kept.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Uploads photos to object storage and records their URLs.
pub struct PhotoService<'a> {
    store: &'a dyn Store,
    storage: &'a dyn ObjectStorage,
    config: &'a ObjectStorageConfig,
}

impl<'a> PhotoService<'a> {
    /// Create a new photo service.
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        storage: &'a dyn ObjectStorage,
        config: &'a ObjectStorageConfig,
    ) -> Self {
        Self {
            store,
            storage,
            config,
        }
    }

    /// Upload a photo of a cat and record its public URL.
    ///
    /// A missing file (or one without a name) is a no-op. Upload failures are
    /// logged and reported to Sentry under [`FailurePolicy::Silent`], and
    /// returned as `ServiceError::Upstream` under [`FailurePolicy::Surface`].
    ///
    /// # Returns
    ///
    /// The new photo, or `None` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the cat doesn't exist and
    /// `ServiceError::Forbidden` if it belongs to someone else.
    #[instrument(skip(self, upload), fields(file_name))]
    pub async fn add_photo(
        &self,
        scope: OwnerScope,
        cat_id: CatId,
        upload: Option<PhotoUpload>,
        policy: FailurePolicy,
    ) -> Result<Option<Photo>, ServiceError> {
        CatService::new(self.store).get(scope, cat_id).await?;

        let Some(upload) = upload.filter(|u| !u.file_name.is_empty()) else {
            tracing::debug!(cat_id = %cat_id, "No photo submitted");
            return Ok(None);
        };
        tracing::Span::current().record("file_name", upload.file_name.as_str());

        let key = photo_key(&upload.file_name);
        let url = self.config.public_url(&key);
        // Keys are bounded, so only an overlong base URL or bucket gets here
        if url.chars().count() > URL_MAX_CHARS {
            return match policy {
                FailurePolicy::Silent => {
                    tracing::warn!(cat_id = %cat_id, %url, "Photo URL too long, upload dropped");
                    Ok(None)
                }
                FailurePolicy::Surface => {
                    let mut errors = ValidationErrors::new();
                    errors.add(
                        "url",
                        format!("Ensure this value has at most {URL_MAX_CHARS} characters."),
                    );
                    Err(errors.into())
                }
            };
        }

        if let Err(e) = self
            .storage
            .put_object(
                &self.config.bucket,
                &key,
                upload.bytes,
                upload.content_type.as_deref(),
            )
            .await
        {
            return match policy {
                FailurePolicy::Silent => {
                    report_upload_failure(cat_id, &key, &e);
                    Ok(None)
                }
                FailurePolicy::Surface => Err(e.into()),
            };
        }

        let photo = self
            .store
            .add_photo(cat_id, &url)
            .await
            .map_err(|e| ServiceError::from_repository("cat", e))?;
        tracing::info!(cat_id = %cat_id, photo_id = %photo.id, %url, "Photo uploaded");
        Ok(Some(photo))
    }
}

fn report_upload_failure(cat_id: CatId, key: &str, err: &StorageError) {
    let event_id = sentry::capture_error(err);
    tracing::error!(
        cat_id = %cat_id,
        key,
        error = %err,
        sentry_event_id = %event_id,
        "Photo upload failed"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::{CatRepository, InMemoryStore};
    use crate::models::NewCat;

    #[derive(Default)]
    struct FakeStorage {
        fail: bool,
        puts: Mutex<Vec<(String, String, Option<String>)>>,
    }

    #[async_trait]
    impl ObjectStorage for FakeStorage {
        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            _body: Vec<u8>,
            content_type: Option<&str>,
        ) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::Api {
                    status: 503,
                    message: "unavailable".to_owned(),
                });
            }
            self.puts.lock().unwrap().push((
                bucket.to_owned(),
                key.to_owned(),
                content_type.map(str::to_owned),
            ));
            Ok(())
        }
    }

    fn config() -> ObjectStorageConfig {
        ObjectStorageConfig {
            bucket: "catcollector".to_owned(),
            base_url: "https://s3.us-east-1.amazonaws.com/".to_owned(),
            endpoint: "https://s3.us-east-1.amazonaws.com".to_owned(),
            token: None,
        }
    }

    fn upload(name: &str) -> PhotoUpload {
        PhotoUpload {
            file_name: name.to_owned(),
            content_type: Some("image/png".to_owned()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    async fn cat(store: &InMemoryStore) -> CatId {
        let new_cat = NewCat::parse("Lolo", "tabby", "", "3").unwrap();
        store.create_cat(&new_cat, None).await.unwrap().id
    }

    #[tokio::test]
    async fn test_upload_records_photo() {
        let store = InMemoryStore::new();
        let storage = FakeStorage::default();
        let config = config();
        let cat_id = cat(&store).await;
        let service = PhotoService::new(&store, &storage, &config);

        let photo = service
            .add_photo(OwnerScope::All, cat_id, Some(upload("lolo.png")), FailurePolicy::Silent)
            .await
            .unwrap()
            .unwrap();

        let puts = storage.puts.lock().unwrap().clone();
        assert_eq!(puts.len(), 1);
        let (bucket, key, content_type) = &puts[0];
        assert_eq!(bucket, "catcollector");
        assert!(key.ends_with(".png"));
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(
            photo.url,
            format!("https://s3.us-east-1.amazonaws.com/catcollector/{key}")
        );
        assert_eq!(store.list_photos(cat_id).await.unwrap(), vec![photo]);
    }

    #[tokio::test]
    async fn test_missing_file_is_noop() {
        let store = InMemoryStore::new();
        let storage = FakeStorage::default();
        let config = config();
        let cat_id = cat(&store).await;
        let service = PhotoService::new(&store, &storage, &config);

        for upload in [None, Some(upload(""))] {
            let photo = service
                .add_photo(OwnerScope::All, cat_id, upload, FailurePolicy::Surface)
                .await
                .unwrap();
            assert!(photo.is_none());
        }
        assert!(storage.puts.lock().unwrap().is_empty());
        assert!(store.list_photos(cat_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_policy() {
        let store = InMemoryStore::new();
        let storage = FakeStorage {
            fail: true,
            ..FakeStorage::default()
        };
        let config = config();
        let cat_id = cat(&store).await;
        let service = PhotoService::new(&store, &storage, &config);

        let photo = service
            .add_photo(OwnerScope::All, cat_id, Some(upload("a.jpg")), FailurePolicy::Silent)
            .await
            .unwrap();
        assert!(photo.is_none());

        let err = service
            .add_photo(OwnerScope::All, cat_id, Some(upload("a.jpg")), FailurePolicy::Surface)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));
        assert!(store.list_photos(cat_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hostile_file_name_keeps_url_clean() {
        let store = InMemoryStore::new();
        let storage = FakeStorage::default();
        let config = config();
        let cat_id = cat(&store).await;
        let service = PhotoService::new(&store, &storage, &config);

        let long_name = format!("photo.{}", "j".repeat(200));
        for name in ["x.png?acl=public-read", "evil./nested/path", long_name.as_str()] {
            let photo = service
                .add_photo(OwnerScope::All, cat_id, Some(upload(name)), FailurePolicy::Surface)
                .await
                .unwrap()
                .unwrap();
            assert!(!photo.url.contains('?'));
            assert!(photo.url.chars().count() <= URL_MAX_CHARS);
        }

        let puts = storage.puts.lock().unwrap().clone();
        assert!(puts.iter().all(|(_, key, _)| !key.contains(['/', '?', '#', ' '])));
    }

    #[tokio::test]
    async fn test_overlong_url_follows_policy() {
        let store = InMemoryStore::new();
        let storage = FakeStorage::default();
        let config = ObjectStorageConfig {
            bucket: "b".repeat(URL_MAX_CHARS),
            ..config()
        };
        let cat_id = cat(&store).await;
        let service = PhotoService::new(&store, &storage, &config);

        let photo = service
            .add_photo(OwnerScope::All, cat_id, Some(upload("a.jpg")), FailurePolicy::Silent)
            .await
            .unwrap();
        assert!(photo.is_none());

        let err = service
            .add_photo(OwnerScope::All, cat_id, Some(upload("a.jpg")), FailurePolicy::Surface)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(storage.puts.lock().unwrap().is_empty());
    }
}
