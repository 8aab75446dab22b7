use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::{stream, StreamExt};
use google_cloud_storage::client::Client as GcsClient;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult};

/// Blob storage for uploaded media. Returns the public URL of the stored
/// object.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> ServiceResult<String>;
}

/// Writes objects below a directory that is served at `base_url`.
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> ServiceResult<String> {
        let relative = Path::new(key);
        let contained = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            return Err(ServiceError::Storage(format!("Refusing to store outside the media root: {key}")));
        }
        let path = self.root.join(relative);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ServiceError::Storage(format!("Failed to store {key}: {e}")))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ServiceError::Storage(format!("Failed to store {key}: {e}")))?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

pub struct GcsMediaStore {
    client: GcsClient,
    bucket: String,
}

impl GcsMediaStore {
    pub fn new(client: GcsClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl MediaStore for GcsMediaStore {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> ServiceResult<String> {
        let upload_type = UploadType::Simple(Media {
            name: key.to_string().into(),
            content_type: content_type.to_string().into(),
            content_length: Some(data.len() as u64),
        });
        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                data,
                &upload_type,
            )
            .await
            .map_err(|e| ServiceError::Storage(format!("GCS upload of {key} failed: {e}")))?;
        Ok(format!("https://storage.googleapis.com/{}/{}", self.bucket, key))
    }
}

/// One file taken from a multipart request.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadFailure {
    pub file_name: String,
    pub message: String,
}

/// Object key for an upload: a fresh name that keeps a sanitised extension.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    let name = uuid::Uuid::new_v4();
    match extension {
        Some(ext) => format!("{prefix}/{name}.{ext}"),
        None => format!("{prefix}/{name}"),
    }
}

/// Uploads `files` with at most `concurrency` transfers in flight. Once
/// `cancel` fires, transfers that have not finished are abandoned. Files that
/// were stored stay stored whatever happens to the others.
pub async fn upload_all(
    store: Arc<dyn MediaStore>,
    prefix: &str,
    files: Vec<UploadFile>,
    concurrency: usize,
    cancel: CancellationToken,
) -> (Vec<StoredFile>, Vec<UploadFailure>) {
    let outcomes: Vec<Result<StoredFile, UploadFailure>> = stream::iter(files)
        .map(|file| {
            let store = store.clone();
            let cancel = cancel.clone();
            let key = object_key(prefix, &file.file_name);
            async move {
                let UploadFile {
                    file_name,
                    content_type,
                    data,
                } = file;
                let size_bytes = data.len();
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err("Upload cancelled".to_string()),
                    stored = store.put(&key, &content_type, data) => stored.map_err(|e| e.to_string()),
                };
                match outcome {
                    Ok(url) => Ok(StoredFile {
                        file_name,
                        content_type,
                        size_bytes,
                        url,
                    }),
                    Err(message) => Err(UploadFailure { file_name, message }),
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut stored = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(file) => {
                crate::metrics::increment_uploads("stored");
                stored.push(file);
            }
            Err(failure) => {
                crate::metrics::increment_uploads("failed");
                tracing::warn!(file_name = %failure.file_name, error = %failure.message, "upload failed");
                failed.push(failure);
            }
        }
    }
    (stored, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct SlowStore {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MediaStore for SlowStore {
        async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> ServiceResult<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if data.as_ref() == b"bad" {
                return Err(ServiceError::Storage(format!("rejected {key}")));
            }
            Ok(format!("mem://{key}"))
        }
    }

    fn file(name: &str, body: &'static [u8]) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(body),
        }
    }

    #[tokio::test]
    async fn never_exceeds_the_concurrency_bound() {
        let store = Arc::new(SlowStore::default());
        let files = (0..8).map(|i| file(&format!("{i}.png"), b"ok")).collect();
        let (stored, failed) =
            upload_all(store.clone(), "listings/l1", files, 3, CancellationToken::new()).await;
        assert_eq!(stored.len(), 8);
        assert!(failed.is_empty());
        assert!(store.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn one_failure_does_not_undo_the_others() {
        let store = Arc::new(SlowStore::default());
        let files = vec![file("a.png", b"ok"), file("b.png", b"bad"), file("c.png", b"ok")];
        let (stored, failed) =
            upload_all(store, "listings/l1", files, 2, CancellationToken::new()).await;
        assert_eq!(stored.len(), 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].file_name, "b.png");
    }

    #[tokio::test]
    async fn cancelled_batch_stores_nothing() {
        let store = Arc::new(SlowStore::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (stored, failed) =
            upload_all(store, "p", vec![file("a.png", b"ok")], 2, cancel).await;
        assert!(stored.is_empty());
        assert_eq!(failed[0].message, "Upload cancelled");
    }

    #[test]
    fn object_keys_keep_a_clean_extension() {
        assert!(object_key("listings/l1", "Photo.JPG").ends_with(".jpg"));
        assert!(object_key("listings/l1", "photo").starts_with("listings/l1/"));
        assert!(!object_key("p", "evil.p/hp").contains("hp"));
    }

    #[tokio::test]
    async fn local_store_stays_inside_its_root() {
        let root = std::env::temp_dir().join(format!("schoolhub-media-{}", uuid::Uuid::new_v4()));
        let store = LocalMediaStore::new(&root, "/media");

        for key in ["../outside.png", "listings/../../outside.png", "/abs.png", ""] {
            let err = store
                .put(key, "image/png", Bytes::from_static(b"x"))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Storage(_)), "{key}");
        }
        assert!(!root.parent().unwrap().join("outside.png").exists());

        let url = store
            .put("listings/l1/a.png", "image/png", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert_eq!(url, "/media/listings/l1/a.png");
        assert!(root.join("listings/l1/a.png").exists());
    }
}
