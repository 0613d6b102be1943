use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{BlobConfig, BlobError, BlobKeyStrategy, BlobResult, BlobStore, DefaultKeyStrategy};

const SCHEME: &str = "memory://";

/// A blob held by [`MemoryBlobStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: String,
    pub data: Bytes,
}

/// Process-local blob store, handy for tests and throwaway instances.
///
/// References look like `memory://2024/05/<uuid>.png`.
#[derive(Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
    keys: Arc<dyn BlobKeyStrategy>,
    config: BlobConfig,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(BlobConfig::default())
    }
}

impl MemoryBlobStore {
    pub fn new(config: BlobConfig) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            keys: Arc::new(DefaultKeyStrategy),
            config,
        }
    }

    pub async fn get(&self, reference: &str) -> Option<StoredBlob> {
        let key = reference.strip_prefix(SCHEME)?;
        self.blobs.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store_file(&self, path: &Path, content_type: &str) -> BlobResult<String> {
        let data = tokio::fs::read(path).await?;
        if data.len() as u64 > self.config.max_blob_bytes {
            return Err(BlobError::invalid(format!(
                "Blob size {} exceeds maximum {}",
                data.len(),
                self.config.max_blob_bytes
            )));
        }

        let key = self.keys.object_key(content_type);
        self.blobs.write().await.insert(
            key.clone(),
            StoredBlob {
                content_type: content_type.to_string(),
                data: Bytes::from(data),
            },
        );
        Ok(format!("{SCHEME}{key}"))
    }

    async fn delete_file(&self, reference: &str) -> BlobResult<()> {
        let key = reference
            .strip_prefix(SCHEME)
            .ok_or_else(|| BlobError::invalid(format!("Not a memory reference: {reference}")))?;

        self.blobs
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_content_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.gif");
        tokio::fs::write(&path, b"GIF89a").await.unwrap();

        let store = MemoryBlobStore::default();
        let reference = store.store_file(&path, "image/gif").await.unwrap();
        assert!(reference.starts_with("memory://"));

        let blob = store.get(&reference).await.unwrap();
        assert_eq!(blob.content_type, "image/gif");
        assert_eq!(&blob.data[..], b"GIF89a");

        store.delete_file(&reference).await.unwrap();
        assert!(store.get(&reference).await.is_none());
        assert!(matches!(
            store.delete_file(&reference).await,
            Err(BlobError::NotFound { .. })
        ));
    }
}
