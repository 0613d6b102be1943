use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::store::validate_key;
use crate::{BlobConfig, BlobError, BlobKeyStrategy, BlobResult, BlobStore, DefaultKeyStrategy};

/// Blob store backed by a directory on local disk.
///
/// References are `{public_url}/{key}`, so the directory can be served
/// statically under `public_url`.
pub struct LocalBlobStore {
    root: PathBuf,
    keys: Arc<dyn BlobKeyStrategy>,
    config: BlobConfig,
}

impl LocalBlobStore {
    pub fn new<P: Into<PathBuf>>(root: P, config: BlobConfig) -> Self {
        Self {
            root: root.into(),
            keys: Arc::new(DefaultKeyStrategy),
            config,
        }
    }

    fn reference_for(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_url, key)
    }

    fn key_for<'a>(&self, reference: &'a str) -> BlobResult<&'a str> {
        let key = reference
            .strip_prefix(self.config.public_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                BlobError::invalid(format!("Reference not owned by this store: {reference}"))
            })?;
        validate_key(key)?;
        Ok(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store_file(&self, path: &Path, content_type: &str) -> BlobResult<String> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.config.max_blob_bytes {
            return Err(BlobError::invalid(format!(
                "Blob size {} exceeds maximum {}",
                size, self.config.max_blob_bytes
            )));
        }

        let key = self.keys.object_key(content_type);
        validate_key(&key)?;

        let dest = self.root.join(&key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(path, &dest).await?;

        tracing::debug!(key = %key, size, content_type, "stored blob");
        Ok(self.reference_for(&key))
    }

    async fn delete_file(&self, reference: &str) -> BlobResult<()> {
        let key = self.key_for(reference)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => {
                tracing::debug!(key = %key, "deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::not_found(reference))
            }
            Err(e) => Err(e.into()),
        }
    }
}
