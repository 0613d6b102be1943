use std::path::Path;

use async_trait::async_trait;
use chrono::Datelike;

use crate::BlobResult;

/// Storage for uploaded files.
///
/// A store takes a file that already sits on local disk (typically an
/// upload spooled by the HTTP layer) and hands back a reference the
/// application can persist and later pass to [`BlobStore::delete_file`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Copy the file at `path` into the store and return its reference.
    async fn store_file(&self, path: &Path, content_type: &str) -> BlobResult<String>;

    /// Delete a blob previously returned by `store_file`.
    async fn delete_file(&self, reference: &str) -> BlobResult<()>;
}

/// Strategy for generating blob keys
pub trait BlobKeyStrategy: Send + Sync {
    fn object_key(&self, content_type: &str) -> String;
}

/// Default key strategy: year/month/uuid.ext
#[derive(Debug, Clone)]
pub struct DefaultKeyStrategy;

impl BlobKeyStrategy for DefaultKeyStrategy {
    fn object_key(&self, content_type: &str) -> String {
        let now = chrono::Utc::now();

        format!(
            "{:04}/{:02}/{}.{}",
            now.year(),
            now.month(),
            uuid::Uuid::new_v4().simple(),
            extension_for(content_type)
        )
    }
}

/// File extension for the common image types, `bin` for anything else.
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/bmp" => "bmp",
        "image/avif" => "avif",
        _ => "bin",
    }
}

/// Reject keys that would escape the store root.
pub(crate) fn validate_key(key: &str) -> BlobResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");

    if bad {
        return Err(crate::BlobError::invalid(format!("Invalid blob key: {key}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_ignores_parameters_and_case() {
        assert_eq!(extension_for("image/PNG"), "png");
        assert_eq!(extension_for("image/jpeg; charset=binary"), "jpg");
        assert_eq!(extension_for("application/pdf"), "bin");
    }

    #[test]
    fn default_keys_are_dated_and_unique() {
        let keys = DefaultKeyStrategy;
        let a = keys.object_key("image/png");
        let b = keys.object_key("image/png");

        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        assert_eq!(a.split('/').count(), 3);
        assert!(validate_key(&a).is_ok());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("2024//a.png").is_err());
        assert!(validate_key("/abs.png").is_err());
        assert!(validate_key("").is_err());
    }
}
