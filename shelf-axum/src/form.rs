//! HTML form submissions, with or without file uploads.
//!
//! `multipart/form-data` bodies are parsed with `multer`; file fields are
//! streamed chunk by chunk to a temp file so large covers never sit in
//! memory. `application/x-www-form-urlencoded` bodies go through
//! [`axum::Form`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::{FromRef, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use shelf_core::errors::ShelfError;
use tokio::io::AsyncWriteExt;

use crate::ShelfAxumError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Leading bytes kept for content sniffing.
const SNIFF_BYTES: usize = 8 * 1024;

/// Size limits applied while reading a submission.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Files larger than this are kept as invalid uploads, not rejected.
    pub max_file_bytes: u64,
    /// A body larger than this rejects the whole request with 413.
    pub max_body_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,  // 10MB
            max_body_bytes: 12 * 1024 * 1024,  // file + text fields
        }
    }
}

impl UploadLimits {
    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self.max_body_bytes = self.max_body_bytes.max(bytes + 1024 * 1024);
        self
    }
}

/// An uploaded file spooled to a temp file.
///
/// The temp file is removed when this value is dropped.
#[derive(Debug)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: Option<String>,
    /// Type declared by the client for this part.
    pub content_type: Option<String>,
    /// Type recognized from the file's leading bytes.
    pub detected_type: Option<String>,
    pub size: u64,
    /// False when the upload was cut short (e.g. over the file size limit).
    pub complete: bool,
    path: PathBuf,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Present, non-empty and fully received.
    pub fn is_valid(&self) -> bool {
        self.complete && self.size > 0
    }

    /// The sniffed type, else the declared one, else `application/octet-stream`.
    pub fn mime_type(&self) -> &str {
        self.detected_type
            .as_deref()
            .or_else(|| self.content_type.as_deref().filter(|ct| !ct.trim().is_empty()))
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        // Inside a runtime the unlink goes to the blocking pool.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_spooled(&path));
            }
            Err(_) => remove_spooled(&path),
        }
    }
}

fn remove_spooled(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove spooled upload");
        }
    }
}

/// Text fields and uploaded files of a submitted form.
#[derive(Debug, Default)]
pub struct FormSubmission {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormSubmission {
    /// The named upload, only if it passes [`UploadedFile::is_valid`].
    pub fn valid_file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).filter(|f| f.is_valid())
    }
}

impl<S> FromRequest<S> for FormSubmission
where
    S: Send + Sync,
    UploadLimits: FromRef<S>,
{
    type Rejection = ShelfAxumError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("multipart/form-data") {
            let limits = UploadLimits::from_ref(state);
            return read_multipart(req, &content_type, limits).await;
        }

        let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ShelfError::bad_request("Failed to parse the submitted form")
                    .with_errors(serde_json::json!({"_form": [rejection.body_text()]}))
                    .into_anyhow()
            })?;

        Ok(Self {
            fields,
            files: HashMap::new(),
        })
    }
}

fn map_multer_error(e: multer::Error) -> ShelfAxumError {
    match e {
        multer::Error::StreamSizeExceeded { limit } => {
            ShelfError::payload_too_large(format!("Request body exceeds {limit} bytes")).into_anyhow()
        }
        other => ShelfError::bad_request(format!("Failed to parse multipart data: {other}")).into_anyhow(),
    }
    .into()
}

async fn read_multipart(
    req: Request,
    content_type: &str,
    limits: UploadLimits,
) -> Result<FormSubmission, ShelfAxumError> {
    let boundary = multer::parse_boundary(content_type).map_err(map_multer_error)?;
    let constraints = multer::Constraints::new()
        .size_limit(multer::SizeLimit::new().whole_stream(limits.max_body_bytes));
    let mut multipart = multer::Multipart::with_constraints(
        req.into_body().into_data_stream(),
        boundary,
        constraints,
    );

    let mut out = FormSubmission::default();
    while let Some(field) = multipart.next_field().await.map_err(map_multer_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name.is_empty() {
            continue;
        }

        if field.file_name().is_none() {
            let value = field.text().await.map_err(map_multer_error)?;
            out.fields.insert(name, value);
            continue;
        }

        let file = spool_file(name.clone(), field, limits.max_file_bytes).await?;
        out.files.insert(name, file);
    }

    Ok(out)
}

async fn spool_file(
    field_name: String,
    mut field: multer::Field<'static>,
    max_file_bytes: u64,
) -> Result<UploadedFile, ShelfAxumError> {
    let file_name = field.file_name().map(|f| f.to_string());
    let content_type = field.content_type().map(|ct| ct.to_string());
    let path = std::env::temp_dir().join(format!("shelf_upload_{}", uuid::Uuid::new_v4().simple()));

    // Owns the temp file from here on, so every error path cleans up.
    let mut upload = UploadedFile {
        field_name,
        file_name,
        content_type,
        detected_type: None,
        size: 0,
        complete: true,
        path,
    };
    let mut head = Vec::new();

    let mut temp_file = tokio::fs::File::create(&upload.path).await?;
    while let Some(chunk) = field.chunk().await.map_err(map_multer_error)? {
        if !upload.complete {
            continue;
        }
        if upload.size + chunk.len() as u64 > max_file_bytes {
            tracing::warn!(
                field = %upload.field_name,
                limit = max_file_bytes,
                "upload exceeds file size limit, discarding"
            );
            upload.complete = false;
            continue;
        }
        if head.len() < SNIFF_BYTES {
            let take = (SNIFF_BYTES - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }
        temp_file.write_all(&chunk).await?;
        upload.size += chunk.len() as u64;
    }
    temp_file.flush().await?;

    // Never trust the declared type alone; it picks the stored extension.
    upload.detected_type = infer::get(&head).map(|t| t.mime_type().to_string());

    tracing::debug!(
        field = %upload.field_name,
        size = upload.size,
        complete = upload.complete,
        mime = upload.mime_type(),
        "spooled upload"
    );
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spooled(size: u64, complete: bool, content_type: Option<&str>) -> UploadedFile {
        sniffed(size, complete, content_type, None)
    }

    fn sniffed(
        size: u64,
        complete: bool,
        content_type: Option<&str>,
        detected_type: Option<&str>,
    ) -> UploadedFile {
        let path = std::env::temp_dir().join(format!("shelf_test_{}", uuid::Uuid::new_v4().simple()));
        std::fs::write(&path, vec![0u8; size as usize]).unwrap();
        UploadedFile {
            field_name: "image".to_string(),
            file_name: Some("cover.png".to_string()),
            content_type: content_type.map(|s| s.to_string()),
            detected_type: detected_type.map(|s| s.to_string()),
            size,
            complete,
            path,
        }
    }

    #[test]
    fn empty_or_truncated_uploads_are_invalid() {
        assert!(spooled(3, true, None).is_valid());
        assert!(!spooled(0, true, None).is_valid());
        assert!(!spooled(3, false, None).is_valid());
    }

    #[test]
    fn mime_type_falls_back_to_octet_stream() {
        assert_eq!(spooled(1, true, Some("image/png")).mime_type(), "image/png");
        assert_eq!(spooled(1, true, None).mime_type(), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn sniffed_type_wins_over_declared_type() {
        let file = sniffed(1, true, Some("image/png"), Some("image/jpeg"));
        assert_eq!(file.mime_type(), "image/jpeg");
    }

    #[test]
    fn dropping_an_upload_removes_its_temp_file() {
        let file = spooled(2, true, None);
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropping_inside_the_runtime_removes_the_file_off_thread() {
        let file = spooled(2, true, None);
        let path = file.path().to_path_buf();
        drop(file);

        for _ in 0..100 {
            if !path.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("spooled upload {} was not removed", path.display());
    }
}
