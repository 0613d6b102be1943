//! # shelf-blob: storage for uploaded cover images
//!
//! ```text
//! ┌─────────────────┐
//! │  HTTP handlers  │  ← spool uploads to a temp file
//! ├─────────────────┤
//! │    BlobStore    │  ← copy into storage, hand back a reference
//! └─────────────────┘
//! ```
//!
//! Handlers persist the reference on the book record and give it back to
//! [`BlobStore::delete_file`] when the book goes away.
//!
//! ```rust
//! use shelf_blob::prelude::*;
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! # let dir = std::env::temp_dir().join(format!("shelf-blob-doc-{}", std::process::id()));
//! # tokio::fs::create_dir_all(&dir).await?;
//! # let upload = dir.join("upload");
//! # tokio::fs::write(&upload, b"png").await?;
//! let store = LocalBlobStore::new(dir.join("covers"), BlobConfig::default());
//! let reference = store.store_file(&upload, "image/png").await?;
//! store.delete_file(&reference).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod local;
mod memory;
pub mod store;

pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use local::LocalBlobStore;
pub use memory::{MemoryBlobStore, StoredBlob};
pub use store::{extension_for, BlobKeyStrategy, BlobStore, DefaultKeyStrategy};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{BlobConfig, BlobError, BlobResult, BlobStore, LocalBlobStore, MemoryBlobStore};
}
