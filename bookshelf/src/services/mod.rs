use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use shelf_blob::{BlobConfig, BlobStore, LocalBlobStore, MemoryBlobStore};
use shelf_core::{BookStore, ShelfConfig};

pub mod adapters;

pub use adapters::{MemoryBookStore, SqliteBookStore};

/// The collaborators the handlers are built on.
pub struct Services {
    pub books: Arc<dyn BookStore>,
    pub blobs: Arc<dyn BlobStore>,
    /// Directory to serve under the public upload URL, for local storage.
    pub uploads_dir: Option<PathBuf>,
}

pub fn configure(config: &ShelfConfig) -> Result<Services> {
    let books: Arc<dyn BookStore> = match config.get("bookshelf.backend").unwrap_or("memory") {
        "sqlite" => {
            let path = config.get("bookshelf.database").unwrap_or("bookshelf.db");
            tracing::info!(path, "using sqlite book store");
            Arc::new(SqliteBookStore::open(path)?)
        }
        _ => {
            tracing::info!("using in-memory book store");
            Arc::new(MemoryBookStore::new())
        }
    };

    let blob_config = BlobConfig::default()
        .with_max_blob_bytes(crate::config::max_upload_bytes(config)?)
        .with_public_url(config.get("storage.public_url").unwrap_or("/uploads"));

    let mut uploads_dir = None;
    let blobs: Arc<dyn BlobStore> = match config.get("storage.backend").unwrap_or("local") {
        "memory" => Arc::new(MemoryBlobStore::new(blob_config)),
        _ => {
            let dir = PathBuf::from(config.get("storage.dir").unwrap_or("uploads"));
            std::fs::create_dir_all(&dir)?;
            tracing::info!(dir = %dir.display(), "storing cover images on disk");
            uploads_dir = Some(dir.clone());
            Arc::new(LocalBlobStore::new(dir, blob_config))
        }
    };

    Ok(Services {
        books,
        blobs,
        uploads_dir,
    })
}
