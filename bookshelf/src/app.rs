use std::sync::Arc;

use axum::extract::FromRef;
use shelf_axum::{ShelfApp, UploadLimits};
use shelf_blob::BlobStore;
use shelf_core::BookStore;

use crate::handlers;
use crate::render::Renderer;

/// Everything the handlers need, passed in explicitly.
#[derive(Clone)]
pub struct BookshelfState {
    pub books: Arc<dyn BookStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub renderer: Arc<dyn Renderer>,
    pub page_size: usize,
    pub upload_limits: UploadLimits,
}

impl FromRef<BookshelfState> for UploadLimits {
    fn from_ref(state: &BookshelfState) -> Self {
        state.upload_limits
    }
}

/// Book routes plus `/health`, without identity or tracing layers.
pub fn bookshelf_app(ax: ShelfApp, state: BookshelfState) -> ShelfApp {
    ax.merge(handlers::routes(state))
        .use_get("/health", || async { "ok" })
}
