//! Bookshelf: list, add, view, edit and delete books with optional cover
//! images.

pub mod app;
pub mod config;
pub mod handlers;
pub mod render;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use shelf_axum::{Anonymous, IdentityResolver, JwtIdentity, ShelfApp};
use shelf_core::ShelfConfig;

pub use app::BookshelfState;
pub use render::{Renderer, TemplateRenderer};

/// Build the application from configuration.
pub fn build(config: ShelfConfig) -> Result<ShelfApp> {
    let svcs = services::configure(&config)?;

    let state = BookshelfState {
        books: svcs.books,
        blobs: svcs.blobs,
        renderer: Arc::new(TemplateRenderer::new()?),
        page_size: config::page_size(&config)?,
        upload_limits: config::upload_limits(&config)?,
    };

    let identity: Arc<dyn IdentityResolver> = match config.get("auth.jwt.secret") {
        Some(secret) => Arc::new(JwtIdentity::new(secret)),
        None => {
            tracing::info!("auth.jwt.secret not set, books will not be attributed");
            Arc::new(Anonymous)
        }
    };

    let public_url = config
        .get_string("storage.public_url")
        .unwrap_or_else(|| "/uploads".to_string());

    let mut ax = app::bookshelf_app(ShelfApp::new(config), state);
    if let Some(dir) = svcs.uploads_dir {
        let mount = public_url.trim_end_matches('/');
        if mount.starts_with('/') && mount.len() > 1 {
            ax = ax.serve_dir(mount, dir);
        } else {
            tracing::info!(%public_url, "cover images are served elsewhere");
        }
    }

    Ok(finish(ax, identity))
}

/// Build around ready-made collaborators.
pub fn build_with(
    config: ShelfConfig,
    state: BookshelfState,
    identity: Arc<dyn IdentityResolver>,
) -> ShelfApp {
    finish(app::bookshelf_app(ShelfApp::new(config), state), identity)
}

fn finish(ax: ShelfApp, identity: Arc<dyn IdentityResolver>) -> ShelfApp {
    // Tracing goes last so it wraps the identity layer too.
    ax.with_identity(identity).with_request_tracing()
}
