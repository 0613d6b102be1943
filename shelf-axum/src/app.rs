use std::path::Path;
use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use shelf_core::ShelfConfig;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::identity::{identify, IdentityResolver};

/// Router plus the configuration it was built from.
#[derive(Clone)]
pub struct ShelfApp {
    pub config: Arc<ShelfConfig>,
    pub router: Router<()>,
}

impl ShelfApp {
    pub fn new(config: ShelfConfig) -> Self {
        Self {
            config: Arc::new(config),
            router: Router::new(),
        }
    }

    /// Add routes at the top level.
    pub fn merge(mut self, router: Router<()>) -> Self {
        self.router = self.router.merge(router);
        self
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Serve the files under `dir` at `path`.
    pub fn serve_dir<D: AsRef<Path>>(mut self, path: &str, dir: D) -> Self {
        self.router = self.router.nest_service(path, ServeDir::new(dir));
        self
    }

    /// Resolve the current user on every request.
    pub fn with_identity(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.router = self
            .router
            .layer(axum::middleware::from_fn_with_state(resolver, identify));
        self
    }

    /// Request tracing and `x-request-id` on every response (kept when the
    /// client sends one). Apply last so it wraps everything else.
    pub fn with_request_tracing(mut self) -> Self {
        self.router = self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get_string(key)
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
