//! HTTP server.
//!
//! Assembles the API and health routers with CORS and request tracing, and
//! binds them to the configured address.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{api_routes, health_routes, AppState};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::storage::Storage;

/// HTTP server for the vault API.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Create a server over an open storage handle.
    #[must_use]
    pub fn new(config: ServerConfig, storage: Arc<Storage>) -> Self {
        let router = build_router(&config, AppState::new(storage));
        Self { config, router }
    }

    /// Get the socket address the server binds to.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing).
    #[must_use]
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        info!(
            "qrvault listening on http://{} (API under {})",
            listener.local_addr()?,
            self.config.base_path
        );
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// Build the full router: health at the root, API under `base_path`.
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let api = api_routes(state);
    let router = if config.base_path == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&config.base_path, api)
    };

    router
        .merge(health_routes())
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
