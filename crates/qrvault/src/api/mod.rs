//! HTTP API for qrvault.
//!
//! Maps the three vault operations onto JSON endpoints:
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | `POST` | `/save` | 201 `{id, content, created_at}` |
//! | `GET` | `/history?user_id=` | 200 `[{id, content, created_at}, ...]` |
//! | `DELETE` | `/history/{record_id}?user_id=` | 200 `{message}` |
//!
//! Failures are reported as `{error}` with the status from
//! [`Error::status_code`].

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::warn;

use crate::error::{Error, Result};
use crate::storage::{Session, Storage};

pub use types::{ErrorResponse, MessageResponse, RecordResponse, SaveRequest, UserQuery};

/// State shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    storage: Arc<Storage>,
}

impl AppState {
    /// Create handler state over an open storage handle.
    #[must_use]
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Run `op` with a fresh storage session on the blocking pool.
    ///
    /// The session is released when `op` returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns whatever `op` returns, or an internal error if the blocking
    /// task could not complete.
    pub async fn with_session<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Session<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let mut session = storage.session()?;
            op(&mut session)
        })
        .await
        .map_err(|err| Error::internal(format!("storage task failed: {err}")))?
    }
}

/// Routes for the vault operations.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/save", post(handlers::save))
        .route("/history", get(handlers::history))
        .route("/history/{record_id}", delete(handlers::delete))
        .with_state(state)
}

/// Liveness route.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_storage_error() {
            warn!(error = %self, "storage operation failed");
        } else if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
