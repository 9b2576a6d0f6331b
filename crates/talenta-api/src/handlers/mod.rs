//! HTTP request handlers.

pub mod evaluate;
pub mod result;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use talenta_db::Database;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub upload_dir: Arc<PathBuf>,
}

/// Error wrapper mapping core errors onto HTTP responses.
pub struct ApiError(pub talenta_core::Error);

impl From<talenta_core::Error> for ApiError {
    fn from(e: talenta_core::Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use talenta_core::Error;

        let (status, message) = match &self.0 {
            Error::NotFound(_) | Error::FileNotFound(_) | Error::JobNotFound(_) => {
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => {
                error!(error = %self.0, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Liveness endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
