//! Evaluation submission handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use talenta_core::{Error, FileRepository, JobRepository, JobStatus};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub job_title: String,
    pub cv_id: Uuid,
    pub report_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub id: Uuid,
    pub status: JobStatus,
}

/// `POST /evaluate` — verifies both documents exist, creates a queued job,
/// and returns its id synchronously. The worker picks the job up on its
/// next polling cycle.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.job_title.trim().is_empty() {
        return Err(Error::InvalidInput("job_title is required".to_string()).into());
    }

    if !state.db.files.exists(req.cv_id).await? {
        return Err(Error::FileNotFound(req.cv_id).into());
    }
    if !state.db.files.exists(req.report_id).await? {
        return Err(Error::FileNotFound(req.report_id).into());
    }

    let job = state
        .db
        .jobs
        .create(&req.job_title, req.cv_id, req.report_id)
        .await?;

    info!(
        job_id = %job.id,
        job_title = %job.job_title,
        "Evaluation job queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(EvaluateResponse {
            id: job.id,
            status: job.status,
        }),
    ))
}
