//! Evaluation status and result handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use talenta_core::{Error, Evaluation, JobRepository, JobStatus};

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct ResultBody {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
}

impl From<Evaluation> for ResultBody {
    fn from(eval: Evaluation) -> Self {
        Self {
            cv_match_rate: eval.cv_match_rate,
            cv_feedback: eval.cv_feedback,
            project_score: eval.project_score,
            project_feedback: eval.project_feedback,
            overall_summary: eval.overall_summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultBody>,
}

/// `GET /result/:id` — returns the job status, with the evaluation fields
/// under `result` only once the job has completed. A failed job reports
/// its status with no result payload.
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (job, evaluation) = state
        .db
        .jobs
        .get_with_evaluation(id)
        .await?
        .ok_or(Error::JobNotFound(id))?;

    let result = match job.status {
        JobStatus::Completed => evaluation.map(ResultBody::from),
        _ => None,
    };

    Ok(Json(ResultResponse {
        id: job.id,
        status: job.status,
        result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn evaluation() -> Evaluation {
        Evaluation {
            id: Uuid::nil(),
            job_id: Uuid::nil(),
            cv_match_rate: 0.8,
            cv_feedback: "relevant".to_string(),
            project_score: 4.0,
            project_feedback: "solid".to_string(),
            overall_summary: "hire".to_string(),
            raw_cv_scores: None,
            raw_project_scores: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_completed_response_exposes_result_keys() {
        let response = ResultResponse {
            id: Uuid::nil(),
            status: JobStatus::Completed,
            result: Some(evaluation().into()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["result"]["cv_match_rate"], 0.8);
        assert_eq!(json["result"]["cv_feedback"], "relevant");
        assert_eq!(json["result"]["project_score"], 4.0);
        assert_eq!(json["result"]["project_feedback"], "solid");
        assert_eq!(json["result"]["overall_summary"], "hire");
    }

    #[test]
    fn test_pending_response_has_no_result_key() {
        for status in [JobStatus::Queued, JobStatus::Processing, JobStatus::Failed] {
            let response = ResultResponse {
                id: Uuid::nil(),
                status,
                result: None,
            };
            let json = serde_json::to_value(&response).unwrap();
            assert!(json.get("result").is_none());
        }
    }
}
