//! Evaluation repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use talenta_core::{CreateEvaluationRequest, Error, Evaluation, EvaluationRepository, Result};

/// PostgreSQL implementation of EvaluationRepository.
pub struct PgEvaluationRepository {
    pool: Pool<Postgres>,
}

impl PgEvaluationRepository {
    /// Create a new PgEvaluationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Parse an evaluation row into an Evaluation struct.
pub(crate) fn parse_evaluation_row(row: &sqlx::postgres::PgRow) -> Evaluation {
    Evaluation {
        id: row.get("id"),
        job_id: row.get("job_id"),
        cv_match_rate: row.get("cv_match_rate"),
        cv_feedback: row.get("cv_feedback"),
        project_score: row.get("project_score"),
        project_feedback: row.get("project_feedback"),
        overall_summary: row.get("overall_summary"),
        raw_cv_scores: row.get("raw_cv_scores"),
        raw_project_scores: row.get("raw_project_scores"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl EvaluationRepository for PgEvaluationRepository {
    async fn create(&self, job_id: Uuid, req: CreateEvaluationRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO evaluation (id, job_id, cv_match_rate, cv_feedback,
                                     project_score, project_feedback, overall_summary,
                                     raw_cv_scores, raw_project_scores, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(job_id)
        .bind(req.cv_match_rate)
        .bind(&req.cv_feedback)
        .bind(req.project_score)
        .bind(&req.project_feedback)
        .bind(&req.overall_summary)
        .bind(&req.raw_cv_scores)
        .bind(&req.raw_project_scores)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get_for_job(&self, job_id: Uuid) -> Result<Option<Evaluation>> {
        let row = sqlx::query(
            "SELECT id, job_id, cv_match_rate, cv_feedback, project_score,
                    project_feedback, overall_summary, raw_cv_scores,
                    raw_project_scores, created_at
             FROM evaluation WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(parse_evaluation_row))
    }
}
