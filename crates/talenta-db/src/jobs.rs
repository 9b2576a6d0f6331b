//! Job repository implementation.
//!
//! The claim is an atomic `UPDATE ... FOR UPDATE SKIP LOCKED`, so the
//! QUEUED→PROCESSING transition is durable before the worker sees the job,
//! and a second worker instance could never claim the same row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use talenta_core::{
    Error, Evaluation, EvaluationJob, JobRepository, JobStatus, Result,
};

use crate::evaluations::parse_evaluation_row;

/// PostgreSQL implementation of JobRepository.
pub struct PgJobRepository {
    pool: Pool<Postgres>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_job_row(row: &sqlx::postgres::PgRow) -> EvaluationJob {
        let status: String = row.get("status");
        EvaluationJob {
            id: row.get("id"),
            job_title: row.get("job_title"),
            cv_file_id: row.get("cv_file_id"),
            report_file_id: row.get("report_file_id"),
            status: status.parse().unwrap_or(JobStatus::Queued),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

const JOB_COLUMNS: &str = "id, job_title, cv_file_id, report_file_id, status, \
                           error_message, created_at, started_at, completed_at";

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(
        &self,
        job_title: &str,
        cv_file_id: Uuid,
        report_file_id: Uuid,
    ) -> Result<EvaluationJob> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO evaluation_job (id, job_title, cv_file_id, report_file_id, status, created_at)
             VALUES ($1, $2, $3, $4, 'queued', $5)
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(job_title)
        .bind(cv_file_id)
        .bind(report_file_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_job_row(&row))
    }

    async fn claim_next(&self) -> Result<Option<EvaluationJob>> {
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "UPDATE evaluation_job
             SET status = 'processing', started_at = $1
             WHERE id = (
                 SELECT id FROM evaluation_job
                 WHERE status = 'queued'
                 ORDER BY created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_job_row))
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE evaluation_job
             SET status = 'completed', completed_at = $1
             WHERE id = $2 AND status = 'processing'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE evaluation_job
             SET status = 'failed', completed_at = $1, error_message = $2
             WHERE id = $3 AND status = 'processing'",
        )
        .bind(now)
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationJob>> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM evaluation_job WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_job_row))
    }

    async fn get_with_evaluation(
        &self,
        id: Uuid,
    ) -> Result<Option<(EvaluationJob, Option<Evaluation>)>> {
        let job = match self.get(id).await? {
            Some(job) => job,
            None => return Ok(None),
        };

        let eval_row = sqlx::query(
            "SELECT id, job_id, cv_match_rate, cv_feedback, project_score,
                    project_feedback, overall_summary, raw_cv_scores,
                    raw_project_scores, created_at
             FROM evaluation WHERE job_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Some((job, eval_row.as_ref().map(parse_evaluation_row))))
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM evaluation_job WHERE status = 'queued'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(count.0)
    }
}
