//! Core data models for talenta.
//!
//! These types are shared across all talenta crates and represent the
//! domain entities of the evaluation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// FILE TYPES
// =============================================================================

/// Kind of uploaded candidate document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Candidate CV
    Cv,
    /// Candidate project report
    ProjectReport,
}

impl DocumentKind {
    /// Database/string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cv",
            DocumentKind::ProjectReport => "project_report",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cv" => Ok(DocumentKind::Cv),
            "project_report" => Ok(DocumentKind::ProjectReport),
            _ => Err(format!("Invalid document kind: {}", s)),
        }
    }
}

/// An uploaded document on disk, referenced by evaluation jobs.
///
/// Immutable once created; existence is checked at job submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub path: String,
    pub original_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Status of an evaluation job.
///
/// Jobs are created `Queued` and move forward-only:
/// `Queued → Processing → {Completed, Failed}`. No other transition is
/// valid, and there is no automatic retry of a `Failed` job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Database/API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// An evaluation job in the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationJob {
    pub id: Uuid,
    pub job_title: String,
    pub cv_file_id: Uuid,
    pub report_file_id: Uuid,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// EVALUATION TYPES
// =============================================================================

/// A persisted evaluation, tied 1:1 to a completed job.
///
/// Created once by the worker after a successful (or fallback) evaluation;
/// never mutated afterward. Score ranges are documented as [0,1] and [0,5]
/// but stored as the model returned them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub job_id: Uuid,
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
    pub raw_cv_scores: Option<JsonValue>,
    pub raw_project_scores: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Request for persisting a new evaluation.
#[derive(Debug, Clone)]
pub struct CreateEvaluationRequest {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
    pub raw_cv_scores: Option<JsonValue>,
    pub raw_project_scores: Option<JsonValue>,
}

// =============================================================================
// RETRIEVAL TYPES
// =============================================================================

/// Kind of rubric stored in the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricKind {
    /// Criteria for evaluating a CV against a vacancy
    CvRubric,
    /// Criteria for evaluating a project report
    ProjectRubric,
}

impl RubricKind {
    /// Payload filter value used in the vector index.
    pub fn as_str(&self) -> &'static str {
        match self {
            RubricKind::CvRubric => "cv_rubric",
            RubricKind::ProjectRubric => "project_rubric",
        }
    }
}

impl std::fmt::Display for RubricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rubric hit returned from the vector index, ranked by similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricHit {
    pub text: String,
    pub score: f32,
}

/// A rubric point for ingestion into the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricPoint {
    pub id: Uuid,
    pub kind: RubricKind,
    pub slug: String,
    pub text: String,
    pub vector: Vec<f32>,
}

// =============================================================================
// EXTRACTION TYPES
// =============================================================================

/// Text extracted from an uploaded document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}
