//! Core traits for talenta abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. Every provider
//! client (embedding, vector index, generation) is constructed explicitly
//! and injected; nothing holds a process-global client.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Repository for uploaded candidate documents.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Record an uploaded file and return its id.
    async fn save(
        &self,
        kind: DocumentKind,
        path: &str,
        original_name: Option<&str>,
    ) -> Result<Uuid>;

    /// Fetch a file record by id.
    async fn get(&self, id: Uuid) -> Result<Option<StoredFile>>;

    /// Check whether a file record exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

/// Repository for evaluation jobs.
///
/// The job store is the single source of truth for job state. The worker
/// is the only writer of the `Processing`/`Completed`/`Failed` transitions.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Create a new job in `Queued` state.
    async fn create(
        &self,
        job_title: &str,
        cv_file_id: Uuid,
        report_file_id: Uuid,
    ) -> Result<EvaluationJob>;

    /// Atomically claim the oldest `Queued` job, transitioning it to
    /// `Processing`. Returns `None` when the queue is empty. The transition
    /// is durable before the claimed job is returned.
    async fn claim_next(&self) -> Result<Option<EvaluationJob>>;

    /// Mark a job `Completed`. Only valid after its evaluation has been
    /// durably written.
    async fn mark_completed(&self, id: Uuid) -> Result<()>;

    /// Mark a job `Failed`, recording the error message.
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()>;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> Result<Option<EvaluationJob>>;

    /// Fetch a job together with its evaluation, if one exists.
    async fn get_with_evaluation(
        &self,
        id: Uuid,
    ) -> Result<Option<(EvaluationJob, Option<Evaluation>)>>;

    /// Number of jobs still waiting in `Queued`.
    async fn pending_count(&self) -> Result<i64>;
}

/// Repository for persisted evaluations.
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Persist an evaluation for a completed job. Exactly one evaluation
    /// may exist per job.
    async fn create(&self, job_id: Uuid, req: CreateEvaluationRequest) -> Result<Uuid>;

    /// Fetch the evaluation for a job, if any.
    async fn get_for_job(&self, job_id: Uuid) -> Result<Option<Evaluation>>;
}

// =============================================================================
// EXTRACTION TRAITS
// =============================================================================

/// Extracts plain text from a stored document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text and page count from the file at `path`.
    async fn extract_text(&self, path: &str) -> Result<ExtractedText>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    ///
    /// Vectors longer than [`dimension`](Self::dimension) are truncated to
    /// the expected prefix (prefix-compatible embeddings assumed).
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt, returning the raw model output text.
    ///
    /// Fails with [`Error::Transient`](crate::Error::Transient) when the
    /// provider reports a retryable condition; any other failure, and an
    /// empty response after all extraction strategies, is non-retryable.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// VECTOR INDEX TRAITS
// =============================================================================

/// Vector index holding rubric documents, queried by similarity.
#[async_trait]
pub trait RubricIndex: Send + Sync {
    /// Idempotently provision the rubric collection and its payload
    /// indexes. An offline ingestion concern, not called per request.
    async fn ensure_collection(&self) -> Result<()>;

    /// Search for the most similar rubrics of the given kind, most similar
    /// first.
    async fn search(&self, vector: &[f32], limit: usize, kind: RubricKind)
        -> Result<Vec<RubricHit>>;

    /// Upsert rubric points (ingestion).
    async fn upsert(&self, points: &[RubricPoint]) -> Result<()>;
}
