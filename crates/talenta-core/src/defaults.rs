//! Default values and tunables for talenta.
//!
//! Constants are grouped by subsystem. Values marked with an environment
//! variable can be overridden at process start.

// ─── Worker ────────────────────────────────────────────────────────────────

/// Polling interval when the queue is empty (milliseconds).
/// Override: `JOB_POLL_INTERVAL_MS`.
pub const JOB_POLL_INTERVAL_MS: u64 = 5000;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 64;

// ─── Embeddings / vector index ─────────────────────────────────────────────

/// Embedding vector dimensionality stored in the rubric index. Providers
/// returning longer vectors are truncated to this prefix.
/// Override: `GEMINI_EMBED_DIM`.
pub const EMBED_DIMENSION: usize = 768;

/// Number of rubric hits retrieved per document kind.
pub const RUBRIC_TOP_K: usize = 3;

/// Separator between retrieved rubric snippets in the assembled guidance.
pub const RUBRIC_SEPARATOR: &str = "\n\n---\n\n";

/// Default Qdrant endpoint. Override: `QDRANT_URL`.
pub const QDRANT_URL: &str = "http://localhost:6333";

/// Default rubric collection name. Override: `QDRANT_COLLECTION`.
pub const QDRANT_COLLECTION: &str = "rubrics";

/// CV rubric guidance used when the index has no relevant match.
pub const DEFAULT_CV_RUBRIC: &str = "Evaluate the CV based on: clarity of \
targeted role, structure, relevance to the vacancy, quantified impact, and \
technical skills.";

/// Project rubric guidance used when the index has no relevant match.
pub const DEFAULT_PROJECT_RUBRIC: &str = "Evaluate the project report based \
on: clarity of problem statement, methodology, technical depth, deployment \
details, results, and reflection on limitations.";

// ─── Generation ────────────────────────────────────────────────────────────

/// Default Gemini API endpoint. Override: `GEMINI_BASE_URL`.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model. Override: `GEMINI_MODEL`.
pub const GEN_MODEL: &str = "gemini-2.5-flash";

/// Default embedding model. Override: `GEMINI_EMBED_MODEL`.
pub const EMBED_MODEL: &str = "gemini-embedding-001";

/// Timeout for generation requests (seconds). Override: `GEMINI_TIMEOUT_SECS`.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Total model-call attempts (1 initial + retries on transient failures).
pub const GEN_MAX_ATTEMPTS: u32 = 3;

/// Base delay unit for linear retry backoff (milliseconds). The delay
/// before retry attempt n is n times this value.
pub const GEN_RETRY_BASE_MS: u64 = 1000;

// ─── Extraction ────────────────────────────────────────────────────────────

/// Timeout for external extraction commands (seconds).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

// ─── Heuristic fallback ────────────────────────────────────────────────────

/// CV characters corresponding to a full match rate in the fallback.
pub const FALLBACK_CV_LEN_DIVISOR: f64 = 8000.0;

/// Report characters corresponding to a full project score in the fallback.
pub const FALLBACK_REPORT_LEN_DIVISOR: f64 = 1500.0;

/// Fallback CV feedback text.
pub const FALLBACK_CV_FEEDBACK: &str = "Automatic fallback evaluation: the \
CV appears broadly relevant, but this score was not produced by the language \
model because the model call failed or returned unusable output.";

/// Fallback project feedback text.
pub const FALLBACK_PROJECT_FEEDBACK: &str = "Automatic fallback evaluation: \
the project report was scored from basic text length and structure. A manual \
review is recommended.";

/// Fallback overall summary text.
pub const FALLBACK_SUMMARY: &str = "The language model could not be used for \
this evaluation and a heuristic fallback was applied. Supplement with a \
manual review before any hiring decision.";

// ─── HTTP surface ──────────────────────────────────────────────────────────

/// Default upload directory. Override: `UPLOAD_DIR`.
pub const UPLOAD_DIR: &str = "uploads";

/// Maximum accepted request body size in bytes (uploads included).
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;
