//! # talenta-jobs
//!
//! Asynchronous evaluation worker for talenta.
//!
//! This crate provides:
//! - A polling worker that claims at most one queued job per tick and
//!   drives it to a terminal state
//! - The evaluation pipeline: extract → retrieve → invoke → validate
//! - Model-response validation with a deterministic heuristic fallback
//! - PDF text extraction via `pdftotext`
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use talenta_jobs::{EvaluationPipeline, EvaluationWorker, WorkerConfig};
//!
//! let worker = EvaluationWorker::new(jobs, evaluations, pipeline, WorkerConfig::default());
//! let handle = worker.start();
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod extraction;
pub mod pipeline;
pub mod prompt;
pub mod verdict;
pub mod worker;

// Re-export core types
pub use talenta_core::*;

pub use extraction::PdfTextExtractor;
pub use pipeline::EvaluationPipeline;
pub use prompt::build_prompt;
pub use verdict::{heuristic_fallback, parse_verdict, ParsedVerdict, Verdict};
pub use worker::{EvaluationWorker, WorkerConfig, WorkerEvent, WorkerHandle};

/// Default polling interval for job processing (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = talenta_core::defaults::JOB_POLL_INTERVAL_MS;
