//! The per-job evaluation pipeline: extract → retrieve → invoke → validate.

use std::sync::Arc;

use tracing::{debug, warn};

use talenta_core::{Error, EvaluationJob, FileRepository, Result, TextExtractor};
use talenta_inference::ModelInvoker;
use talenta_retrieval::{RubricContext, RubricRetriever};

use crate::prompt::build_prompt;
use crate::verdict::{heuristic_fallback, parse_verdict, Verdict};

/// Drives a claimed job through the evaluation stages and produces a
/// verdict. Stages run strictly sequentially; each depends on the previous
/// stage's output.
///
/// Error policy: file lookup, extraction, and model-call failures propagate
/// to the worker (which fails the job). Retrieval failures and unusable
/// model output degrade — the former to empty rubric guidance, the latter
/// to the heuristic fallback.
pub struct EvaluationPipeline {
    files: Arc<dyn FileRepository>,
    extractor: Arc<dyn TextExtractor>,
    retriever: RubricRetriever,
    /// `None` when no model API key is configured; every evaluation then
    /// uses the heuristic fallback.
    invoker: Option<ModelInvoker>,
}

impl EvaluationPipeline {
    /// Create a pipeline over the given collaborators.
    pub fn new(
        files: Arc<dyn FileRepository>,
        extractor: Arc<dyn TextExtractor>,
        retriever: RubricRetriever,
        invoker: Option<ModelInvoker>,
    ) -> Self {
        Self {
            files,
            extractor,
            retriever,
            invoker,
        }
    }

    /// Evaluate a claimed job. Returns the verdict to persist; any `Err`
    /// means the job must be failed with no evaluation written.
    pub async fn evaluate(&self, job: &EvaluationJob) -> Result<Verdict> {
        let cv_file = self
            .files
            .get(job.cv_file_id)
            .await?
            .ok_or(Error::FileNotFound(job.cv_file_id))?;
        let report_file = self
            .files
            .get(job.report_file_id)
            .await?
            .ok_or(Error::FileNotFound(job.report_file_id))?;

        let cv = self.extractor.extract_text(&cv_file.path).await?;
        let report = self.extractor.extract_text(&report_file.path).await?;

        debug!(
            subsystem = "jobs",
            op = "evaluate",
            job_id = %job.id,
            cv_len = cv.text.len(),
            cv_pages = cv.page_count,
            report_len = report.text.len(),
            report_pages = report.page_count,
            "Documents extracted"
        );

        // Retrieval is advisory; a provider failure must not abort the job.
        let rubrics = match self.retriever.find_rubrics(&cv.text, &report.text).await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    error = %e,
                    "Rubric retrieval failed, continuing without guidance"
                );
                RubricContext::empty()
            }
        };

        let invoker = match &self.invoker {
            Some(invoker) => invoker,
            None => {
                warn!(
                    job_id = %job.id,
                    used_fallback = true,
                    "No model API key configured, using heuristic fallback"
                );
                return Ok(heuristic_fallback(cv.text.len(), report.text.len()));
            }
        };

        let prompt = build_prompt(&job.job_title, &cv.text, &report.text, &rubrics);
        let raw = invoker.invoke(&prompt).await?;

        match parse_verdict(&raw) {
            Some(parsed) => {
                if !parsed.complete {
                    warn!(
                        job_id = %job.id,
                        response_len = raw.len(),
                        "Model output missing fields, defaults applied"
                    );
                }
                Ok(parsed.verdict)
            }
            None => {
                warn!(
                    job_id = %job.id,
                    response_len = raw.len(),
                    used_fallback = true,
                    "Model output is not valid JSON, using heuristic fallback"
                );
                Ok(heuristic_fallback(cv.text.len(), report.text.len()))
            }
        }
    }
}
