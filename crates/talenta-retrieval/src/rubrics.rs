//! Rubric retrieval and guidance assembly.

use std::sync::Arc;

use tracing::{debug, instrument};

use talenta_core::{defaults, EmbeddingBackend, Result, RubricHit, RubricIndex, RubricKind};

/// Rubric guidance text assembled for one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RubricContext {
    /// Guidance for evaluating the CV.
    pub cv: String,
    /// Guidance for evaluating the project report.
    pub project: String,
}

impl RubricContext {
    /// Context with no guidance at all, used when retrieval itself failed.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Retrieves the most relevant rubrics for a CV and project report.
///
/// Retrieval is advisory: zero hits (or blank input) yield a static default
/// rubric so the prompt never goes out with empty guidance, and callers
/// catch provider errors rather than aborting the evaluation.
pub struct RubricRetriever {
    embedder: Arc<dyn EmbeddingBackend>,
    index: Arc<dyn RubricIndex>,
    top_k: usize,
}

impl RubricRetriever {
    /// Create a retriever over the given embedding backend and index.
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, index: Arc<dyn RubricIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: defaults::RUBRIC_TOP_K,
        }
    }

    /// Override the number of hits retrieved per document kind.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Join ranked hits into guidance text, most similar first.
    fn join_hits(hits: &[RubricHit]) -> String {
        hits.iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join(defaults::RUBRIC_SEPARATOR)
    }

    /// Find rubric guidance for the present document texts.
    ///
    /// Both embeddings are batched into a single call when both texts are
    /// present. Blank texts skip embedding and search entirely and get the
    /// default rubric for their kind.
    #[instrument(skip_all, fields(subsystem = "retrieval", op = "find_rubrics", cv_len = cv_text.len(), report_len = report_text.len()))]
    pub async fn find_rubrics(&self, cv_text: &str, report_text: &str) -> Result<RubricContext> {
        let cv_present = !cv_text.trim().is_empty();
        let report_present = !report_text.trim().is_empty();

        let mut texts_to_embed = Vec::new();
        if cv_present {
            texts_to_embed.push(cv_text.to_string());
        }
        if report_present {
            texts_to_embed.push(report_text.to_string());
        }

        let vectors = if texts_to_embed.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_texts(&texts_to_embed).await?
        };
        if vectors.len() != texts_to_embed.len() {
            return Err(talenta_core::Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts_to_embed.len(),
                vectors.len()
            )));
        }

        let mut idx = 0;
        let mut cv_rubrics = String::new();
        let mut project_rubrics = String::new();

        if cv_present {
            let hits = self
                .index
                .search(&vectors[idx], self.top_k, RubricKind::CvRubric)
                .await?;
            idx += 1;
            cv_rubrics = Self::join_hits(&hits);
        }

        if report_present {
            let hits = self
                .index
                .search(&vectors[idx], self.top_k, RubricKind::ProjectRubric)
                .await?;
            project_rubrics = Self::join_hits(&hits);
        }

        // Zero hits (or blank input) never leave the prompt without guidance.
        if cv_rubrics.is_empty() {
            cv_rubrics = defaults::DEFAULT_CV_RUBRIC.to_string();
        }
        if project_rubrics.is_empty() {
            project_rubrics = defaults::DEFAULT_PROJECT_RUBRIC.to_string();
        }

        debug!(
            cv_rubrics_len = cv_rubrics.len(),
            project_rubrics_len = project_rubrics.len(),
            "Rubric guidance assembled"
        );

        Ok(RubricContext {
            cv: cv_rubrics,
            project: project_rubrics,
        })
    }
}
