//! Offline rubric ingestion: read `---`-delimited rubric files, embed each
//! block, and upsert the points into the vector index.
//!
//! Usage: `ingest-rubrics [data-dir]` (default `data/`), expecting
//! `cv_rubrics.txt` and `project_rubrics.txt` inside.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use talenta_core::{EmbeddingBackend, RubricIndex, RubricKind, RubricPoint};
use talenta_inference::GeminiBackend;
use talenta_retrieval::QdrantIndex;

/// Split a rubric file into blocks on lines consisting of dashes.
fn split_rubric_blocks(raw: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
            if !current.trim().is_empty() {
                blocks.push(current.trim().to_string());
            }
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        blocks.push(current.trim().to_string());
    }

    blocks
}

fn load_rubrics(path: &Path, kind: RubricKind) -> anyhow::Result<Vec<(RubricKind, String, String)>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(split_rubric_blocks(&raw)
        .into_iter()
        .enumerate()
        .map(|(i, text)| (kind, format!("{}-{}", kind, i + 1), text))
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let data_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data".to_string());
    let data_dir = Path::new(&data_dir);

    let mut rubrics = load_rubrics(&data_dir.join("cv_rubrics.txt"), RubricKind::CvRubric)?;
    rubrics.extend(load_rubrics(
        &data_dir.join("project_rubrics.txt"),
        RubricKind::ProjectRubric,
    )?);

    let cv_count = rubrics
        .iter()
        .filter(|(kind, _, _)| *kind == RubricKind::CvRubric)
        .count();
    info!(
        cv_rubrics = cv_count,
        project_rubrics = rubrics.len() - cv_count,
        "Loaded rubric blocks"
    );

    if rubrics.is_empty() {
        anyhow::bail!("No rubric blocks found under {}", data_dir.display());
    }

    let embedder: Arc<dyn EmbeddingBackend> = Arc::new(GeminiBackend::from_env());
    let index = QdrantIndex::from_env();

    index.ensure_collection().await?;

    let texts: Vec<String> = rubrics.iter().map(|(_, _, text)| text.clone()).collect();
    let vectors = embedder.embed_texts(&texts).await?;

    let points: Vec<RubricPoint> = rubrics
        .into_iter()
        .zip(vectors)
        .map(|((kind, slug, text), vector)| RubricPoint {
            id: Uuid::new_v4(),
            kind,
            slug,
            text,
            vector,
        })
        .collect();

    index.upsert(&points).await?;
    info!(total = points.len(), "Rubric ingestion complete");

    Ok(())
}
