//! Worker and pipeline behavior over in-memory collaborators.
//!
//! Exercises the job lifecycle end to end without Postgres or live
//! providers: state transitions, the evaluation↔completed invariant,
//! fallback behavior, and fault isolation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use talenta_core::{
    CreateEvaluationRequest, DocumentKind, Error, Evaluation, EvaluationJob,
    EvaluationRepository, ExtractedText, FileRepository, JobRepository, JobStatus, Result,
    RubricHit, RubricIndex, RubricKind, RubricPoint, StoredFile, TextExtractor,
    EmbeddingBackend, GenerationBackend,
};
use talenta_inference::{ModelInvoker, RetryPolicy};
use talenta_jobs::{EvaluationPipeline, EvaluationWorker, WorkerConfig};
use talenta_retrieval::RubricRetriever;

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InMemoryFiles {
    files: Mutex<HashMap<Uuid, StoredFile>>,
}

impl InMemoryFiles {
    fn insert(&self, path: &str, kind: DocumentKind) -> Uuid {
        let id = Uuid::now_v7();
        self.files.lock().unwrap().insert(
            id,
            StoredFile {
                id,
                kind,
                path: path.to_string(),
                original_name: None,
                created_at: Utc::now(),
            },
        );
        id
    }
}

#[async_trait]
impl FileRepository for InMemoryFiles {
    async fn save(
        &self,
        kind: DocumentKind,
        path: &str,
        _original_name: Option<&str>,
    ) -> Result<Uuid> {
        Ok(self.insert(path, kind))
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredFile>> {
        Ok(self.files.lock().unwrap().get(&id).cloned())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(&id))
    }
}

#[derive(Default)]
struct InMemoryJobs {
    jobs: Mutex<Vec<EvaluationJob>>,
    /// Observed status transitions, in write order.
    transitions: Mutex<Vec<(Uuid, JobStatus)>>,
}

impl InMemoryJobs {
    fn job(&self, id: Uuid) -> EvaluationJob {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .expect("job exists")
    }

    fn transitions_for(&self, id: Uuid) -> Vec<JobStatus> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .filter(|(job_id, _)| *job_id == id)
            .map(|(_, status)| *status)
            .collect()
    }

    fn set_created_at(&self, id: Uuid, offset_secs: i64) {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.iter_mut().find(|j| j.id == id).expect("job exists");
        job.created_at = Utc::now() + ChronoDuration::seconds(offset_secs);
    }
}

#[async_trait]
impl JobRepository for InMemoryJobs {
    async fn create(
        &self,
        job_title: &str,
        cv_file_id: Uuid,
        report_file_id: Uuid,
    ) -> Result<EvaluationJob> {
        let job = EvaluationJob {
            id: Uuid::now_v7(),
            job_title: job_title.to_string(),
            cv_file_id,
            report_file_id,
            status: JobStatus::Queued,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn claim_next(&self) -> Result<Option<EvaluationJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let next = jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Queued)
            .min_by_key(|j| j.created_at);

        match next {
            Some(job) => {
                job.status = JobStatus::Processing;
                job.started_at = Some(Utc::now());
                self.transitions
                    .lock()
                    .unwrap()
                    .push((job.id, JobStatus::Processing));
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Processing)
            .ok_or(Error::JobNotFound(id))?;
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        self.transitions
            .lock()
            .unwrap()
            .push((id, JobStatus::Completed));
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Processing)
            .ok_or(Error::JobNotFound(id))?;
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_string());
        job.completed_at = Some(Utc::now());
        self.transitions
            .lock()
            .unwrap()
            .push((id, JobStatus::Failed));
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationJob>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned())
    }

    async fn get_with_evaluation(
        &self,
        id: Uuid,
    ) -> Result<Option<(EvaluationJob, Option<Evaluation>)>> {
        Ok(self.get(id).await?.map(|job| (job, None)))
    }

    async fn pending_count(&self) -> Result<i64> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.status == JobStatus::Queued)
            .count() as i64)
    }
}

#[derive(Default)]
struct InMemoryEvaluations {
    evaluations: Mutex<HashMap<Uuid, Evaluation>>,
}

impl InMemoryEvaluations {
    fn for_job(&self, job_id: Uuid) -> Option<Evaluation> {
        self.evaluations.lock().unwrap().get(&job_id).cloned()
    }

    fn count(&self) -> usize {
        self.evaluations.lock().unwrap().len()
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryEvaluations {
    async fn create(&self, job_id: Uuid, req: CreateEvaluationRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        self.evaluations.lock().unwrap().insert(
            job_id,
            Evaluation {
                id,
                job_id,
                cv_match_rate: req.cv_match_rate,
                cv_feedback: req.cv_feedback,
                project_score: req.project_score,
                project_feedback: req.project_feedback,
                overall_summary: req.overall_summary,
                raw_cv_scores: req.raw_cv_scores,
                raw_project_scores: req.raw_project_scores,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_for_job(&self, job_id: Uuid) -> Result<Option<Evaluation>> {
        Ok(self.for_job(job_id))
    }
}

/// Extractor mapping paths to canned text; unknown paths fail.
struct FakeExtractor {
    texts: HashMap<String, String>,
}

impl FakeExtractor {
    fn new(texts: &[(&str, &str)]) -> Self {
        Self {
            texts: texts
                .iter()
                .map(|(path, text)| (path.to_string(), text.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract_text(&self, path: &str) -> Result<ExtractedText> {
        match self.texts.get(path) {
            Some(text) => Ok(ExtractedText {
                text: text.clone(),
                page_count: 1,
            }),
            None => Err(Error::Extraction(format!("Unreadable document: {}", path))),
        }
    }
}

struct FakeEmbedder {
    fail: bool,
}

#[async_trait]
impl EmbeddingBackend for FakeEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.fail {
            return Err(Error::Embedding("embedding provider down".into()));
        }
        Ok(texts.iter().map(|_| vec![0.5, 0.5]).collect())
    }

    fn dimension(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }
}

struct FakeIndex;

#[async_trait]
impl RubricIndex for FakeIndex {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        _vector: &[f32],
        _limit: usize,
        kind: RubricKind,
    ) -> Result<Vec<RubricHit>> {
        Ok(vec![RubricHit {
            text: format!("{} guidance", kind),
            score: 0.9,
        }])
    }

    async fn upsert(&self, _points: &[RubricPoint]) -> Result<()> {
        Ok(())
    }
}

/// Generation backend returning a scripted sequence of results.
struct ScriptedModel {
    script: Mutex<Vec<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(Error::Internal("script exhausted".into()));
        }
        script.remove(0)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

const CV_TEXT: &str = "Experienced backend developer with Rust and Postgres.";
const REPORT_TEXT: &str = "Built an evaluation pipeline with retries and retrieval.";

const MODEL_JSON: &str = r#"{"cvMatchRate":0.8,"cvFeedback":"Relevant experience","projectScore":4.0,"projectFeedback":"Well structured","overallSummary":"Strong candidate"}"#;

struct Harness {
    files: Arc<InMemoryFiles>,
    jobs: Arc<InMemoryJobs>,
    evaluations: Arc<InMemoryEvaluations>,
    model: Arc<ScriptedModel>,
    worker: EvaluationWorker,
}

fn service_unavailable() -> Error {
    Error::Transient {
        status: 503,
        message: "service unavailable".into(),
    }
}

/// Build a worker over in-memory collaborators with a scripted model.
fn harness_with(script: Vec<Result<String>>, embedder_fails: bool) -> Harness {
    let files = Arc::new(InMemoryFiles::default());
    let jobs = Arc::new(InMemoryJobs::default());
    let evaluations = Arc::new(InMemoryEvaluations::default());
    let model = Arc::new(ScriptedModel::new(script));

    let retriever = RubricRetriever::new(
        Arc::new(FakeEmbedder {
            fail: embedder_fails,
        }),
        Arc::new(FakeIndex),
    );
    let extractor = Arc::new(FakeExtractor::new(&[
        ("cv.pdf", CV_TEXT),
        ("report.pdf", REPORT_TEXT),
    ]));
    let invoker = ModelInvoker::with_policy(
        model.clone() as Arc<dyn GenerationBackend>,
        RetryPolicy::default(),
    );
    let pipeline = EvaluationPipeline::new(
        files.clone(),
        extractor,
        retriever,
        Some(invoker),
    );
    let worker = EvaluationWorker::new(
        jobs.clone(),
        evaluations.clone(),
        pipeline,
        WorkerConfig::default(),
    );

    Harness {
        files,
        jobs,
        evaluations,
        model,
        worker,
    }
}

impl Harness {
    async fn submit(&self, title: &str) -> Uuid {
        let cv_id = self.files.insert("cv.pdf", DocumentKind::Cv);
        let report_id = self.files.insert("report.pdf", DocumentKind::ProjectReport);
        let job = self.jobs.create(title, cv_id, report_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        job.id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_job_has_matching_evaluation() {
    let h = harness_with(vec![Ok(MODEL_JSON.to_string())], false);
    let job_id = h.submit("Backend Intern").await;

    let processed = h.worker.process_one_job().await.unwrap();
    assert_eq!(processed, Some(job_id));

    let job = h.jobs.job(job_id);
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());

    let eval = h.evaluations.for_job(job_id).expect("evaluation persisted");
    assert_eq!(eval.cv_match_rate, 0.8);
    assert_eq!(eval.cv_feedback, "Relevant experience");
    assert_eq!(eval.project_score, 4.0);
    assert_eq!(eval.project_feedback, "Well structured");
    assert_eq!(eval.overall_summary, "Strong candidate");

    assert_eq!(
        h.jobs.transitions_for(job_id),
        vec![JobStatus::Processing, JobStatus::Completed]
    );
}

#[tokio::test]
async fn empty_queue_is_a_no_op() {
    let h = harness_with(vec![], false);
    let processed = h.worker.process_one_job().await.unwrap();
    assert!(processed.is_none());
    assert_eq!(h.model.call_count(), 0);
    assert_eq!(h.evaluations.count(), 0);
}

#[tokio::test]
async fn oldest_queued_job_is_claimed_first() {
    let h = harness_with(
        vec![Ok(MODEL_JSON.to_string()), Ok(MODEL_JSON.to_string())],
        false,
    );
    let newer = h.submit("Second").await;
    let older = h.submit("First").await;
    h.jobs.set_created_at(older, -60);

    let first = h.worker.process_one_job().await.unwrap();
    assert_eq!(first, Some(older));
    let second = h.worker.process_one_job().await.unwrap();
    assert_eq!(second, Some(newer));
}

#[tokio::test]
async fn malformed_model_output_falls_back_without_failing() {
    let h = harness_with(
        vec![Ok("I am unable to produce JSON today.".to_string())],
        false,
    );
    let job_id = h.submit("Backend Intern").await;

    h.worker.process_one_job().await.unwrap();

    let job = h.jobs.job(job_id);
    assert_eq!(job.status, JobStatus::Completed);

    let eval = h.evaluations.for_job(job_id).expect("fallback persisted");
    // Short inputs pin the deterministic fallback at its lower bounds.
    assert_eq!(
        eval.cv_match_rate,
        (CV_TEXT.len() as f64 / 8000.0).clamp(0.2, 0.9)
    );
    assert_eq!(
        eval.project_score,
        (REPORT_TEXT.len() as f64 / 1500.0).clamp(1.0, 5.0)
    );
    assert!(eval.cv_feedback.contains("fallback"));
}

#[tokio::test(start_paused = true)]
async fn transient_failures_on_all_attempts_fail_the_job() {
    let h = harness_with(
        vec![
            Err(service_unavailable()),
            Err(service_unavailable()),
            Err(service_unavailable()),
        ],
        false,
    );
    let job_id = h.submit("Backend Intern").await;

    h.worker.process_one_job().await.unwrap();

    assert_eq!(h.model.call_count(), 3);

    let job = h.jobs.job(job_id);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.is_some());
    assert!(h.evaluations.for_job(job_id).is_none());
    assert_eq!(
        h.jobs.transitions_for(job_id),
        vec![JobStatus::Processing, JobStatus::Failed]
    );
}

#[tokio::test(start_paused = true)]
async fn transient_failures_then_success_completes_the_job() {
    let h = harness_with(
        vec![
            Err(service_unavailable()),
            Err(service_unavailable()),
            Ok(MODEL_JSON.to_string()),
        ],
        false,
    );
    let job_id = h.submit("Backend Intern").await;

    h.worker.process_one_job().await.unwrap();

    assert_eq!(h.model.call_count(), 3);
    assert_eq!(h.jobs.job(job_id).status, JobStatus::Completed);
    assert!(h.evaluations.for_job(job_id).is_some());
}

#[tokio::test]
async fn permanent_provider_error_fails_the_job_without_retry() {
    let h = harness_with(vec![Err(Error::Inference("invalid model".into()))], false);
    let job_id = h.submit("Backend Intern").await;

    h.worker.process_one_job().await.unwrap();

    assert_eq!(h.model.call_count(), 1);
    assert_eq!(h.jobs.job(job_id).status, JobStatus::Failed);
    assert!(h.evaluations.for_job(job_id).is_none());
}

#[tokio::test]
async fn extraction_failure_fails_the_job() {
    let h = harness_with(vec![Ok(MODEL_JSON.to_string())], false);
    let cv_id = h.files.insert("missing.pdf", DocumentKind::Cv);
    let report_id = h.files.insert("report.pdf", DocumentKind::ProjectReport);
    let job = h.jobs.create("Backend Intern", cv_id, report_id).await.unwrap();

    h.worker.process_one_job().await.unwrap();

    let failed = h.jobs.job(job.id);
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.error_message.unwrap().contains("Unreadable document"));
    assert_eq!(h.model.call_count(), 0);
    assert_eq!(h.evaluations.count(), 0);
}

#[tokio::test]
async fn missing_file_record_fails_the_job() {
    let h = harness_with(vec![Ok(MODEL_JSON.to_string())], false);
    let cv_id = h.files.insert("cv.pdf", DocumentKind::Cv);
    let job = h
        .jobs
        .create("Backend Intern", cv_id, Uuid::new_v4())
        .await
        .unwrap();

    h.worker.process_one_job().await.unwrap();

    assert_eq!(h.jobs.job(job.id).status, JobStatus::Failed);
    assert!(h.evaluations.for_job(job.id).is_none());
}

#[tokio::test]
async fn retrieval_failure_is_advisory() {
    // Embedding provider down: the job still completes via the model path,
    // just without rubric guidance in the prompt.
    let h = harness_with(vec![Ok(MODEL_JSON.to_string())], true);
    let job_id = h.submit("Backend Intern").await;

    h.worker.process_one_job().await.unwrap();

    assert_eq!(h.jobs.job(job_id).status, JobStatus::Completed);
    let eval = h.evaluations.for_job(job_id).unwrap();
    assert_eq!(eval.cv_match_rate, 0.8);

    let prompts = h.model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("cv_rubric guidance"));
}

#[tokio::test]
async fn rubric_guidance_lands_in_the_prompt() {
    let h = harness_with(vec![Ok(MODEL_JSON.to_string())], false);
    h.submit("Backend Intern").await;

    h.worker.process_one_job().await.unwrap();

    let prompts = h.model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("cv_rubric guidance"));
    assert!(prompts[0].contains("project_rubric guidance"));
    assert!(prompts[0].contains(CV_TEXT));
    assert!(prompts[0].contains(REPORT_TEXT));
}

#[tokio::test]
async fn one_failure_does_not_stop_later_jobs() {
    let h = harness_with(
        vec![
            Err(Error::Inference("broken".into())),
            Ok(MODEL_JSON.to_string()),
        ],
        false,
    );
    let first = h.submit("First").await;
    h.jobs.set_created_at(first, -60);
    let second = h.submit("Second").await;

    h.worker.process_one_job().await.unwrap();
    h.worker.process_one_job().await.unwrap();

    assert_eq!(h.jobs.job(first).status, JobStatus::Failed);
    assert_eq!(h.jobs.job(second).status, JobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn evaluation_exists_iff_job_completed() {
    let h = harness_with(
        vec![
            Ok(MODEL_JSON.to_string()),
            Err(service_unavailable()),
            Err(service_unavailable()),
            Err(service_unavailable()),
        ],
        false,
    );
    let completed = h.submit("Completes").await;
    h.jobs.set_created_at(completed, -60);
    let failed = h.submit("Fails").await;

    h.worker.process_one_job().await.unwrap();
    h.worker.process_one_job().await.unwrap();

    for job in h.jobs.jobs.lock().unwrap().iter() {
        let has_eval = h.evaluations.for_job(job.id).is_some();
        assert_eq!(has_eval, job.status == JobStatus::Completed);
    }
    assert_eq!(h.jobs.job(completed).status, JobStatus::Completed);
    assert_eq!(h.jobs.job(failed).status, JobStatus::Failed);
}

#[tokio::test]
async fn no_job_left_processing_after_each_invocation() {
    let h = harness_with(
        vec![
            Ok(MODEL_JSON.to_string()),
            Err(Error::Inference("broken".into())),
        ],
        false,
    );
    let a = h.submit("A").await;
    h.jobs.set_created_at(a, -60);
    h.submit("B").await;

    for _ in 0..3 {
        h.worker.process_one_job().await.unwrap();
        let processing = h
            .jobs
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.status == JobStatus::Processing)
            .count();
        assert_eq!(processing, 0);
    }
}

#[tokio::test]
async fn missing_api_key_completes_with_fallback() {
    // A pipeline with no invoker at all: straight to the heuristic path.
    let files = Arc::new(InMemoryFiles::default());
    let jobs = Arc::new(InMemoryJobs::default());
    let evaluations = Arc::new(InMemoryEvaluations::default());

    let retriever = RubricRetriever::new(
        Arc::new(FakeEmbedder { fail: false }),
        Arc::new(FakeIndex),
    );
    let extractor = Arc::new(FakeExtractor::new(&[
        ("cv.pdf", CV_TEXT),
        ("report.pdf", REPORT_TEXT),
    ]));
    let pipeline = EvaluationPipeline::new(files.clone(), extractor, retriever, None);
    let worker = EvaluationWorker::new(
        jobs.clone(),
        evaluations.clone(),
        pipeline,
        WorkerConfig::default(),
    );

    let cv_id = files.insert("cv.pdf", DocumentKind::Cv);
    let report_id = files.insert("report.pdf", DocumentKind::ProjectReport);
    let job = jobs.create("Backend Intern", cv_id, report_id).await.unwrap();

    worker.process_one_job().await.unwrap();

    assert_eq!(jobs.job(job.id).status, JobStatus::Completed);
    let eval = evaluations.for_job(job.id).unwrap();
    assert!(eval.overall_summary.contains("heuristic fallback"));
}

#[tokio::test]
async fn worker_loop_processes_and_shuts_down() {
    let h = harness_with(vec![Ok(MODEL_JSON.to_string())], false);
    let job_id = h.submit("Backend Intern").await;

    let jobs = h.jobs.clone();
    let evaluations = h.evaluations.clone();
    let handle = h.worker.start();

    // Wait for the completion event rather than polling job state.
    let mut events = handle.events();
    loop {
        match events.recv().await.unwrap() {
            talenta_jobs::WorkerEvent::JobCompleted {
                job_id: id,
                used_fallback,
            } => {
                assert_eq!(id, job_id);
                assert!(!used_fallback);
                break;
            }
            _ => continue,
        }
    }

    handle.shutdown().await.unwrap();

    assert_eq!(jobs.job(job_id).status, JobStatus::Completed);
    assert!(evaluations.for_job(job_id).is_some());
}
