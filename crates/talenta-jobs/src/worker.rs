//! Evaluation worker: claims queued jobs and drives them to a terminal state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use talenta_core::{defaults, EvaluationJob, EvaluationRepository, JobRepository, Result};

use crate::pipeline::EvaluationPipeline;

/// Configuration for the evaluation worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Whether to enable job processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::JOB_POLL_INTERVAL_MS,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `JOB_POLL_INTERVAL_MS` | `5000` | Polling interval |
    pub fn from_env() -> Self {
        let enabled = std::env::var("WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let poll_interval_ms = std::env::var("JOB_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::JOB_POLL_INTERVAL_MS);

        Self {
            poll_interval_ms,
            enabled,
        }
    }

    /// Create a new config with a custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the evaluation worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was claimed and processing started.
    JobStarted { job_id: Uuid },
    /// A job completed with a persisted evaluation.
    JobCompleted { job_id: Uuid, used_fallback: bool },
    /// A job failed.
    JobFailed { job_id: Uuid, error: String },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx.send(()).await.map_err(|_| {
            talenta_core::Error::Internal("Failed to send shutdown signal".into())
        })?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker that polls for queued evaluation jobs and processes them one at a
/// time.
///
/// The claim itself transitions the job to `Processing` durably before any
/// pipeline work begins. Every claimed job reaches a terminal state before
/// the invocation returns: `Completed` only after its evaluation row is
/// written, `Failed` on any error with no evaluation written. A single
/// job's failure never stops subsequent polling cycles.
pub struct EvaluationWorker {
    jobs: Arc<dyn JobRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    pipeline: EvaluationPipeline,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl EvaluationWorker {
    /// Create a new worker.
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
        pipeline: EvaluationPipeline,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            jobs,
            evaluations,
            pipeline,
            config,
            event_tx,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Claim and process at most one queued job.
    ///
    /// Returns the processed job's id, or `None` when the queue was empty.
    /// The `Result` covers claim-time store errors only; job execution
    /// errors are absorbed into the job's `Failed` state.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "worker", op = "process_one_job"))]
    pub async fn process_one_job(&self) -> Result<Option<Uuid>> {
        let job = match self.jobs.claim_next().await? {
            Some(job) => job,
            None => return Ok(None),
        };

        let job_id = job.id;
        let start = Instant::now();

        info!(job_id = %job_id, job_title = %job.job_title, "Processing job");
        let _ = self.event_tx.send(WorkerEvent::JobStarted { job_id });

        match self.run_claimed(&job).await {
            Ok(used_fallback) => {
                info!(
                    job_id = %job_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    used_fallback,
                    "Job completed"
                );
                let _ = self.event_tx.send(WorkerEvent::JobCompleted {
                    job_id,
                    used_fallback,
                });
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job failed"
                );
                if let Err(mark_err) = self.jobs.mark_failed(job_id, &e.to_string()).await {
                    error!(job_id = %job_id, error = %mark_err, "Failed to mark job as failed");
                }
                let _ = self.event_tx.send(WorkerEvent::JobFailed {
                    job_id,
                    error: e.to_string(),
                });
            }
        }

        Ok(Some(job_id))
    }

    /// Run a claimed job to completion: evaluate, persist, mark completed.
    async fn run_claimed(&self, job: &EvaluationJob) -> Result<bool> {
        let verdict = self.pipeline.evaluate(job).await?;
        let used_fallback = verdict.used_fallback;

        self.evaluations.create(job.id, verdict.into_request()).await?;
        self.jobs.mark_completed(job.id).await?;

        Ok(used_fallback)
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Run the polling loop on a fixed cadence, one job per tick.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Evaluation worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "Evaluation worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Evaluation worker received shutdown signal");
                break;
            }

            match self.process_one_job().await {
                Ok(Some(job_id)) => debug!(job_id = %job_id, "Polling cycle processed a job"),
                Ok(None) => {}
                Err(e) => error!(error = %e, "Failed to claim job"),
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Evaluation worker received shutdown signal");
                    break;
                }
                _ = sleep(poll_interval) => {}
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Evaluation worker stopped");
    }
}
