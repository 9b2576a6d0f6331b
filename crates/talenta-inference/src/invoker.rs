//! Model invocation with bounded retry on transient provider failures.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use talenta_core::{defaults, GenerationBackend, Result};

/// Retry policy for model calls.
///
/// The delay before retry attempt n is n times the base delay (linear
/// backoff). Only transient provider failures are retried; everything else
/// surfaces immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: u32,
    /// Base delay unit for linear backoff.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::GEN_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(defaults::GEN_RETRY_BASE_MS),
        }
    }
}

impl RetryPolicy {
    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base backoff delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }
}

/// Sends assembled prompts to the generation backend, retrying transient
/// provider failures with linear backoff.
///
/// The invoker never degrades a failed call into a synthetic result; after
/// exhausting retries (or on any permanent error) the failure surfaces to
/// the caller, which decides whether to fall back.
pub struct ModelInvoker {
    backend: Arc<dyn GenerationBackend>,
    policy: RetryPolicy,
}

impl ModelInvoker {
    /// Create an invoker with the default retry policy.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
        }
    }

    /// Create an invoker with a custom retry policy.
    pub fn with_policy(backend: Arc<dyn GenerationBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Model name of the underlying backend.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Send a prompt, retrying transient failures.
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        let mut last_err = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.backend.generate(prompt).await {
                Ok(text) => {
                    debug!(
                        subsystem = "inference",
                        op = "invoke",
                        attempt,
                        response_len = text.len(),
                        "Model call succeeded"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.base_delay * attempt;
                    warn!(
                        subsystem = "inference",
                        op = "invoke",
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    sleep(delay).await;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        // Unreachable unless the final attempt was transient; surface it.
        Err(last_err.expect("retry loop exited without error"))
    }
}
