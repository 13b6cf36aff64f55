//! Retry with exponential backoff around model calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use pagemind_config::RetryConfig;
use pagemind_protocols::{LanguageModel, ModelError, SessionPurpose};

use crate::sentinel;

/// Callback receiving a human-readable note after each failed attempt.
pub type ErrorUpdate<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failure of zero-based `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(delay as u64)
    }
}

/// Why [`retry_with_backoff`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that must not be retried.
    Rejected { attempt: u32, error: E },
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// `on_error` is called once per failed attempt, with the 1-based attempt
/// number. Sleeping happens only between attempts.
pub async fn retry_with_backoff<T, E, F, Fut, P, R>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut on_error: R,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    R: FnMut(u32, &E),
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                on_error(attempt, &e);

                if !is_retryable(&e) {
                    return Err(RetryError::Rejected { attempt, error: e });
                }
                if attempt >= max_attempts {
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }

                let delay = policy.delay_for_attempt(attempt - 1);
                warn!(
                    "Model call failed (attempt {}/{}): {}, retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                sleep(delay).await;
            }
        }
    }
}

/// Terminal outcome of a [`RetryingInvoker`] call.
#[derive(Debug, Error)]
pub enum InvokeFailure {
    #[error("model unavailable")]
    Unavailable,

    #[error("gave up after {attempts} attempt(s): {reason}")]
    Exhausted { attempts: u32, reason: String },
}

impl InvokeFailure {
    /// Displayable sentinel, using `failure` when retries ran out.
    pub fn sentinel(&self, failure: &'static str) -> &'static str {
        match self {
            InvokeFailure::Unavailable => sentinel::MODEL_UNAVAILABLE,
            InvokeFailure::Exhausted { .. } => failure,
        }
    }
}

/// Wraps every model call with an availability probe and backoff retries.
pub struct RetryingInvoker {
    model: Arc<dyn LanguageModel>,
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(model: Arc<dyn LanguageModel>, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    /// Run `operation` with retries.
    ///
    /// Availability is probed before every attempt. A `No` ends the call
    /// immediately with [`InvokeFailure::Unavailable`]; `Maybe` proceeds.
    pub async fn run<T, F, Fut>(
        &self,
        purpose: SessionPurpose,
        on_error: Option<ErrorUpdate<'_>>,
        mut operation: F,
    ) -> Result<T, InvokeFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ModelError>>,
    {
        let model: &dyn LanguageModel = self.model.as_ref();

        let result = retry_with_backoff(
            &self.policy,
            ModelError::is_retryable,
            |attempt, e: &ModelError| {
                if matches!(e, ModelError::Unavailable(_)) {
                    return;
                }
                debug!("{} call failed on attempt {}: {}", purpose, attempt, e);
                if let Some(callback) = on_error {
                    callback(&format!("Attempt {} failed: {}", attempt, e));
                }
            },
            |_| {
                let call = operation();
                async move {
                    if model.availability(purpose).await.is_unavailable() {
                        return Err(ModelError::Unavailable(format!(
                            "{} reports no {} capability",
                            model.id(),
                            purpose
                        )));
                    }
                    call.await
                }
            },
        )
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(RetryError::Rejected {
                error: ModelError::Unavailable(reason),
                ..
            }) => {
                warn!("Model unavailable for {}: {}", purpose, reason);
                Err(InvokeFailure::Unavailable)
            }
            Err(RetryError::Rejected { attempt, error }) => Err(InvokeFailure::Exhausted {
                attempts: attempt,
                reason: error.to_string(),
            }),
            Err(RetryError::Exhausted { attempts, last }) => Err(InvokeFailure::Exhausted {
                attempts,
                reason: last.to_string(),
            }),
        }
    }

    /// Like [`run`](Self::run) but folds failures into a displayable string.
    pub async fn invoke<F, Fut>(
        &self,
        purpose: SessionPurpose,
        on_error: Option<ErrorUpdate<'_>>,
        failure: &'static str,
        operation: F,
    ) -> String
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, ModelError>>,
    {
        match self.run(purpose, on_error, operation).await {
            Ok(text) => text,
            Err(e) => {
                warn!("{} call failed: {}", purpose, e);
                e.sentinel(failure).to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
