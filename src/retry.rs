//! Retry with exponential backoff and jitter for single task invocations.
//!
//! The coordinator is independent of the graph: an external runner wraps each
//! plan task in [`RetryCoordinator::run`]. No state is kept between calls, so
//! concurrent invocations never affect one another. Delays are `tokio` timers
//! and never block a thread.

use crate::config::RetryConfig;
use crate::error::RetryError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Jitter scales each delay by a uniform factor in this range.
const JITTER_MIN: f64 = 0.75;
const JITTER_MAX: f64 = 1.25;

/// How often and how patiently a task is retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    pub retryable_error_kinds: BTreeSet<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let config = RetryConfig::default();
        Self {
            max_attempts: config.max_attempts,
            initial_delay_ms: config.initial_delay,
            max_delay_ms: config.max_delay,
            backoff_factor: config.backoff_factor,
            retryable_error_kinds: config.retryable_errors.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, kind: &str) -> bool {
        self.retryable_error_kinds.contains(kind)
    }

    /// The un-jittered delay after failed attempt `attempt` (1-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let ms = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        Duration::from_millis(ms.min(self.max_delay_ms as f64) as u64)
    }

    /// The delay after failed attempt `attempt`, with jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = rand::rng().random_range(JITTER_MIN..JITTER_MAX);
        self.base_delay(attempt).mul_f64(factor)
    }
}

/// Errors that can tell the coordinator what kind of failure they are.
pub trait ClassifiedError: fmt::Display {
    /// The error kind matched against `RetryPolicy::retryable_error_kinds`.
    fn kind(&self) -> &str;
}

/// A general-purpose task failure carrying its kind.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct TaskError {
    pub kind: String,
    pub message: String,
}

impl TaskError {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

impl ClassifiedError for TaskError {
    fn kind(&self) -> &str {
        &self.kind
    }
}

/// One attempt of a retried task.
///
/// `error` is set for failed attempts; `delay` is the backoff that followed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

/// A successful result together with the attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub history: Vec<AttemptRecord>,
}

impl<T> Retried<T> {
    pub fn attempts(&self) -> u32 {
        self.history.len() as u32
    }
}

type Observer = Arc<dyn Fn(&AttemptRecord) + Send + Sync>;

/// Per-invocation settings: a diagnostic label, a cancellation token and an
/// optional observer that sees every attempt record as it is produced.
#[derive(Clone)]
pub struct RetryContext {
    label: String,
    cancel: CancellationToken,
    observer: Option<Observer>,
}

impl RetryContext {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            cancel: CancellationToken::new(),
            observer: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_observer(
        mut self,
        observer: impl Fn(&AttemptRecord) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn record(&self, history: &mut Vec<AttemptRecord>, record: AttemptRecord) {
        if let Some(observer) = &self.observer {
            observer(&record);
        }
        history.push(record);
    }
}

impl fmt::Debug for RetryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryContext")
            .field("label", &self.label)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Runs asynchronous operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryCoordinator {
    default_policy: RetryPolicy,
}

impl RetryCoordinator {
    pub fn new(default_policy: RetryPolicy) -> Self {
        Self { default_policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.default_policy
    }

    /// Runs `operation` under the coordinator's default policy.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: F,
        context: &RetryContext,
    ) -> Result<Retried<T>, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifiedError,
    {
        Self::with_retry(operation, &self.default_policy, context).await
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable kind,
    /// exhausts `policy.max_attempts`, or the context is cancelled.
    ///
    /// `operation` receives the 1-based attempt number. Cancellation drops the
    /// in-flight attempt or the pending delay at once; nothing runs after it.
    pub async fn with_retry<T, E, F, Fut>(
        mut operation: F,
        policy: &RetryPolicy,
        context: &RetryContext,
    ) -> Result<Retried<T>, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifiedError,
    {
        let mut history = Vec::new();
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = context.cancel.cancelled() => None,
                result = operation(attempt) => Some(result),
            };

            let Some(result) = outcome else {
                warn!(context = %context.label, attempt, "task cancelled during attempt");
                return Err(RetryError::Cancelled {
                    context: context.label.clone(),
                    attempt,
                    history,
                });
            };

            let failure = match result {
                Ok(value) => {
                    context.record(
                        &mut history,
                        AttemptRecord {
                            attempt,
                            error: None,
                            delay: None,
                        },
                    );
                    if attempt > 1 {
                        info!(context = %context.label, attempt, "task succeeded after retries");
                    } else {
                        debug!(context = %context.label, "task succeeded");
                    }
                    return Ok(Retried { value, history });
                }
                Err(failure) => failure,
            };

            if !policy.is_retryable(failure.kind()) {
                context.record(
                    &mut history,
                    AttemptRecord {
                        attempt,
                        error: Some(failure.to_string()),
                        delay: None,
                    },
                );
                warn!(
                    context = %context.label,
                    attempt,
                    kind = failure.kind(),
                    "non-retryable task failure"
                );
                return Err(RetryError::NonRetryable {
                    context: context.label.clone(),
                    attempt,
                    error: failure,
                    history,
                });
            }

            if attempt >= policy.max_attempts {
                context.record(
                    &mut history,
                    AttemptRecord {
                        attempt,
                        error: Some(failure.to_string()),
                        delay: None,
                    },
                );
                error!(
                    context = %context.label,
                    attempts = attempt,
                    error = %failure,
                    "retries exhausted"
                );
                return Err(RetryError::Exhausted {
                    context: context.label.clone(),
                    attempts: attempt,
                    error: failure,
                    history,
                });
            }

            let delay = policy.delay_for(attempt);
            warn!(
                context = %context.label,
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "task failed, retrying"
            );
            context.record(
                &mut history,
                AttemptRecord {
                    attempt,
                    error: Some(failure.to_string()),
                    delay: Some(delay),
                },
            );

            let cancelled = tokio::select! {
                biased;
                _ = context.cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                warn!(context = %context.label, attempt, "task cancelled during backoff");
                return Err(RetryError::Cancelled {
                    context: context.label.clone(),
                    attempt,
                    history,
                });
            }
            attempt += 1;
        }
    }
}
