//! Plain configuration structures, loadable from JSON.
//!
//! A [`PlannerConfig`] is built once at process start and handed by reference
//! to the components that need it.

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;

/// Retry options as authored in configuration files (delays in milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: u64,
    pub max_delay: u64,
    pub backoff_factor: f64,
    pub retryable_errors: Vec<String>,
}

impl RetryConfig {
    pub const DEFAULT_RETRYABLE_ERRORS: [&'static str; 7] = [
        "NETWORK_ERROR",
        "TIMEOUT",
        "CONNECTION_RESET",
        "CONNECTION_REFUSED",
        "SERVICE_UNAVAILABLE",
        "RATE_LIMITED",
        "DEPLOYMENT_FAILED",
    ];

    /// Checks the options and converts them into a [`RetryPolicy`].
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        if self.max_attempts == 0 {
            return Err(invalid("maxAttempts", "must be at least 1"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(invalid(
                "backoffFactor",
                format!("must be a finite number >= 1, got {}", self.backoff_factor),
            ));
        }
        if self.initial_delay > self.max_delay {
            return Err(invalid(
                "initialDelay",
                format!(
                    "{} ms exceeds maxDelay of {} ms",
                    self.initial_delay, self.max_delay
                ),
            ));
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay_ms: self.initial_delay,
            max_delay_ms: self.max_delay,
            backoff_factor: self.backoff_factor,
            retryable_error_kinds: self.retryable_errors.iter().cloned().collect(),
        })
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: 1000,
            max_delay: 30_000,
            backoff_factor: 2.0,
            retryable_errors: Self::DEFAULT_RETRYABLE_ERRORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl TryFrom<&RetryConfig> for RetryPolicy {
    type Error = ConfigError;

    fn try_from(config: &RetryConfig) -> Result<Self, Self::Error> {
        config.to_policy()
    }
}

/// Task settings applied when a node does not override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDefaults {
    pub retries: u32,
    pub retry_delay_seconds: u32,
    pub timeout_seconds: u32,
}

impl TaskDefaults {
    /// Node parameters that override these defaults for a single task.
    pub const OVERRIDE_KEYS: [&'static str; 3] = ["retries", "retryDelaySeconds", "timeoutSeconds"];
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_seconds: 30,
            timeout_seconds: 3600,
        }
    }
}

/// Process-wide planner configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    pub retry: RetryConfig,
    pub task_defaults: TaskDefaults,
    /// Tags added to every compiled plan.
    pub tags: BTreeSet<String>,
}

impl PlannerConfig {
    /// Parses and checks a configuration document. Absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.retry.to_policy()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.retry.to_policy()
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}
