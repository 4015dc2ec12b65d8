use crate::retry::AttemptRecord;
use thiserror::Error;

/// Errors raised by `GraphModel` mutations and editor-graph construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("A node with id '{0}' already exists in the graph")]
    DuplicateId(String),

    #[error("A connection with id '{0}' already exists in the graph")]
    DuplicateConnectionId(String),

    #[error(
        "Connection '{connection_id}' duplicates an existing connection between the same port pair"
    )]
    DuplicateConnection { connection_id: String },

    #[error("Connection '{connection_id}' has an invalid endpoint on node '{node_id}': {message}")]
    InvalidEndpoint {
        connection_id: String,
        node_id: String,
        message: String,
    },

    #[error("Node '{missing_node_id}' not found, which is required by connection '{connection_id}'")]
    UnknownNode {
        missing_node_id: String,
        connection_id: String,
    },

    #[error("No node with id '{0}' exists in the graph")]
    NodeNotFound(String),

    #[error("No connection with id '{0}' exists in the graph")]
    ConnectionNotFound(String),

    #[error(
        "Parameter '{parameter}' on node '{node_id}' has the wrong type: expected {expected}, found {found}"
    )]
    InvalidParameterType {
        node_id: String,
        parameter: String,
        expected: String,
        found: String,
    },
}

/// Raised when ordering is attempted on a graph that still contains a cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error(
        "Cycle detected: {} node(s) could not be scheduled: {}",
        .remaining.len(),
        .remaining.join(", ")
    )]
    CycleDetected { remaining: Vec<String> },
}

/// Errors raised while evaluating a branch condition.
///
/// `condition` identifies the offending condition as `sourcePort -> targetPort`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionEvaluationError {
    #[error("Condition '{condition}' uses an unrecognized operator '{operator}'")]
    UnknownOperator { condition: String, operator: String },

    #[error("Condition '{condition}' has a malformed pattern: {message}")]
    InvalidPattern { condition: String, message: String },
}

/// Errors that can occur while compiling a validated graph into an `ExecutionPlan`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Node '{0}' appears in the execution order but not in the graph")]
    UnknownNode(String),

    #[error("Node '{0}' is missing from the execution order")]
    MissingFromOrder(String),

    #[error("Task name '{name}' is produced by more than one node ('{first}' and '{second}')")]
    DuplicateTaskName {
        name: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

/// Terminal failures of a `RetryCoordinator` run.
///
/// Every variant carries the context label and the history of attempts made.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("{context}: non-retryable failure on attempt {attempt}: {error}")]
    NonRetryable {
        context: String,
        attempt: u32,
        error: E,
        history: Vec<AttemptRecord>,
    },

    #[error("{context}: retries exhausted after {attempts} attempt(s): {error}")]
    Exhausted {
        context: String,
        attempts: u32,
        error: E,
        history: Vec<AttemptRecord>,
    },

    #[error("{context}: cancelled after {attempt} attempt(s)")]
    Cancelled {
        context: String,
        attempt: u32,
        history: Vec<AttemptRecord>,
    },
}

impl<E> RetryError<E> {
    pub fn history(&self) -> &[AttemptRecord] {
        match self {
            RetryError::NonRetryable { history, .. }
            | RetryError::Exhausted { history, .. }
            | RetryError::Cancelled { history, .. } => history,
        }
    }

    /// Number of attempts that were started before the run ended.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::NonRetryable { attempt, .. } | RetryError::Cancelled { attempt, .. } => {
                *attempt
            }
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The wrapped task error, absent for cancellation.
    pub fn cause(&self) -> Option<&E> {
        match self {
            RetryError::NonRetryable { error, .. } | RetryError::Exhausted { error, .. } => {
                Some(error)
            }
            RetryError::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while saving or loading an `ExecutionPlan`.
#[derive(Error, Debug)]
pub enum PlanFileError {
    #[error("Could not access plan file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Plan JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when converting an editor or custom format into a `GraphModel`.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Could not read editor graph '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error("Malformed editor JSON: {0}")]
    Json(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
