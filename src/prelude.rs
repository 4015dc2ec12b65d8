//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load, validate, order and compile a
//! workflow graph, and to run plan tasks under a retry policy.

// Graph model and input formats
pub use crate::editor::{EditorGraph, IntoGraph};
pub use crate::model::{
    BranchCondition, Connection, GraphModel, GraphSnapshot, PortDef, SharedGraph, WorkflowNode,
};
pub use crate::schema::{ParamKind, ParameterSchema, ParameterSpec, SchemaRegistry};
pub use crate::value::{Parameters, Value};

// Validation, scheduling and compilation
pub use crate::compiler::{ExecutionPlan, PlanCompiler, TaskDefinition};
pub use crate::condition::ConditionEvaluator;
pub use crate::scheduler::TopologicalScheduler;
pub use crate::validation::{IssueKind, Severity, ValidationEngine, ValidationResult};

// Runtime support
pub use crate::config::{PlannerConfig, RetryConfig, TaskDefaults};
pub use crate::retry::{RetryContext, RetryCoordinator, RetryPolicy, TaskError};

// Error types
pub use crate::error::{
    CompileError, ConditionEvaluationError, ConfigError, ConversionError, GraphError, RetryError,
    SchedulingError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
