//! Structural and semantic validation of workflow graphs.
//!
//! A [`ValidationEngine`] runs a fixed, ordered list of [`ValidationRule`]s over
//! a [`GraphSnapshot`] and collects every finding. Findings are data, never
//! errors: a graph with ERROR findings is reported as invalid and must not be
//! compiled, while WARNING and INFO findings are surfaced but do not block.

use crate::model::GraphSnapshot;
use crate::schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

mod connections;
mod cycle;
mod parameters;
mod structure;

pub use connections::{ConnectionTypeRule, RequiredConnectionRule, data_types_compatible};
pub use cycle::CycleRule;
pub use parameters::ParameterRule;
pub use structure::{IsolatedNodeRule, RoleConvention, StartEndRule, TaskNameRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    CycleDetected,
    IsolatedNode,
    MissingStartEnd,
    InvalidConnection,
    MissingRequiredConnection,
    InvalidParameter,
    MissingRequiredParameter,
    DuplicateTaskName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single validation finding, shaped for inline display by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// Node ids on the cycle, for `CYCLE_DETECTED` findings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            node_id: None,
            connection_id: None,
            cycle: Vec::new(),
        }
    }

    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    pub fn info(kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Info, message)
    }

    pub fn on_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.to_string());
        self
    }

    pub fn on_connection(mut self, connection_id: &str) -> Self {
        self.connection_id = Some(connection_id.to_string());
        self
    }

    pub fn with_cycle(mut self, cycle: Vec<String>) -> Self {
        self.cycle = cycle;
        self
    }
}

/// The outcome of validating one snapshot.
///
/// `errors` holds ERROR findings; `warnings` holds WARNING and INFO findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// All findings, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues().any(|issue| issue.kind == kind)
    }

    pub fn of_kind(&self, kind: IssueKind) -> Vec<&ValidationIssue> {
        self.issues().filter(|issue| issue.kind == kind).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Shared inputs available to every rule.
pub struct RuleContext<'a> {
    pub schemas: &'a SchemaRegistry,
    pub roles: &'a RoleConvention,
}

/// Defines the contract for one independent validation check.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;
    fn check(
        &self,
        snapshot: &GraphSnapshot,
        context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    );
}

/// Runs the rule set over graph snapshots.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
    schemas: Arc<SchemaRegistry>,
    roles: RoleConvention,
}

pub struct ValidationEngineBuilder {
    rules: Vec<Box<dyn ValidationRule>>,
    schemas: Arc<SchemaRegistry>,
    roles: RoleConvention,
}

impl ValidationEngineBuilder {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            schemas: Arc::new(SchemaRegistry::new()),
            roles: RoleConvention::default(),
        }
    }

    pub fn with_schemas(mut self, schemas: Arc<SchemaRegistry>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_roles(mut self, roles: RoleConvention) -> Self {
        self.roles = roles;
        self
    }

    /// Appends a rule that runs after the built-in ones.
    pub fn with_rule(mut self, rule: Box<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> ValidationEngine {
        ValidationEngine {
            rules: self.rules,
            schemas: self.schemas,
            roles: self.roles,
        }
    }
}

impl Default for ValidationEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        ValidationEngineBuilder::new().build()
    }
}

fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(CycleRule),
        Box::new(IsolatedNodeRule),
        Box::new(StartEndRule),
        Box::new(ConnectionTypeRule),
        Box::new(RequiredConnectionRule),
        Box::new(ParameterRule),
        Box::new(TaskNameRule),
    ]
}

impl ValidationEngine {
    pub fn builder() -> ValidationEngineBuilder {
        ValidationEngineBuilder::new()
    }

    /// Runs every rule in order and accumulates all findings.
    pub fn validate(&self, snapshot: &GraphSnapshot) -> ValidationResult {
        let context = RuleContext {
            schemas: &self.schemas,
            roles: &self.roles,
        };
        let mut issues = Vec::new();
        for rule in &self.rules {
            let before = issues.len();
            rule.check(snapshot, &context, &mut issues);
            debug!(
                rule = rule.name(),
                findings = issues.len() - before,
                "validation rule finished"
            );
        }
        ValidationResult::from_issues(issues)
    }
}
