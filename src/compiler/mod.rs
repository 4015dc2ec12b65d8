//! Compiles validated graph snapshots into [`ExecutionPlan`]s.
//!
//! The compiler trusts its caller: it does not re-run validation, and the
//! order it is given must be a topological order of the same snapshot.

use crate::config::{PlannerConfig, TaskDefaults};
use crate::error::CompileError;
use crate::model::{GraphSnapshot, WorkflowNode};
use crate::scheduler::TopologicalScheduler;
use crate::value::{Parameters, Value};
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

mod plan;

pub use plan::{BranchEdge, ExecutionPlan, TaskDefinition};

pub struct PlanCompiler {
    name: String,
    defaults: TaskDefaults,
    tags: BTreeSet<String>,
    parameters: Parameters,
}

pub struct PlanCompilerBuilder {
    name: String,
    defaults: TaskDefaults,
    tags: BTreeSet<String>,
    parameters: Parameters,
}

impl PlanCompilerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            defaults: TaskDefaults::default(),
            tags: BTreeSet::new(),
            parameters: Parameters::new(),
        }
    }

    /// Takes task defaults and default plan tags from the planner configuration.
    pub fn with_config(mut self, config: &PlannerConfig) -> Self {
        self.defaults = config.task_defaults;
        self.tags.extend(config.tags.iter().cloned());
        self
    }

    pub fn with_task_defaults(mut self, defaults: TaskDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds a plan-level parameter passed through to the runner.
    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> PlanCompiler {
        PlanCompiler {
            name: self.name,
            defaults: self.defaults,
            tags: self.tags,
            parameters: self.parameters,
        }
    }
}

impl PlanCompiler {
    pub fn builder(name: &str) -> PlanCompilerBuilder {
        PlanCompilerBuilder::new(name)
    }

    /// The task name for a node: `{nodeType}_{nodeId}`.
    ///
    /// Depends only on the node, never on its position in the graph.
    pub fn task_name(node: &WorkflowNode) -> String {
        format!("{}_{}", node.node_type, node.id)
    }

    /// Orders `snapshot` and compiles it in one step.
    pub fn compile_snapshot(
        &self,
        snapshot: &GraphSnapshot,
    ) -> Result<ExecutionPlan, CompileError> {
        let order = TopologicalScheduler::order(snapshot)?;
        self.compile(snapshot, &order)
    }

    /// Emits one task per node in `order`, plus the reversed dependency map.
    pub fn compile(
        &self,
        snapshot: &GraphSnapshot,
        order: &[String],
    ) -> Result<ExecutionPlan, CompileError> {
        let mut names: AHashMap<&str, String> = AHashMap::with_capacity(order.len());
        let mut owners: AHashMap<String, &str> = AHashMap::with_capacity(order.len());
        let mut tasks = Vec::with_capacity(order.len());

        for node_id in order {
            let node = snapshot
                .node(node_id)
                .ok_or_else(|| CompileError::UnknownNode(node_id.clone()))?;
            let name = Self::task_name(node);
            if let Some(first) = owners.insert(name.clone(), &node.id) {
                return Err(CompileError::DuplicateTaskName {
                    name,
                    first: first.to_string(),
                    second: node.id.clone(),
                });
            }
            names.insert(&node.id, name.clone());
            tasks.push(self.task_for(node, name));
        }

        if let Some(missing) = snapshot
            .nodes()
            .iter()
            .find(|n| !names.contains_key(n.id.as_str()))
        {
            return Err(CompileError::MissingFromOrder(missing.id.clone()));
        }

        let task_of = |id: &str| names.get(id).cloned().unwrap_or_default();
        let dependencies: BTreeMap<String, Vec<String>> =
            TopologicalScheduler::dependencies(snapshot)
                .into_iter()
                .map(|(node, sources)| {
                    let sources: Vec<String> =
                        sources.iter().map(|s| task_of(s.as_str())).collect();
                    (task_of(node.as_str()), sources)
                })
                .collect();

        let branches: Vec<BranchEdge> = snapshot
            .connections()
            .iter()
            .filter_map(|conn| {
                conn.condition.as_ref().map(|condition| BranchEdge {
                    connection_id: conn.id.clone(),
                    source: task_of(conn.source_node_id.as_str()),
                    target: task_of(conn.target_node_id.as_str()),
                    condition: condition.clone(),
                })
            })
            .collect();

        debug!(plan = %self.name, tasks = tasks.len(), "compiled execution plan");
        Ok(ExecutionPlan {
            name: self.name.clone(),
            tasks,
            dependencies,
            branches,
            tags: self.tags.clone(),
            parameters: self.parameters.clone(),
        })
    }

    fn task_for(&self, node: &WorkflowNode, name: String) -> TaskDefinition {
        let mut parameters = node.parameters.clone();
        let mut take = |key: &str, default: u32| {
            parameters
                .remove(key)
                .and_then(|v| whole_number(&v))
                .unwrap_or(default)
        };
        let retries = take("retries", self.defaults.retries);
        let retry_delay_seconds = take("retryDelaySeconds", self.defaults.retry_delay_seconds);
        let timeout_seconds = take("timeoutSeconds", self.defaults.timeout_seconds);

        parameters.insert("nodeId".to_string(), Value::from(node.id.as_str()));
        parameters.insert("nodeType".to_string(), Value::from(node.node_type.as_str()));

        TaskDefinition {
            name,
            parameters,
            retries,
            retry_delay_seconds,
            timeout_seconds,
            tags: BTreeSet::from([format!("device_{}", node.node_type)]),
        }
    }
}

// Override values that validation would reject fall back to the default.
fn whole_number(value: &Value) -> Option<u32> {
    value
        .as_number()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}
