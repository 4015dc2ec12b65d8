use crate::error::PlanFileError;
use crate::model::BranchCondition;
use crate::value::Parameters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

/// One compiled unit of work, derived from a single workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub parameters: Parameters,
    pub retries: u32,
    pub retry_delay_seconds: u32,
    pub timeout_seconds: u32,
    pub tags: BTreeSet<String>,
}

/// A conditional connection between two tasks.
///
/// The runner evaluates `condition` against the source task's output before
/// starting the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchEdge {
    pub connection_id: String,
    pub source: String,
    pub target: String,
    pub condition: BranchCondition,
}

/// The compiled, runner-agnostic description of a workflow.
///
/// `dependencies` maps every task name to the tasks that must complete before
/// it starts; root tasks map to an empty list. The field names are the wire
/// contract with external runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub name: String,
    pub tasks: Vec<TaskDefinition>,
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchEdge>,
    pub tags: BTreeSet<String>,
    pub parameters: Parameters,
}

impl ExecutionPlan {
    pub fn task(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Tasks without dependencies, in plan order. These may all start at once.
    pub fn roots(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| self.dependencies_of(&t.name).is_empty())
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn dependencies_of(&self, task: &str) -> &[String] {
        self.dependencies.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Conditional edges leading into `task`.
    pub fn branches_into<'a>(&'a self, task: &'a str) -> impl Iterator<Item = &'a BranchEdge> + 'a {
        self.branches.iter().filter(move |b| b.target == task)
    }

    pub fn to_json(&self) -> Result<String, PlanFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PlanFileError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the plan as pretty-printed JSON.
    pub fn save(&self, path: &str) -> Result<(), PlanFileError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| PlanFileError::Io {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, PlanFileError> {
        let json = fs::read_to_string(path).map_err(|source| PlanFileError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
