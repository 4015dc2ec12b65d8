use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A predicate attached to a connection that decides whether the target runs.
///
/// The operator is kept as authored; it is parsed when the condition is evaluated
/// so that an unrecognized operator can be reported instead of rejected on load.
/// Fields are private: a condition cannot change once attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCondition {
    source_port: String,
    #[serde(default)]
    target_port: String,
    operator: String,
    #[serde(default)]
    value: Value,
}

impl BranchCondition {
    pub fn new(
        source_port: &str,
        target_port: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            source_port: source_port.to_string(),
            target_port: target_port.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        }
    }

    pub fn source_port(&self) -> &str {
        &self.source_port
    }

    pub fn target_port(&self) -> &str {
        &self.target_port
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Identity used in error messages: `sourcePort -> targetPort`.
    pub fn identity(&self) -> String {
        format!("{} -> {}", self.source_port, self.target_port)
    }
}

/// A directed edge between two nodes, optionally pinned to specific ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_id: Option<String>,
    pub target_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<BranchCondition>,
}

impl Connection {
    pub fn new(id: &str, source_node_id: &str, target_node_id: &str) -> Self {
        Self {
            id: id.to_string(),
            source_node_id: source_node_id.to_string(),
            source_port_id: None,
            target_node_id: target_node_id.to_string(),
            target_port_id: None,
            condition: None,
        }
    }

    pub fn with_ports(mut self, source_port_id: &str, target_port_id: &str) -> Self {
        self.source_port_id = Some(source_port_id.to_string());
        self.target_port_id = Some(target_port_id.to_string());
        self
    }

    pub fn with_condition(mut self, condition: BranchCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }

    /// True when both connections join the same node pair through the same ports.
    pub fn same_endpoints(&self, other: &Connection) -> bool {
        self.source_node_id == other.source_node_id
            && self.target_node_id == other.target_node_id
            && self.source_port_id == other.source_port_id
            && self.target_port_id == other.target_port_id
    }
}
