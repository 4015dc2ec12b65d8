use crate::value::{Parameters, Value};
use serde::{Deserialize, Serialize};

/// A typed attachment point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "any_data_type", alias = "type")]
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
}

fn any_data_type() -> String {
    "any".to_string()
}

impl PortDef {
    pub fn new(id: &str, data_type: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            data_type: data_type.to_string(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// A single laboratory operation in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub input_ports: Vec<PortDef>,
    #[serde(default)]
    pub output_ports: Vec<PortDef>,
}

impl WorkflowNode {
    /// Creates a node with no parameters or ports, labelled with its id.
    pub fn new(id: &str, node_type: &str) -> Self {
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            label: id.to_string(),
            parameters: Parameters::new(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_input(mut self, port: PortDef) -> Self {
        self.input_ports.push(port);
        self
    }

    pub fn with_output(mut self, port: PortDef) -> Self {
        self.output_ports.push(port);
        self
    }

    pub fn input_port(&self, port_id: &str) -> Option<&PortDef> {
        self.input_ports.iter().find(|p| p.id == port_id)
    }

    pub fn output_port(&self, port_id: &str) -> Option<&PortDef> {
        self.output_ports.iter().find(|p| p.id == port_id)
    }

    /// A human-readable name for diagnostics.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}
