use crate::model::{BranchCondition, PortDef};
use crate::value::Parameters;
use serde::{Deserialize, Serialize};

/// Node payload as sent by the graph editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorNodeData {
    pub label: Option<String>,
    pub parameters: Parameters,
    #[serde(alias = "inputPorts")]
    pub inputs: Vec<PortDef>,
    #[serde(alias = "outputPorts")]
    pub outputs: Vec<PortDef>,
}

/// Editor node. Layout fields such as `position` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: EditorNodeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorEdgeData {
    pub condition: Option<BranchCondition>,
}

/// Editor edge. `sourceHandle` / `targetHandle` name ports when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorEdge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, alias = "sourceHandle")]
    pub source_handle: Option<String>,
    #[serde(default, alias = "targetHandle")]
    pub target_handle: Option<String>,
    #[serde(default)]
    pub data: Option<EditorEdgeData>,
}

/// The complete graph document produced by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorGraph {
    #[serde(default)]
    pub nodes: Vec<EditorNode>,
    #[serde(default)]
    pub edges: Vec<EditorEdge>,
}
