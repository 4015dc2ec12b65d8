//! The graph editor's JSON document and its conversion into a [`GraphModel`].

use crate::error::ConversionError;
use crate::model::{Connection, GraphModel, WorkflowNode};
use crate::schema::SchemaRegistry;
use std::fs;
use std::sync::Arc;

mod types;

pub use types::*;

/// A trait for graph formats that can populate a [`GraphModel`].
///
/// [`EditorGraph`] implements it for the editor's JSON; implement it on your own
/// structs to feed other formats into validation and compilation.
pub trait IntoGraph: Sized {
    /// Adds this format's nodes and connections to `model`.
    fn populate(self, model: &mut GraphModel) -> Result<(), ConversionError>;

    fn into_graph(self) -> Result<GraphModel, ConversionError> {
        let mut model = GraphModel::new();
        self.populate(&mut model)?;
        Ok(model)
    }

    /// Like [`into_graph`](Self::into_graph), type-checking parameters against `schemas`.
    fn into_graph_with_schemas(
        self,
        schemas: Arc<SchemaRegistry>,
    ) -> Result<GraphModel, ConversionError> {
        let mut model = GraphModel::with_schemas(schemas);
        self.populate(&mut model)?;
        Ok(model)
    }
}

impl EditorGraph {
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))
    }

    pub fn from_file(path: &str) -> Result<Self, ConversionError> {
        let json = fs::read_to_string(path).map_err(|source| ConversionError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl IntoGraph for EditorGraph {
    fn populate(self, model: &mut GraphModel) -> Result<(), ConversionError> {
        for (index, node) in self.nodes.into_iter().enumerate() {
            if node.id.trim().is_empty() {
                return Err(ConversionError::ValidationError(format!(
                    "node at index {} has an empty id",
                    index
                )));
            }
            let label = node.data.label.unwrap_or_else(|| node.id.clone());
            let mut converted = WorkflowNode::new(&node.id, &node.node_type).with_label(&label);
            converted.parameters = node.data.parameters;
            converted.input_ports = node.data.inputs;
            converted.output_ports = node.data.outputs;
            model.add_node(converted)?;
        }

        for (index, edge) in self.edges.into_iter().enumerate() {
            let id = if edge.id.is_empty() {
                format!("edge-{}-{}-{}", edge.source, edge.target, index)
            } else {
                edge.id
            };
            let connection = Connection {
                id,
                source_node_id: edge.source,
                source_port_id: edge.source_handle.filter(|h| !h.is_empty()),
                target_node_id: edge.target,
                target_port_id: edge.target_handle.filter(|h| !h.is_empty()),
                condition: edge.data.and_then(|d| d.condition),
            };
            model.add_connection(connection)?;
        }
        Ok(())
    }
}
