use super::{Connection, WorkflowNode};
use crate::error::GraphError;
use crate::schema::SchemaRegistry;
use ahash::AHashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Node and connection storage shared between a model and its snapshots.
#[derive(Debug, Clone, Default)]
struct GraphData {
    nodes: Vec<WorkflowNode>,
    index: AHashMap<String, usize>,
    connections: Vec<Connection>,
}

impl GraphData {
    fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }
}

/// The live, mutable workflow graph.
///
/// Nodes keep their insertion order, which the scheduler uses to break ties.
/// Mutations take `&mut self`, so a model has exactly one writer at a time;
/// wrap it in a [`SharedGraph`] to mutate it from several threads.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    data: Arc<GraphData>,
    schemas: Option<Arc<SchemaRegistry>>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model that type-checks node parameters against `schemas` on insertion.
    pub fn with_schemas(schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            data: Arc::default(),
            schemas: Some(schemas),
        }
    }

    pub fn add_node(&mut self, node: WorkflowNode) -> Result<(), GraphError> {
        if self.data.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        if let Some(schemas) = &self.schemas {
            schemas.check_types(&node)?;
        }
        let data = Arc::make_mut(&mut self.data);
        data.index.insert(node.id.clone(), data.nodes.len());
        data.nodes.push(node);
        Ok(())
    }

    /// Removes a node together with every connection that references it.
    pub fn remove_node(&mut self, id: &str) -> Result<WorkflowNode, GraphError> {
        let position = *self
            .data
            .index
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let data = Arc::make_mut(&mut self.data);
        let removed = data.nodes.remove(position);
        data.connections.retain(|c| !c.touches(id));
        data.reindex();
        Ok(removed)
    }

    pub fn add_connection(&mut self, connection: Connection) -> Result<(), GraphError> {
        if self.data.connections.iter().any(|c| c.id == connection.id) {
            return Err(GraphError::DuplicateConnectionId(connection.id));
        }

        let source = self.data.node(&connection.source_node_id).ok_or_else(|| {
            GraphError::UnknownNode {
                missing_node_id: connection.source_node_id.clone(),
                connection_id: connection.id.clone(),
            }
        })?;
        let target = self.data.node(&connection.target_node_id).ok_or_else(|| {
            GraphError::UnknownNode {
                missing_node_id: connection.target_node_id.clone(),
                connection_id: connection.id.clone(),
            }
        })?;

        if let Some(port_id) = &connection.source_port_id {
            if source.output_port(port_id).is_none() {
                let message = if source.input_port(port_id).is_some() {
                    format!("port '{}' is an input port and cannot be a source", port_id)
                } else {
                    format!("output port '{}' does not exist", port_id)
                };
                return Err(GraphError::InvalidEndpoint {
                    connection_id: connection.id.clone(),
                    node_id: source.id.clone(),
                    message,
                });
            }
        }
        if let Some(port_id) = &connection.target_port_id {
            if target.input_port(port_id).is_none() {
                let message = if target.output_port(port_id).is_some() {
                    format!("port '{}' is an output port and cannot be a target", port_id)
                } else {
                    format!("input port '{}' does not exist", port_id)
                };
                return Err(GraphError::InvalidEndpoint {
                    connection_id: connection.id.clone(),
                    node_id: target.id.clone(),
                    message,
                });
            }
        }

        if self
            .data
            .connections
            .iter()
            .any(|c| c.same_endpoints(&connection))
        {
            return Err(GraphError::DuplicateConnection {
                connection_id: connection.id,
            });
        }

        Arc::make_mut(&mut self.data).connections.push(connection);
        Ok(())
    }

    pub fn remove_connection(&mut self, id: &str) -> Result<Connection, GraphError> {
        let position = self
            .data
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| GraphError::ConnectionNotFound(id.to_string()))?;
        Ok(Arc::make_mut(&mut self.data).connections.remove(position))
    }

    /// Returns an immutable view of the current graph.
    ///
    /// Later mutations of this model copy the storage, so the snapshot never changes.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            data: Arc::clone(&self.data),
        }
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.data.node(id)
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.data.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.data.connections
    }
}

/// An immutable copy of a [`GraphModel`] consumed by validation, scheduling and compilation.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    data: Arc<GraphData>,
}

impl GraphSnapshot {
    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.data.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.data.connections
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.data.node(id)
    }

    /// Insertion position of a node.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.data.index.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.data.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.data.connections.len()
    }

    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.data
            .connections
            .iter()
            .filter(move |c| c.target_node_id == node_id)
    }

    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.data
            .connections
            .iter()
            .filter(move |c| c.source_node_id == node_id)
    }

    /// Successor positions for every node, in connection order.
    pub(crate) fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.data.nodes.len()];
        for conn in &self.data.connections {
            if let (Some(&from), Some(&to)) = (
                self.data.index.get(&conn.source_node_id),
                self.data.index.get(&conn.target_node_id),
            ) {
                adjacency[from].push(to);
            }
        }
        adjacency
    }

    /// In-degree and out-degree of every node, by position.
    pub(crate) fn degrees(&self) -> (Vec<usize>, Vec<usize>) {
        let adjacency = self.adjacency();
        let mut in_degree = vec![0usize; adjacency.len()];
        let out_degree = adjacency.iter().map(Vec::len).collect();
        for successors in &adjacency {
            for &to in successors {
                in_degree[to] += 1;
            }
        }
        (in_degree, out_degree)
    }
}

/// A thread-safe handle to a [`GraphModel`].
///
/// Mutations are serialized behind a write lock; `snapshot` takes a read lock
/// and therefore never observes a half-applied mutation such as a node whose
/// connections have not yet been removed.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<GraphModel>>,
}

impl SharedGraph {
    pub fn new(model: GraphModel) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    pub fn add_node(&self, node: WorkflowNode) -> Result<(), GraphError> {
        self.write(|model| model.add_node(node))
    }

    pub fn remove_node(&self, id: &str) -> Result<WorkflowNode, GraphError> {
        self.write(|model| model.remove_node(id))
    }

    pub fn add_connection(&self, connection: Connection) -> Result<(), GraphError> {
        self.write(|model| model.add_connection(connection))
    }

    pub fn remove_connection(&self, id: &str) -> Result<Connection, GraphError> {
        self.write(|model| model.remove_connection(id))
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        // Mutations fail before touching storage or complete in one step, so a
        // poisoned lock still guards a consistent model.
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    fn write<T>(&self, f: impl FnOnce(&mut GraphModel) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
