//! Common test utilities for building workflow graphs.
use labflow::prelude::*;

/// Builds a graph from `(id, type)` nodes and `(source, target)` node-level connections.
///
/// Connection ids are `c0`, `c1`, ... in the given order.
#[allow(dead_code)]
pub fn graph_of(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> GraphModel {
    let mut graph = GraphModel::new();
    for (id, node_type) in nodes {
        graph
            .add_node(WorkflowNode::new(id, node_type))
            .expect("fixture node should be accepted");
    }
    for (i, (source, target)) in edges.iter().enumerate() {
        graph
            .add_connection(Connection::new(&format!("c{}", i), source, target))
            .expect("fixture connection should be accepted");
    }
    graph
}

/// `Start -> Mix -> End`
#[allow(dead_code)]
pub fn create_linear_graph() -> GraphModel {
    graph_of(
        &[("Start", "start"), ("Mix", "mix"), ("End", "end")],
        &[("Start", "Mix"), ("Mix", "End")],
    )
}

/// `A -> B -> C -> A`
#[allow(dead_code)]
pub fn create_cyclic_graph() -> GraphModel {
    graph_of(
        &[("A", "step"), ("B", "step"), ("C", "step")],
        &[("A", "B"), ("B", "C"), ("C", "A")],
    )
}

/// A hotplate step and a solution preparation step between start and end,
/// with typed ports and laboratory parameters.
#[allow(dead_code)]
pub fn create_lab_graph() -> GraphModel {
    let mut graph = GraphModel::new();
    graph
        .add_node(WorkflowNode::new("start", "start").with_output(PortDef::new("out", "any")))
        .unwrap();
    graph
        .add_node(
            WorkflowNode::new("prep", "solutionPreparation")
                .with_label("Prepare solution")
                .with_parameter("volume", 250)
                .with_parameter("source_labware", "vial_rack_2")
                .with_parameter("source_well", "A1")
                .with_input(PortDef::new("in", "any"))
                .with_output(PortDef::new("solution", "object")),
        )
        .unwrap();
    graph
        .add_node(
            WorkflowNode::new("heat", "hotplateControl")
                .with_label("Heat")
                .with_parameter("temperature", 80)
                .with_parameter("duration", 600)
                .with_parameter("retries", 5)
                .with_input(PortDef::new("sample", "json").required())
                .with_output(PortDef::new("temperature", "number")),
        )
        .unwrap();
    graph.add_node(WorkflowNode::new("end", "end").with_input(PortDef::new("in", "any"))).unwrap();

    graph.add_connection(Connection::new("e1", "start", "prep").with_ports("out", "in")).unwrap();
    graph
        .add_connection(Connection::new("e2", "prep", "heat").with_ports("solution", "sample"))
        .unwrap();
    graph
        .add_connection(
            Connection::new("e3", "heat", "end")
                .with_ports("temperature", "in")
                .with_condition(BranchCondition::new("temperature", "in", ">=", 75)),
        )
        .unwrap();
    graph
}

#[allow(dead_code)]
pub fn laboratory_engine() -> ValidationEngine {
    ValidationEngine::builder()
        .with_schemas(std::sync::Arc::new(SchemaRegistry::laboratory()))
        .build()
}

/// Editor document for `start -> wash -> end` plus a conditional edge.
#[allow(dead_code)]
pub const EDITOR_GRAPH_JSON: &str = r#"{
  "nodes": [
    { "id": "n1", "type": "start", "data": { "label": "Begin" }, "position": { "x": 0, "y": 0 } },
    {
      "id": "n2",
      "type": "wait",
      "data": {
        "label": "Settle",
        "parameters": { "duration": 30, "timeoutSeconds": 120 },
        "inputs": [{ "id": "in", "name": "Input", "dataType": "any" }],
        "outputs": [{ "id": "elapsed", "name": "Elapsed", "type": "number" }]
      },
      "position": { "x": 200, "y": 0 }
    },
    {
      "id": "n3",
      "type": "end",
      "data": { "label": "Finish", "inputs": [{ "id": "in", "dataType": "integer" }] },
      "position": { "x": 400, "y": 0 }
    }
  ],
  "edges": [
    { "id": "e1", "source": "n1", "target": "n2", "targetHandle": "in" },
    {
      "id": "e2",
      "source": "n2",
      "target": "n3",
      "sourceHandle": "elapsed",
      "targetHandle": "in",
      "data": { "condition": { "sourcePort": "elapsed", "targetPort": "in", "operator": ">", "value": 10 } }
    }
  ]
}"#;
