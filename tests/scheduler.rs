//! Tests for topological ordering, levels and dependency maps.
mod common;
use common::*;
use labflow::prelude::*;

#[cfg(test)]
mod scheduler_tests {
    use super::*;

    fn assert_respects_edges(graph: &GraphModel, order: &[String]) {
        let index = |id: &str| order.iter().position(|o| o == id).unwrap();
        for conn in graph.connections() {
            assert!(
                index(&conn.source_node_id) < index(&conn.target_node_id),
                "{} must precede {}",
                conn.source_node_id,
                conn.target_node_id
            );
        }
    }

    #[test]
    fn test_linear_order() {
        let order = TopologicalScheduler::order(&create_linear_graph().snapshot()).unwrap();
        assert_eq!(order, vec!["Start", "Mix", "End"]);
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let graph = graph_of(
            &[("r1", "s"), ("r2", "s"), ("x", "s"), ("y", "s")],
            &[("r2", "x"), ("r1", "y")],
        );
        let order = TopologicalScheduler::order(&graph.snapshot()).unwrap();
        assert_eq!(order, vec!["r1", "r2", "y", "x"]);
    }

    #[test]
    fn test_simultaneous_release_uses_insertion_order() {
        let graph = graph_of(
            &[("root", "s"), ("late", "s"), ("early", "s"), ("sink", "s")],
            &[("root", "early"), ("root", "late"), ("late", "sink"), ("early", "sink")],
        );
        let order = TopologicalScheduler::order(&graph.snapshot()).unwrap();
        assert_eq!(order, vec!["root", "late", "early", "sink"]);
    }

    #[test]
    fn test_order_respects_every_edge() {
        let graph = graph_of(
            &[("f", "s"), ("e", "s"), ("d", "s"), ("c", "s"), ("b", "s"), ("a", "s")],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("d", "e"), ("c", "f"), ("f", "e")],
        );
        let order = TopologicalScheduler::order(&graph.snapshot()).unwrap();
        assert_eq!(order.len(), 6);
        assert_respects_edges(&graph, &order);
    }

    #[test]
    fn test_order_is_deterministic() {
        let snapshot = create_lab_graph().snapshot();
        let first = TopologicalScheduler::order(&snapshot).unwrap();
        for _ in 0..5 {
            assert_eq!(TopologicalScheduler::order(&snapshot).unwrap(), first);
        }
    }

    #[test]
    fn test_cycle_fails_scheduling() {
        let err = TopologicalScheduler::order(&create_cyclic_graph().snapshot()).unwrap_err();
        let SchedulingError::CycleDetected { remaining } = err;
        assert_eq!(remaining, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_cycle_downstream_nodes_are_unscheduled() {
        let graph = graph_of(
            &[("ok", "s"), ("a", "s"), ("b", "s"), ("after", "s")],
            &[("ok", "a"), ("a", "b"), ("b", "a"), ("b", "after")],
        );
        let err = TopologicalScheduler::order(&graph.snapshot()).unwrap_err();
        let SchedulingError::CycleDetected { remaining } = err;
        assert_eq!(remaining, vec!["a", "b", "after"]);
        assert!(TopologicalScheduler::levels(&graph.snapshot()).is_err());
    }

    #[test]
    fn test_levels_group_independent_nodes() {
        let graph = graph_of(
            &[("r1", "s"), ("r2", "s"), ("x", "s"), ("y", "s"), ("z", "s")],
            &[("r2", "x"), ("r1", "y"), ("x", "z"), ("y", "z")],
        );
        let levels = TopologicalScheduler::levels(&graph.snapshot()).unwrap();
        assert_eq!(
            levels,
            vec![vec!["r1", "r2"], vec!["x", "y"], vec!["z"]]
        );
    }

    #[test]
    fn test_dependencies_are_reversed_and_deduplicated() {
        let mut graph = GraphModel::new();
        graph
            .add_node(
                WorkflowNode::new("a", "s")
                    .with_output(PortDef::new("o1", "any"))
                    .with_output(PortDef::new("o2", "any")),
            )
            .unwrap();
        graph.add_node(WorkflowNode::new("z", "s")).unwrap();
        graph
            .add_node(
                WorkflowNode::new("b", "s")
                    .with_input(PortDef::new("i1", "any"))
                    .with_input(PortDef::new("i2", "any")),
            )
            .unwrap();
        graph.add_connection(Connection::new("c1", "a", "b").with_ports("o1", "i1")).unwrap();
        graph.add_connection(Connection::new("c2", "z", "b")).unwrap();
        graph.add_connection(Connection::new("c3", "a", "b").with_ports("o2", "i2")).unwrap();

        let deps = TopologicalScheduler::dependencies(&graph.snapshot());
        assert_eq!(deps["b"], vec!["a", "z"]);
        assert!(deps["a"].is_empty());
        assert!(deps["z"].is_empty());
        assert_eq!(deps.len(), 3);
    }

    #[test]
    fn test_empty_graph() {
        let snapshot = GraphModel::new().snapshot();
        assert!(TopologicalScheduler::order(&snapshot).unwrap().is_empty());
        assert!(TopologicalScheduler::levels(&snapshot).unwrap().is_empty());
    }
}
