//! Tests for the validation engine and its rules.
mod common;
use common::*;
use labflow::prelude::*;
use labflow::validation::{ValidationIssue, ValidationRule, data_types_compatible};
use std::sync::Arc;

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_linear_graph_is_valid() {
        let result = ValidationEngine::default().validate(&create_linear_graph().snapshot());
        assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_lab_graph_is_valid_against_laboratory_schemas() {
        let result = laboratory_engine().validate(&create_lab_graph().snapshot());
        assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_cycle_is_reported_once_with_its_nodes() {
        let result = ValidationEngine::default().validate(&create_cyclic_graph().snapshot());
        assert!(!result.is_valid);

        let cycles = result.of_kind(IssueKind::CycleDetected);
        assert_eq!(cycles.len(), 1);
        let mut members = cycles[0].cycle.clone();
        members.sort();
        assert_eq!(members, vec!["A", "B", "C"]);
        assert_eq!(cycles[0].severity, Severity::Error);
        assert!(cycles[0].message.contains("A -> B -> C -> A"));
    }

    #[test]
    fn test_two_separate_cycles_are_both_reported() {
        let graph = graph_of(
            &[("s", "start"), ("a", "x"), ("b", "x"), ("c", "x"), ("d", "x"), ("e", "end")],
            &[("s", "a"), ("a", "b"), ("b", "a"), ("b", "c"), ("c", "d"), ("d", "c"), ("d", "e")],
        );
        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert_eq!(result.of_kind(IssueKind::CycleDetected).len(), 2);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let graph = graph_of(
            &[("s", "start"), ("a", "x"), ("e", "end")],
            &[("s", "a"), ("a", "a"), ("a", "e")],
        );
        let result = ValidationEngine::default().validate(&graph.snapshot());
        let cycles = result.of_kind(IssueKind::CycleDetected);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].cycle, vec!["a"]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..10_000).map(|i| format!("n{}", i)).collect();
        let mut graph = GraphModel::new();
        for id in &ids {
            graph.add_node(WorkflowNode::new(id, "step")).unwrap();
        }
        for pair in ids.windows(2) {
            graph
                .add_connection(Connection::new(
                    &format!("{}-{}", pair[0], pair[1]),
                    &pair[0],
                    &pair[1],
                ))
                .unwrap();
        }
        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert!(!result.has(IssueKind::CycleDetected));
        assert!(result.is_valid);
    }

    #[test]
    fn test_isolated_node_is_a_warning() {
        let mut graph = create_linear_graph();
        graph.add_node(WorkflowNode::new("Orphan", "mix")).unwrap();
        let result = ValidationEngine::default().validate(&graph.snapshot());

        assert!(result.is_valid);
        let isolated = result.of_kind(IssueKind::IsolatedNode);
        assert_eq!(isolated.len(), 1);
        assert_eq!(isolated[0].severity, Severity::Warning);
        assert_eq!(isolated[0].node_id.as_deref(), Some("Orphan"));
    }

    #[test]
    fn test_single_node_is_not_isolated() {
        let graph = graph_of(&[("only", "step")], &[]);
        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert!(!result.has(IssueKind::IsolatedNode));
    }

    #[test]
    fn test_empty_graph_misses_start_and_end() {
        let result = ValidationEngine::default().validate(&GraphModel::new().snapshot());
        assert!(!result.is_valid);
        assert_eq!(result.of_kind(IssueKind::MissingStartEnd).len(), 2);
    }

    #[test]
    fn test_unreachable_end_is_reported() {
        let graph = graph_of(
            &[("s", "start"), ("a", "x"), ("b", "x"), ("e", "end")],
            &[("s", "a"), ("b", "e")],
        );
        let result = ValidationEngine::default().validate(&graph.snapshot());
        let issues = result.of_kind(IssueKind::MissingStartEnd);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("reachable"));
    }

    #[test]
    fn test_start_and_end_fall_back_to_degree() {
        let graph = graph_of(&[("a", "x"), ("b", "x")], &[("a", "b")]);
        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert!(!result.has(IssueKind::MissingStartEnd));
    }

    #[test]
    fn test_colliding_task_names_are_errors() {
        let graph = graph_of(
            &[("Start", "start"), ("b_c", "a"), ("c", "a_b"), ("End", "end")],
            &[("Start", "b_c"), ("Start", "c"), ("b_c", "End"), ("c", "End")],
        );
        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert!(!result.is_valid);
        let clashes = result.of_kind(IssueKind::DuplicateTaskName);
        assert_eq!(clashes.len(), 1);
        assert_eq!(clashes[0].severity, Severity::Error);
        assert_eq!(
            clashes[0].message,
            "Nodes \"b_c\" and \"c\" both compile to task \"a_b_c\""
        );
    }

    #[test]
    fn test_underscored_names_without_collision_pass() {
        let graph = graph_of(
            &[("Start", "start"), ("mix_1", "hotplate_control"), ("End", "end")],
            &[("Start", "mix_1"), ("mix_1", "End")],
        );
        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert!(!result.has(IssueKind::DuplicateTaskName));
        assert!(result.is_valid);
    }

    #[test]
    fn test_role_types_are_configurable() {
        let graph = graph_of(&[("a", "Source"), ("b", "Sink")], &[("a", "b")]);
        let engine = ValidationEngine::builder()
            .with_roles(labflow::validation::RoleConvention {
                start_types: vec!["source".to_string()],
                end_types: vec!["sink".to_string()],
            })
            .build();
        assert!(engine.validate(&graph.snapshot()).is_valid);
    }

    #[test]
    fn test_incompatible_port_types() {
        let mut graph = GraphModel::new();
        graph
            .add_node(WorkflowNode::new("s", "start").with_output(PortDef::new("out", "boolean")))
            .unwrap();
        graph
            .add_node(WorkflowNode::new("e", "end").with_input(PortDef::new("in", "number")))
            .unwrap();
        graph.add_connection(Connection::new("c", "s", "e").with_ports("out", "in")).unwrap();

        let result = ValidationEngine::default().validate(&graph.snapshot());
        let issues = result.of_kind(IssueKind::InvalidConnection);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].connection_id.as_deref(), Some("c"));
        assert_eq!(issues[0].node_id.as_deref(), Some("e"));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_data_type_families() {
        assert!(data_types_compatible("number", "integer"));
        assert!(data_types_compatible("Float", "numeric"));
        assert!(data_types_compatible("csv", "string"));
        assert!(data_types_compatible("json", "object"));
        assert!(data_types_compatible("any", "boolean"));
        assert!(data_types_compatible("custom", "CUSTOM"));
        assert!(!data_types_compatible("number", "string"));
        assert!(!data_types_compatible("bool", "map"));
    }

    #[test]
    fn test_invalid_condition_is_an_invalid_connection() {
        let mut graph = create_linear_graph();
        graph
            .add_connection(
                Connection::new("cond", "Start", "End")
                    .with_condition(BranchCondition::new("out", "in", "??", 1)),
            )
            .unwrap();
        graph
            .add_connection(
                Connection::new("regex", "Mix", "Start")
                    .with_condition(BranchCondition::new("out", "in", "matches", "(")),
            )
            .unwrap();
        let result = ValidationEngine::default().validate(&graph.snapshot());
        let issues = result.of_kind(IssueKind::InvalidConnection);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("??"));
        assert!(issues[1].message.contains("malformed pattern"));
    }

    #[test]
    fn test_missing_required_connection_names_the_node() {
        let mut graph = GraphModel::new();
        graph
            .add_node(WorkflowNode::new("Start", "start").with_output(PortDef::new("out", "any")))
            .unwrap();
        graph
            .add_node(
                WorkflowNode::new("X", "step")
                    .with_input(PortDef::new("sample", "any").required())
                    .with_input(PortDef::new("trigger", "any")),
            )
            .unwrap();
        graph.add_node(WorkflowNode::new("End", "end")).unwrap();
        graph
            .add_connection(Connection::new("c1", "Start", "X").with_ports("out", "trigger"))
            .unwrap();
        graph.add_connection(Connection::new("c2", "X", "End")).unwrap();

        let result = ValidationEngine::default().validate(&graph.snapshot());
        assert!(!result.is_valid);
        let issues = result.of_kind(IssueKind::MissingRequiredConnection);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].node_id.as_deref(), Some("X"));
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_parameter_findings() {
        let mut graph = create_linear_graph();
        graph
            .add_node(
                WorkflowNode::new("heat", "hotplateControl")
                    .with_parameter("temperature", 500)
                    .with_parameter("stirringSpeed", 2.5)
                    .with_parameter("colour", "blue")
                    .with_parameter("timeoutSeconds", -1),
            )
            .unwrap();
        graph.add_connection(Connection::new("h1", "Mix", "heat")).unwrap();
        graph.add_connection(Connection::new("h2", "heat", "End")).unwrap();

        let result = laboratory_engine().validate(&graph.snapshot());
        assert!(!result.is_valid);

        let missing = result.of_kind(IssueKind::MissingRequiredParameter);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("duration"));

        let invalid: Vec<_> = result
            .errors
            .iter()
            .filter(|i| i.kind == IssueKind::InvalidParameter)
            .collect();
        assert_eq!(invalid.len(), 3);
        assert!(invalid.iter().any(|i| i.message.contains("maximum")));
        assert!(invalid.iter().any(|i| i.message.contains("integer")));
        assert!(invalid.iter().any(|i| i.message.contains("timeoutSeconds")));

        let info: Vec<_> = result
            .warnings
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .collect();
        assert_eq!(info.len(), 1);
        assert!(info[0].message.contains("colour"));
    }

    #[test]
    fn test_options_and_pattern_checks() {
        let mut graph = create_linear_graph();
        graph
            .add_node(
                WorkflowNode::new("prep", "solutionPreparation")
                    .with_parameter("volume", 100)
                    .with_parameter("source_labware", "bucket")
                    .with_parameter("source_well", "Z9")
                    .with_parameter("pipette_type", ""),
            )
            .unwrap();
        graph.add_connection(Connection::new("p1", "Mix", "prep")).unwrap();
        graph.add_connection(Connection::new("p2", "prep", "End")).unwrap();

        let result = laboratory_engine().validate(&graph.snapshot());
        let invalid = result.of_kind(IssueKind::InvalidParameter);
        assert_eq!(invalid.len(), 2);
        assert!(invalid.iter().any(|i| i.message.contains("bucket")));
        assert!(invalid.iter().any(|i| i.message.contains("pattern")));
        assert!(!result.has(IssueKind::MissingRequiredParameter));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut graph = create_cyclic_graph();
        graph.add_node(WorkflowNode::new("lonely", "x")).unwrap();
        let snapshot = graph.snapshot();
        let engine = laboratory_engine();

        let first = engine.validate(&snapshot);
        let second = engine.validate(&snapshot);
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_result_json_shape() {
        let result = ValidationEngine::default().validate(&create_cyclic_graph().snapshot());
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["isValid"], false);
        let first = &json["errors"][0];
        assert_eq!(first["type"], "CYCLE_DETECTED");
        assert_eq!(first["severity"], "ERROR");
        assert_eq!(first["nodeId"], "A");
        assert!(first.get("connectionId").is_none());
    }

    struct NoWaitRule;

    impl ValidationRule for NoWaitRule {
        fn name(&self) -> &str {
            "no-wait"
        }

        fn check(
            &self,
            snapshot: &GraphSnapshot,
            _context: &labflow::validation::RuleContext<'_>,
            issues: &mut Vec<ValidationIssue>,
        ) {
            for node in snapshot.nodes().iter().filter(|n| n.node_type == "wait") {
                issues.push(
                    ValidationIssue::warning(IssueKind::InvalidParameter, "waits are slow")
                        .on_node(&node.id),
                );
            }
        }
    }

    #[test]
    fn test_custom_rule_runs_after_builtins() {
        let mut graph = create_linear_graph();
        graph.add_node(WorkflowNode::new("pause", "wait")).unwrap();
        graph.add_connection(Connection::new("w", "Mix", "pause")).unwrap();
        graph.add_connection(Connection::new("w2", "pause", "End")).unwrap();

        let engine = ValidationEngine::builder()
            .with_schemas(Arc::new(SchemaRegistry::new()))
            .with_rule(Box::new(NoWaitRule))
            .build();
        let result = engine.validate(&graph.snapshot());
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].node_id.as_deref(), Some("pause"));
    }
}
