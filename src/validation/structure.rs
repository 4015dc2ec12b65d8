use super::{IssueKind, RuleContext, ValidationIssue, ValidationRule};
use crate::compiler::PlanCompiler;
use crate::model::{GraphSnapshot, WorkflowNode};
use ahash::AHashMap;
use std::collections::VecDeque;

/// Which node types mark the start and end of a workflow.
///
/// Matching is case-insensitive. When no node carries a start type, nodes
/// without incoming connections act as starts; ends fall back likewise to
/// nodes without outgoing connections.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleConvention {
    pub start_types: Vec<String>,
    pub end_types: Vec<String>,
}

impl Default for RoleConvention {
    fn default() -> Self {
        Self {
            start_types: vec!["start".to_string()],
            end_types: vec!["end".to_string()],
        }
    }
}

impl RoleConvention {
    pub fn is_start(&self, node: &WorkflowNode) -> bool {
        self.start_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&node.node_type))
    }

    pub fn is_end(&self, node: &WorkflowNode) -> bool {
        self.end_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&node.node_type))
    }
}

/// Warns about nodes with no connections in a graph of more than one node.
pub struct IsolatedNodeRule;

impl ValidationRule for IsolatedNodeRule {
    fn name(&self) -> &str {
        "isolated-node"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        _context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if snapshot.node_count() <= 1 {
            return;
        }
        let (in_degree, out_degree) = snapshot.degrees();
        for (i, node) in snapshot.nodes().iter().enumerate() {
            if in_degree[i] + out_degree[i] == 0 {
                issues.push(
                    ValidationIssue::warning(
                        IssueKind::IsolatedNode,
                        format!("Isolated node detected: {}", node.display_name()),
                    )
                    .on_node(&node.id),
                );
            }
        }
    }
}

/// Requires a start node and an end node reachable from it.
pub struct StartEndRule;

impl ValidationRule for StartEndRule {
    fn name(&self) -> &str {
        "start-end"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let nodes = snapshot.nodes();
        let roles = context.roles;
        let (in_degree, out_degree) = snapshot.degrees();

        let mut starts: Vec<usize> =
            (0..nodes.len()).filter(|&i| roles.is_start(&nodes[i])).collect();
        if starts.is_empty() {
            starts = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        }
        let mut ends: Vec<usize> = (0..nodes.len()).filter(|&i| roles.is_end(&nodes[i])).collect();
        if ends.is_empty() {
            ends = (0..nodes.len()).filter(|&i| out_degree[i] == 0).collect();
        }

        if starts.is_empty() {
            issues.push(ValidationIssue::error(
                IssueKind::MissingStartEnd,
                "Workflow must have at least one start node",
            ));
        }
        if ends.is_empty() {
            issues.push(ValidationIssue::error(
                IssueKind::MissingStartEnd,
                "Workflow must have at least one end node",
            ));
        }
        if starts.is_empty() || ends.is_empty() {
            return;
        }

        let adjacency = snapshot.adjacency();
        let mut reached = vec![false; nodes.len()];
        let mut queue: VecDeque<usize> = starts.iter().copied().collect();
        for &s in &starts {
            reached[s] = true;
        }
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if !reached[next] {
                    reached[next] = true;
                    queue.push_back(next);
                }
            }
        }

        if !ends.iter().any(|&e| reached[e]) {
            issues.push(ValidationIssue::error(
                IssueKind::MissingStartEnd,
                "No end node is reachable from a start node",
            ));
        }
    }
}

/// Rejects graphs where two nodes would compile to the same task name.
pub struct TaskNameRule;

impl ValidationRule for TaskNameRule {
    fn name(&self) -> &str {
        "task-name"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        _context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let mut owners: AHashMap<String, &str> = AHashMap::with_capacity(snapshot.node_count());
        for node in snapshot.nodes() {
            let name = PlanCompiler::task_name(node);
            if let Some(first) = owners.get(&name) {
                issues.push(
                    ValidationIssue::error(
                        IssueKind::DuplicateTaskName,
                        format!(
                            "Nodes \"{}\" and \"{}\" both compile to task \"{}\"",
                            first, node.id, name
                        ),
                    )
                    .on_node(&node.id),
                );
            } else {
                owners.insert(name, &node.id);
            }
        }
    }
}
