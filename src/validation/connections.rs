use super::{IssueKind, RuleContext, ValidationIssue, ValidationRule};
use crate::condition::ConditionEvaluator;
use crate::model::GraphSnapshot;

// Port data types that may be connected to one another.
const TYPE_FAMILIES: &[&[&str]] = &[
    &["number", "float", "integer", "numeric"],
    &["string", "text", "csv"],
    &["boolean", "bool"],
    &["object", "json", "map"],
];

/// Whether an output of type `source` may feed an input of type `target`.
///
/// `any` and undeclared types connect to everything.
pub fn data_types_compatible(source: &str, target: &str) -> bool {
    let source = source.trim().to_ascii_lowercase();
    let target = target.trim().to_ascii_lowercase();
    if source.is_empty() || target.is_empty() || source == "any" || target == "any" {
        return true;
    }
    source == target
        || TYPE_FAMILIES
            .iter()
            .any(|family| family.contains(&source.as_str()) && family.contains(&target.as_str()))
}

/// Flags connections whose port types clash or whose condition cannot be evaluated.
pub struct ConnectionTypeRule;

impl ValidationRule for ConnectionTypeRule {
    fn name(&self) -> &str {
        "connection-type"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        _context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for conn in snapshot.connections() {
            let source_port = snapshot
                .node(&conn.source_node_id)
                .zip(conn.source_port_id.as_deref())
                .and_then(|(node, port)| node.output_port(port));
            let target_port = snapshot
                .node(&conn.target_node_id)
                .zip(conn.target_port_id.as_deref())
                .and_then(|(node, port)| node.input_port(port));

            if let (Some(out), Some(inp)) = (source_port, target_port) {
                if !data_types_compatible(&out.data_type, &inp.data_type) {
                    issues.push(
                        ValidationIssue::error(
                            IssueKind::InvalidConnection,
                            format!(
                                "Type mismatch: cannot connect {} to {}",
                                out.data_type, inp.data_type
                            ),
                        )
                        .on_node(&conn.target_node_id)
                        .on_connection(&conn.id),
                    );
                }
            }

            if let Some(condition) = &conn.condition {
                if let Err(e) = ConditionEvaluator::check(condition) {
                    issues.push(
                        ValidationIssue::error(IssueKind::InvalidConnection, e.to_string())
                            .on_node(&conn.source_node_id)
                            .on_connection(&conn.id),
                    );
                }
            }
        }
    }
}

/// Flags required input ports with no incoming connection.
pub struct RequiredConnectionRule;

impl ValidationRule for RequiredConnectionRule {
    fn name(&self) -> &str {
        "required-connection"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        _context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for node in snapshot.nodes() {
            for port in node.input_ports.iter().filter(|p| p.required) {
                let connected = snapshot
                    .incoming(&node.id)
                    .any(|c| c.target_port_id.as_deref() == Some(port.id.as_str()));
                if !connected {
                    let port_name = if port.name.is_empty() { &port.id } else { &port.name };
                    issues.push(
                        ValidationIssue::error(
                            IssueKind::MissingRequiredConnection,
                            format!(
                                "Required input \"{}\" of {} is not connected",
                                port_name,
                                node.display_name()
                            ),
                        )
                        .on_node(&node.id),
                    );
                }
            }
        }
    }
}
