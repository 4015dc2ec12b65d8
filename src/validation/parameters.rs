use super::{IssueKind, RuleContext, ValidationIssue, ValidationRule};
use crate::config::TaskDefaults;
use crate::model::{GraphSnapshot, WorkflowNode};
use crate::schema::ParameterViolation;

/// Checks node parameters against their type's schema and the task override keys.
///
/// Nodes whose type has no registered schema only have their overrides checked.
pub struct ParameterRule;

impl ParameterRule {
    fn check_overrides(node: &WorkflowNode, issues: &mut Vec<ValidationIssue>) {
        for key in TaskDefaults::OVERRIDE_KEYS {
            let Some(value) = node.parameters.get(key) else {
                continue;
            };
            let valid = value
                .as_number()
                .is_some_and(|n| n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64);
            if !valid {
                issues.push(
                    ValidationIssue::error(
                        IssueKind::InvalidParameter,
                        format!(
                            "Parameter \"{}\" of {} must be a non-negative whole number, found '{}'",
                            key,
                            node.display_name(),
                            value
                        ),
                    )
                    .on_node(&node.id),
                );
            }
        }
    }
}

impl ValidationRule for ParameterRule {
    fn name(&self) -> &str {
        "parameters"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for node in snapshot.nodes() {
            Self::check_overrides(node, issues);

            let Some(schema) = context.schemas.get(&node.node_type) else {
                continue;
            };

            for spec in &schema.parameters {
                match spec.check(node.parameters.get(&spec.name)) {
                    None => {}
                    Some(ParameterViolation::Missing) => issues.push(
                        ValidationIssue::error(
                            IssueKind::MissingRequiredParameter,
                            format!(
                                "Required parameter \"{}\" of {} is not set",
                                spec.name,
                                node.display_name()
                            ),
                        )
                        .on_node(&node.id),
                    ),
                    Some(ParameterViolation::Invalid(reason)) => issues.push(
                        ValidationIssue::error(
                            IssueKind::InvalidParameter,
                            format!(
                                "Parameter \"{}\" of {}: {}",
                                spec.name,
                                node.display_name(),
                                reason
                            ),
                        )
                        .on_node(&node.id),
                    ),
                }
            }

            for name in node.parameters.keys() {
                let declared = schema.spec(name).is_some()
                    || TaskDefaults::OVERRIDE_KEYS.contains(&name.as_str());
                if !declared {
                    issues.push(
                        ValidationIssue::info(
                            IssueKind::InvalidParameter,
                            format!(
                                "Parameter \"{}\" is not declared for node type '{}'",
                                name, node.node_type
                            ),
                        )
                        .on_node(&node.id),
                    );
                }
            }
        }
    }
}
