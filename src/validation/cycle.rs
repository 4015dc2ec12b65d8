use super::{IssueKind, RuleContext, ValidationIssue, ValidationRule};
use crate::model::GraphSnapshot;
use ahash::AHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Reports every distinct cycle as `CYCLE_DETECTED`.
///
/// Depth-first search with an explicit stack of `(node, next edge)` frames and
/// white/gray/black marking, so deep graphs cannot exhaust the call stack.
/// An edge into a gray node closes a cycle made of the stack frames from that
/// node upward.
pub struct CycleRule;

impl ValidationRule for CycleRule {
    fn name(&self) -> &str {
        "cycle"
    }

    fn check(
        &self,
        snapshot: &GraphSnapshot,
        _context: &RuleContext<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let nodes = snapshot.nodes();
        let adjacency = snapshot.adjacency();
        let mut color = vec![Color::White; nodes.len()];
        let mut reported: AHashSet<Vec<usize>> = AHashSet::new();

        for root in 0..nodes.len() {
            if color[root] != Color::White {
                continue;
            }
            color[root] = Color::Gray;
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                if cursor == adjacency[node].len() {
                    color[node] = Color::Black;
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let next = adjacency[node][cursor];
                match color[next] {
                    Color::White => {
                        color[next] = Color::Gray;
                        stack.push((next, 0));
                    }
                    Color::Gray => {
                        let begin = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                        let members: Vec<usize> = stack[begin..].iter().map(|&(n, _)| n).collect();
                        let mut key = members.clone();
                        key.sort_unstable();
                        if !reported.insert(key) {
                            continue;
                        }
                        let ids: Vec<String> =
                            members.iter().map(|&i| nodes[i].id.clone()).collect();
                        let path = ids
                            .iter()
                            .chain(std::iter::once(&nodes[next].id))
                            .map(String::as_str)
                            .collect::<Vec<_>>()
                            .join(" -> ");
                        issues.push(
                            ValidationIssue::error(
                                IssueKind::CycleDetected,
                                format!("Cycle detected in workflow: {}", path),
                            )
                            .on_node(&nodes[next].id)
                            .with_cycle(ids),
                        );
                    }
                    Color::Black => {}
                }
            }
        }
    }
}
