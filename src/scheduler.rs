use crate::error::SchedulingError;
use crate::model::GraphSnapshot;
use itertools::Itertools;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Computes deterministic execution orders for workflow graphs.
///
/// Ordering never trusts an earlier validation pass: a graph that still
/// contains a cycle is rejected with [`SchedulingError::CycleDetected`].
pub struct TopologicalScheduler;

impl TopologicalScheduler {
    /// Orders node ids so that every connection's source precedes its target.
    ///
    /// Kahn's algorithm over a FIFO queue. Ties are broken by node insertion
    /// order, both for the initial roots and for nodes released together.
    pub fn order(snapshot: &GraphSnapshot) -> Result<Vec<String>, SchedulingError> {
        let nodes = snapshot.nodes();
        let adjacency = snapshot.adjacency();
        let (mut in_degree, _) = snapshot.degrees();

        let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(current) = queue.pop_front() {
            order.push(current);
            let mut released = Vec::new();
            for &next in &adjacency[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    released.push(next);
                }
            }
            released.sort_unstable();
            queue.extend(released);
        }

        if order.len() < nodes.len() {
            let remaining = (0..nodes.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| nodes[i].id.clone())
                .collect();
            return Err(SchedulingError::CycleDetected { remaining });
        }

        debug!(nodes = order.len(), "computed topological order");
        Ok(order.into_iter().map(|i| nodes[i].id.clone()).collect())
    }

    /// Groups nodes into levels whose dependencies all lie in earlier levels.
    ///
    /// Nodes within one level may run concurrently. Each level keeps insertion order.
    pub fn levels(snapshot: &GraphSnapshot) -> Result<Vec<Vec<String>>, SchedulingError> {
        let nodes = snapshot.nodes();
        let adjacency = snapshot.adjacency();
        let (mut in_degree, _) = snapshot.degrees();

        let mut current: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut levels = Vec::new();
        let mut scheduled = 0;

        while !current.is_empty() {
            scheduled += current.len();
            let mut next_level = Vec::new();
            for &node in &current {
                for &next in &adjacency[node] {
                    in_degree[next] -= 1;
                    if in_degree[next] == 0 {
                        next_level.push(next);
                    }
                }
            }
            next_level.sort_unstable();
            levels.push(current.iter().map(|&i| nodes[i].id.clone()).collect());
            current = next_level;
        }

        if scheduled < nodes.len() {
            let remaining = (0..nodes.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| nodes[i].id.clone())
                .collect();
            return Err(SchedulingError::CycleDetected { remaining });
        }
        Ok(levels)
    }

    /// Maps every node to the distinct nodes it depends on (edges reversed).
    ///
    /// Parallel connections between the same pair count once. Dependencies are
    /// listed in insertion order; nodes without dependencies map to an empty list.
    pub fn dependencies(snapshot: &GraphSnapshot) -> BTreeMap<String, Vec<String>> {
        let nodes = snapshot.nodes();
        let mut sources: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for conn in snapshot.connections() {
            if let (Some(from), Some(to)) = (
                snapshot.position(&conn.source_node_id),
                snapshot.position(&conn.target_node_id),
            ) {
                sources[to].push(from);
            }
        }

        nodes
            .iter()
            .zip(sources)
            .map(|(node, from)| {
                let from = from
                    .into_iter()
                    .sorted_unstable()
                    .dedup()
                    .map(|i| nodes[i].id.clone())
                    .collect();
                (node.id.clone(), from)
            })
            .collect()
    }
}
