//! Dependency graph, topological ordering, and parallel batching (§4.6).

use std::collections::{BinaryHeap, HashMap};

use fabricate_core::{InstanceId, InstanceNode};

use crate::error::ReconcileError;

/// Adjacency maps over the set of nodes being deployed this pass. A node's dependencies are every
/// other node whose path is a strict prefix of its own (§4.6: "ancestor-path-prefix instance
/// nodes") — the node nested deeper in the fiber tree can only exist once its ancestor's instance
/// has been declared, so it must deploy after it.
pub struct DependencyGraph {
    pub dependencies: HashMap<InstanceId, Vec<InstanceId>>,
    pub dependents: HashMap<InstanceId, Vec<InstanceId>>,
}

impl DependencyGraph {
    pub fn build(nodes: &[InstanceNode]) -> Self {
        let mut dependencies: HashMap<InstanceId, Vec<InstanceId>> = HashMap::new();
        let mut dependents: HashMap<InstanceId, Vec<InstanceId>> = HashMap::new();

        for node in nodes {
            dependencies.entry(node.id.clone()).or_default();
            dependents.entry(node.id.clone()).or_default();
        }

        for node in nodes {
            for candidate in nodes {
                if candidate.id == node.id {
                    continue;
                }
                if is_strict_prefix(&candidate.path, &node.path) {
                    dependencies.get_mut(&node.id).unwrap().push(candidate.id.clone());
                    dependents.get_mut(&candidate.id).unwrap().push(node.id.clone());
                }
            }
        }

        Self { dependencies, dependents }
    }
}

fn is_strict_prefix(maybe_prefix: &[String], path: &[String]) -> bool {
    maybe_prefix.len() < path.len() && path[..maybe_prefix.len()] == *maybe_prefix
}

/// Kahn's algorithm with lexicographic id tie-breaking (§4.6), so that the order is deterministic
/// across runs that produce the same node set.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<InstanceId>, ReconcileError> {
    let mut in_degree: HashMap<InstanceId, usize> = graph
        .dependencies
        .iter()
        .map(|(id, deps)| (id.clone(), deps.len()))
        .collect();

    let mut ready: BinaryHeap<std::cmp::Reverse<InstanceId>> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| std::cmp::Reverse(id.clone()))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(std::cmp::Reverse(id)) = ready.pop() {
        order.push(id.clone());
        if let Some(dependents) = graph.dependents.get(&id) {
            for dependent in dependents {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.push(std::cmp::Reverse(dependent.clone()));
                }
            }
        }
    }

    if order.len() != in_degree.len() {
        return Err(ReconcileError::CyclicDependency);
    }
    Ok(order)
}

/// Groups `order` into parallel batches: a node's batch index is `1 + max(dependency depths)`,
/// with depth-1 batches (no dependencies) running first (§4.6).
pub fn parallel_batches(graph: &DependencyGraph, order: &[InstanceId]) -> Vec<Vec<InstanceId>> {
    let mut depth: HashMap<InstanceId, usize> = HashMap::new();
    for id in order {
        let deps = graph.dependencies.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let d = 1 + deps.iter().map(|dep| depth.get(dep).copied().unwrap_or(0)).max().unwrap_or(0);
        depth.insert(id.clone(), d);
    }

    let max_depth = depth.values().copied().max().unwrap_or(0);
    let mut batches = vec![Vec::new(); max_depth];
    for id in order {
        let d = depth[id];
        batches[d - 1].push(id.clone());
    }
    batches
}
