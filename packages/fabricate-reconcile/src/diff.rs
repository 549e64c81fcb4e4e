//! Matching and equality (§4.6 "diffing rules").

use std::collections::HashMap;

use fabricate_core::InstanceNode;

pub enum Diff {
    Create(InstanceNode),
    Update(InstanceNode),
    Noop,
    Delete(InstanceNode),
}

/// Compares two nodes the way the reconciler must: construct type, path, and props, ignoring
/// outputs and output signals (§4.6 "deep equality ignores outputs").
pub fn nodes_equal(a: &InstanceNode, b: &InstanceNode) -> bool {
    a.construct_type == b.construct_type && a.path == b.path && a.props == b.props
}

/// Matches `current` against `previous` by `reconcileKey` (§4.5) and classifies each pairing.
/// Returns one [`Diff`] per current node (in `current`'s order) followed by one [`Diff::Delete`]
/// per unmatched previous node, in `previous`'s order — callers needing deletes applied in reverse
/// of the last deployment order should reverse that tail themselves.
pub fn diff(previous: &[InstanceNode], current: &[InstanceNode]) -> Vec<Diff> {
    let mut previous_by_key: HashMap<&str, &InstanceNode> =
        previous.iter().map(|n| (n.reconcile_key.as_str(), n)).collect();

    let mut results = Vec::with_capacity(current.len());
    for node in current {
        match previous_by_key.remove(node.reconcile_key.as_str()) {
            None => results.push(Diff::Create(node.clone())),
            Some(prev) if nodes_equal(prev, node) => results.push(Diff::Noop),
            Some(_) => results.push(Diff::Update(node.clone())),
        }
    }

    for prev in previous {
        if previous_by_key.contains_key(prev.reconcile_key.as_str()) {
            results.push(Diff::Delete(prev.clone()));
        }
    }

    results
}
