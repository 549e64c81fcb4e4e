//! Diffing two render passes into a [`ChangeSet`] with a valid deployment order (§4.6).

mod changeset;
mod diff;
mod error;
mod graph;

pub use changeset::ChangeSet;
pub use diff::{diff, nodes_equal, Diff};
pub use error::ReconcileError;
pub use graph::{parallel_batches, topological_order, DependencyGraph};

use fabricate_core::InstanceNode;

/// Computes the change set to move from `previous` to `current`. `previous` must be in the order
/// it was last successfully deployed in, since deletes are applied in the reverse of that order
/// (§4.6 "delete ordering").
pub fn reconcile(
    previous: &[InstanceNode],
    current: &[InstanceNode],
) -> Result<ChangeSet, ReconcileError> {
    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut deletes = Vec::new();

    for item in diff::diff(previous, current) {
        match item {
            Diff::Create(node) => creates.push(node),
            Diff::Update(node) => updates.push(node),
            Diff::Noop => {}
            Diff::Delete(node) => deletes.push(node),
        }
    }

    deletes.sort_by_key(|node| {
        previous
            .iter()
            .position(|p| p.id == node.id)
            .unwrap_or(usize::MAX)
    });
    deletes.reverse();

    let to_deploy: Vec<InstanceNode> = creates.iter().chain(updates.iter()).cloned().collect();
    let graph = DependencyGraph::build(&to_deploy);
    let deployment_order = topological_order(&graph)?;
    let parallel_batches = parallel_batches(&graph, &deployment_order);

    Ok(ChangeSet {
        creates,
        updates,
        deletes,
        deployment_order,
        parallel_batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabricate_core::{PropValue, Props};
    use indexmap::IndexMap;

    fn node(id: &str, path: &[&str], reconcile_key: &str) -> InstanceNode {
        let mut props = Props::new();
        props.insert("name".to_string(), PropValue::string(id));
        InstanceNode::new(
            id.to_string(),
            path.iter().map(|s| s.to_string()).collect(),
            "Test".to_string(),
            props,
            reconcile_key.to_string(),
            IndexMap::new(),
        )
    }

    #[test]
    fn reconcile_with_itself_is_empty() {
        let nodes = vec![node("db", &["db"], "db-key"), node("api", &["api"], "api-key")];
        let changeset = reconcile(&nodes, &nodes).unwrap();
        assert!(changeset.is_empty());
    }

    #[test]
    fn chain_of_three_nested_nodes_deploys_in_three_batches() {
        let nodes = vec![
            node("a", &["a"], "a-key"),
            node("a.b", &["a", "b"], "b-key"),
            node("a.b.c", &["a", "b", "c"], "c-key"),
        ];
        let changeset = reconcile(&[], &nodes).unwrap();
        assert_eq!(changeset.creates.len(), 3);
        assert_eq!(changeset.parallel_batches.len(), 3);
        assert_eq!(
            changeset.deployment_order,
            vec!["a".to_string(), "a.b".to_string(), "a.b.c".to_string()]
        );
    }

    #[test]
    fn reconcile_delete_orders_after_creates_and_updates() {
        let previous = vec![
            node("db", &["db"], "db-key"),
            node("cache", &["cache"], "cache-key"),
            node("api", &["api"], "api-key"),
        ];
        let current = vec![node("db", &["db"], "db-key"), node("api", &["api"], "api-key")];
        let changeset = reconcile(&previous, &current).unwrap();
        assert_eq!(changeset.deletes.len(), 1);
        assert_eq!(changeset.deletes[0].id, "cache");
    }
}
