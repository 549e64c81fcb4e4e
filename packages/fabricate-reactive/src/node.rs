//! Reactive nodes: the slots of the reactive graph.

use std::any::Any;

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Identifies a single node (signal, memo, effect, or bare scope) in the reactive graph.
    pub struct NodeId;
}

/// A single node inside the reactive graph.
pub(crate) struct ReactiveNode {
    /// Value of the node, if any. Signals, memos, and scopes created purely for ownership (no
    /// value) leave this `None`.
    pub value: Option<Box<dyn Any>>,
    /// Callback re-run when the node is dirtied. `None` for plain signals and scopes, which are
    /// never recomputed, only written to directly.
    pub callback: Option<Box<dyn FnMut(&mut Box<dyn Any>) -> bool>>,
    /// Nodes owned by this node (child scopes, nested signals/memos created while this node's
    /// callback was running).
    pub children: Vec<NodeId>,
    /// The node that owns this node, or the null key at the top level.
    pub parent: NodeId,
    /// Nodes that depend on this node's value.
    pub dependents: Vec<NodeId>,
    /// Nodes that this node reads from. Rebuilt every time the callback runs.
    pub dependencies: Vec<NodeId>,
    /// Callbacks run (LIFO) before the next re-run and on disposal.
    pub cleanups: Vec<Box<dyn FnOnce()>>,
    /// Context values provided directly on this node.
    pub context: Vec<Box<dyn Any>>,
    pub state: NodeState,
    pub mark: Mark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    Dirty,
    Clean,
}

/// Marks used while depth-first-searching the dependency graph for a topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    /// Currently on the DFS stack; seeing this again means a cycle.
    Temp,
    /// DFS has finished with this node.
    Permanent,
    None,
}

/// A disposable handle to a node in a specific [`Root`](crate::Root).
#[derive(Clone, Copy)]
pub struct NodeHandle(pub(crate) NodeId, pub(crate) &'static crate::Root);

impl NodeHandle {
    /// Disposes of the node: runs its cleanups, disposes its children, and removes it from the
    /// graph. Disposing an already-disposed handle is a no-op.
    pub fn dispose(self) {
        if self.1.nodes.borrow().get(self.0).is_none() {
            return;
        }
        self.dispose_children();
        let parent = self.1.nodes.borrow()[self.0].parent;
        if !parent.is_null() {
            if let Some(parent_node) = self.1.nodes.borrow_mut().get_mut(parent) {
                parent_node.children.retain(|&id| id != self.0);
            }
        }
        let dependencies: Vec<_> = self.1.nodes.borrow_mut().remove(self.0).into_iter().flat_map(|n| n.dependencies).collect();
        for dep in dependencies {
            if let Some(dep_node) = self.1.nodes.borrow_mut().get_mut(dep) {
                dep_node.dependents.retain(|&id| id != self.0);
            }
        }
    }

    /// Runs this node's cleanups and disposes all of its children, without removing the node
    /// itself from the graph. Used before re-running a computation's callback.
    pub fn dispose_children(self) {
        let mut nodes = self.1.nodes.borrow_mut();
        let Some(node) = nodes.get_mut(self.0) else {
            return;
        };
        let cleanups = std::mem::take(&mut node.cleanups);
        let children = std::mem::take(&mut node.children);
        drop(nodes);
        for cb in cleanups.into_iter().rev() {
            cb();
        }
        for child in children.into_iter().rev() {
            NodeHandle(child, self.1).dispose();
        }
    }

    pub(crate) fn id(self) -> NodeId {
        self.0
    }
}
