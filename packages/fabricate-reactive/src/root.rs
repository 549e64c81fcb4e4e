//! [`Root`]: the reactive graph itself, and the handful of free functions ([`create_root`],
//! [`batch`], [`untrack`], [`on_cleanup`]) that operate on the current one.

use std::cell::{Cell, RefCell};

use slotmap::{Key, SlotMap};

use crate::node::{Mark, NodeHandle, NodeId, NodeState, ReactiveNode};

/// Owns every signal, memo, effect, and scope created while it is the current root.
///
/// Only one `Root` is current on a given thread at a time (tracked via a thread-local). A `Root`
/// is leaked for the lifetime of the program; [`RootHandle::dispose`] tears down everything
/// created inside it without freeing the `Root` allocation itself, so that a fresh run can reuse
/// the same `&'static Root` (see [`resetRuntime`](crate) in the runtime crate).
pub(crate) struct Root {
    /// The node whose children new signals/computations are parented under.
    pub current_node: Cell<NodeId>,
    /// The node currently collecting dependencies, if any. `None` means untracked.
    pub current_tracker: Cell<Option<NodeId>>,
    pub root_node: Cell<NodeId>,
    pub nodes: RefCell<SlotMap<NodeId, ReactiveNode>>,
    /// Nodes written to during a `batch`, flushed when the outermost batch ends.
    pub pending_updates: RefCell<Vec<NodeId>>,
    pub batch_depth: Cell<u32>,
    /// Scratch buffer reused by `propagate_updates` to avoid reallocating on every write.
    rev_sorted_buf: RefCell<Vec<NodeId>>,
}

thread_local! {
    static GLOBAL_ROOT: Cell<Option<&'static Root>> = const { Cell::new(None) };
}

impl Root {
    #[cfg_attr(debug_assertions, track_caller)]
    pub fn global() -> &'static Root {
        GLOBAL_ROOT
            .with(|root| root.get())
            .expect("no reactive root found: are you inside `create_root`?")
    }

    pub fn set_global(root: Option<&'static Root>) -> Option<&'static Root> {
        GLOBAL_ROOT.with(|r| r.replace(root))
    }

    pub fn new_static() -> &'static Self {
        let this = Self {
            current_node: Cell::new(NodeId::null()),
            current_tracker: Cell::new(None),
            root_node: Cell::new(NodeId::null()),
            nodes: RefCell::new(SlotMap::default()),
            pending_updates: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            rev_sorted_buf: RefCell::new(Vec::new()),
        };
        let leaked: &'static Root = Box::leak(Box::new(this));
        leaked.reinit();
        leaked
    }

    /// Disposes everything owned by this root and re-creates the top-level scope, so the `Root`
    /// can be reused for another run.
    pub fn reinit(&'static self) {
        if !self.root_node.get().is_null() {
            NodeHandle(self.root_node.get(), self).dispose();
        }
        self.nodes.borrow_mut().clear();
        self.pending_updates.borrow_mut().clear();
        self.rev_sorted_buf.borrow_mut().clear();
        self.batch_depth.set(0);
        self.current_tracker.set(None);
        self.current_node.set(NodeId::null());

        let prev = Root::set_global(Some(self));
        let root = self.create_owned_scope();
        Root::set_global(prev);
        self.root_node.set(root);
        self.current_node.set(root);
    }

    /// Allocates a bare scope node (no value, no callback) parented under the current node.
    pub fn create_owned_scope(&'static self) -> NodeId {
        let parent = self.current_node.get();
        let id = self.nodes.borrow_mut().insert(ReactiveNode {
            value: None,
            callback: None,
            children: Vec::new(),
            parent,
            dependents: Vec::new(),
            dependencies: Vec::new(),
            cleanups: Vec::new(),
            context: Vec::new(),
            state: NodeState::Clean,
            mark: Mark::None,
        });
        if !parent.is_null() {
            if let Some(parent_node) = self.nodes.borrow_mut().get_mut(parent) {
                parent_node.children.push(id);
            }
        }
        id
    }

    pub fn create_child_scope(&'static self, f: impl FnOnce()) -> NodeHandle {
        let node = self.create_owned_scope();
        let prev_node = self.current_node.replace(node);
        let prev_tracker = self.current_tracker.replace(None);
        f();
        self.current_tracker.set(prev_tracker);
        self.current_node.set(prev_node);
        NodeHandle(node, self)
    }

    /// Runs `f` with `current_tracker` set to `node`, returning whatever `f` returns. Any signal
    /// read while `f` runs registers `node` as a dependent.
    pub fn tracked<T>(&'static self, node: NodeId, f: impl FnOnce() -> T) -> T {
        let prev = self.current_tracker.replace(Some(node));
        let ret = f();
        self.current_tracker.set(prev);
        ret
    }

    /// Re-runs the callback of a dirty computation node, rebuilding its dependency list and
    /// marking dependents dirty if the value changed. Also used for a computation's first run,
    /// right after it is inserted with `state: Dirty`.
    #[cfg_attr(feature = "trace", tracing::instrument(skip(self)))]
    pub(crate) fn run_node_update(&'static self, current: NodeId) {
        debug_assert_eq!(
            self.nodes.borrow()[current].state,
            NodeState::Dirty,
            "run_node_update called on a clean node"
        );
        // Tear down the old dependency links; they're rebuilt from scratch below.
        let old_deps = std::mem::take(&mut self.nodes.borrow_mut()[current].dependencies);
        for dep in old_deps {
            if let Some(dep_node) = self.nodes.borrow_mut().get_mut(dep) {
                dep_node.dependents.retain(|&id| id != current);
            }
        }

        // `callback`/`value` are held outside the node's slot while the callback runs. If a
        // write inside the callback re-enters this function for the same node (a cycle with no
        // intervening completed run), the slot is already empty here.
        let mut callback = self.nodes.borrow_mut()[current]
            .callback
            .take()
            .unwrap_or_else(|| panic!("cyclic reactive dependency detected"));
        let mut value = self.nodes.borrow_mut()[current].value.take();

        NodeHandle(current, self).dispose_children();

        let prev_node = self.current_node.replace(current);
        let changed = self.tracked(current, || {
            let cb = &mut callback;
            let val = value.as_mut().expect("computation missing value");
            cb(val)
        });
        self.current_node.set(prev_node);

        let mut nodes = self.nodes.borrow_mut();
        nodes[current].callback = Some(callback);
        nodes[current].value = value;
        nodes[current].state = NodeState::Clean;
        drop(nodes);

        if changed {
            self.mark_dependents_dirty(current);
        }
    }

    fn mark_dependents_dirty(&self, current: NodeId) {
        let dependents = self.nodes.borrow()[current].dependents.clone();
        for dependent in dependents {
            if let Some(node) = self.nodes.borrow_mut().get_mut(dependent) {
                node.state = NodeState::Dirty;
            }
        }
    }

    /// Depth-first search over `dependents`, pushing each node onto `buf` in post-order. Reading
    /// `buf` in reverse yields a valid topological order of the dependency graph rooted at the
    /// nodes that were dirtied.
    fn dfs(current: NodeId, nodes: &mut SlotMap<NodeId, ReactiveNode>, buf: &mut Vec<NodeId>) {
        let Some(node) = nodes.get_mut(current) else {
            return;
        };
        match node.mark {
            Mark::Temp => panic!("cyclic reactive dependency detected"),
            Mark::Permanent => return,
            Mark::None => {}
        }
        node.mark = Mark::Temp;

        let dependents = std::mem::take(&mut nodes.get_mut(current).unwrap().dependents);
        for &dependent in &dependents {
            Self::dfs(dependent, nodes, buf);
        }
        if let Some(node) = nodes.get_mut(current) {
            node.dependents = dependents;
            node.mark = Mark::Permanent;
        }
        buf.push(current);
    }

    fn propagate_from(&'static self, start_nodes: &[NodeId]) {
        let mut owned_buf = Vec::new();
        let mut shared = self.rev_sorted_buf.try_borrow_mut();
        let rev_sorted = match shared.as_mut() {
            Ok(buf) => {
                buf.clear();
                &mut **buf
            }
            Err(_) => &mut owned_buf,
        };

        for &node in start_nodes {
            Self::dfs(node, &mut self.nodes.borrow_mut(), rev_sorted);
        }
        for &node in start_nodes {
            self.mark_dependents_dirty(node);
        }

        for &node in rev_sorted.iter().rev() {
            let mut nodes = self.nodes.borrow_mut();
            let Some(n) = nodes.get_mut(node) else {
                continue;
            };
            n.mark = Mark::None;
            let dirty = n.state == NodeState::Dirty;
            drop(nodes);
            if dirty {
                self.run_node_update(node);
            }
        }
    }

    /// Called after a direct write to `start_node` (a plain signal). Propagates synchronously
    /// unless a batch is open, in which case the write is queued for the end of the batch.
    pub fn propagate_updates(&'static self, start_node: NodeId) {
        if self.batch_depth.get() > 0 {
            self.pending_updates.borrow_mut().push(start_node);
        } else {
            let prev = Root::set_global(Some(self));
            self.propagate_from(&[start_node]);
            Root::set_global(prev);
        }
    }

    /// Registers `dep` as a dependency of the node currently being tracked, if any. Called by
    /// every signal read.
    pub fn track_dependency(&self, dep: NodeId) {
        let Some(tracker) = self.current_tracker.get() else {
            return;
        };
        if tracker == dep {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        if let Some(node) = nodes.get_mut(tracker) {
            if !node.dependencies.contains(&dep) {
                node.dependencies.push(dep);
            } else {
                return;
            }
        } else {
            return;
        }
        if let Some(dep_node) = nodes.get_mut(dep) {
            if !dep_node.dependents.contains(&tracker) {
                dep_node.dependents.push(tracker);
            }
        }
    }

    fn start_batch(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
    }

    fn end_batch(&'static self) {
        let depth = self.batch_depth.get() - 1;
        self.batch_depth.set(depth);
        if depth == 0 {
            let pending = self.pending_updates.take();
            if !pending.is_empty() {
                self.propagate_from(&pending);
            }
        }
    }
}

/// A handle returned by [`create_root`] that can dispose or re-enter the root it was created
/// from.
#[derive(Clone, Copy)]
pub struct RootHandle {
    root: &'static Root,
}

impl RootHandle {
    /// Disposes everything created in this root: all signals, computations, and cleanups.
    pub fn dispose(&self) {
        self.root.reinit();
    }

    /// Runs `f` with this root as the current global root.
    pub fn run_in<T>(&self, f: impl FnOnce() -> T) -> T {
        let prev = Root::set_global(Some(self.root));
        let ret = f();
        Root::set_global(prev);
        ret
    }
}

/// Creates a new, independent reactive root and runs `f` inside it.
///
/// The returned [`RootHandle`] must eventually be [`dispose`](RootHandle::dispose)d to release
/// its resources; a long-lived process typically keeps one root alive for its entire lifetime and
/// relies on [`resetRuntime`](crate)-style re-initialization between runs instead of disposing.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// let root = create_root(|| {
///     let count = create_signal(0);
///     assert_eq!(count.get(), 0);
/// });
/// root.dispose();
/// ```
#[must_use = "dropping a RootHandle does not dispose it; call `.dispose()` explicitly"]
pub fn create_root(f: impl FnOnce()) -> RootHandle {
    let root = Root::new_static();
    let prev = Root::set_global(Some(root));
    f();
    Root::set_global(prev);
    RootHandle { root }
}

/// Creates a child scope owned by the current scope. Disposing the returned handle tears down
/// every signal/computation/cleanup created inside `f`, without affecting the parent scope.
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_child_scope(f: impl FnOnce()) -> NodeHandle {
    Root::global().create_child_scope(f)
}

/// Registers `f` to run when the current scope is disposed (or re-run, for a computation).
///
/// A no-op outside of any reactive scope, matching the teacher's convention that cleanup
/// registration is best-effort rather than an error condition.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    let root = Root::global();
    let current = root.current_node.get();
    if !current.is_null() {
        if let Some(node) = root.nodes.borrow_mut().get_mut(current) {
            node.cleanups.push(Box::new(f));
        }
    }
}

/// Groups signal writes so that dependent memos/effects run once after the whole closure
/// finishes, instead of once per write.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// let state = create_signal(1);
/// let double = create_memo(move || state.get() * 2);
/// batch(|| {
///     state.set(2);
///     assert_eq!(double.get(), 2); // still stale inside the batch
/// });
/// assert_eq!(double.get(), 4);
/// # });
/// # root.dispose();
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    let root = Root::global();
    root.start_batch();
    let ret = f();
    root.end_batch();
    ret
}

/// Runs `f` without registering any signal reads performed inside it as dependencies of the
/// enclosing computation.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let root = Root::global();
    let prev = root.current_tracker.replace(None);
    let ret = f();
    root.current_tracker.set(prev);
    ret
}

/// A handle to the scope currently executing, usable to dispose it early.
pub fn use_current_scope() -> NodeHandle {
    let root = Root::global();
    NodeHandle(root.current_node.get(), root)
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn cleanup_runs_on_dispose() {
        let root = create_root(|| {
            let cleaned = create_signal(false);
            let scope = create_child_scope(|| {
                on_cleanup(move || cleaned.set(true));
            });
            assert!(!cleaned.get());
            scope.dispose();
            assert!(cleaned.get());
        });
        root.dispose();
    }

    #[test]
    fn batch_runs_effects_once() {
        let root = create_root(|| {
            let a = create_signal(1);
            let b = create_signal(2);
            let runs = create_signal(0);
            create_effect(move || {
                runs.set(runs.get_untracked() + 1);
                let _ = a.get() + b.get();
            });
            assert_eq!(runs.get(), 1);
            batch(|| {
                a.set(10);
                b.set(20);
            });
            assert_eq!(runs.get(), 2);
        });
        root.dispose();
    }

    #[test]
    fn untrack_prevents_dependency() {
        let root = create_root(|| {
            let state = create_signal(1);
            let double = create_memo(move || untrack(|| state.get()) * 2);
            assert_eq!(double.get(), 2);
            state.set(5);
            assert_eq!(double.get(), 2);
        });
        root.dispose();
    }

    #[test]
    #[should_panic(expected = "cyclic reactive dependency")]
    fn cyclic_dependency_panics() {
        let root = create_root(|| {
            let a = create_signal(0);
            create_effect(move || {
                a.set(a.get() + 1);
            });
        });
        root.dispose();
    }
}
