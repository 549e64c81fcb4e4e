//! [`Signal`] and [`ReadSignal`]: the leaves of the reactive graph.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use crate::node::{Mark, NodeId, NodeState, ReactiveNode};
use crate::root::Root;
use slotmap::Key;

/// A read-only view of a signal. Obtained from [`Signal::split`] or by passing a [`Signal`]
/// anywhere a `ReadSignal` is expected (it derefs via [`Signal`]'s inner field).
pub struct ReadSignal<T> {
    id: NodeId,
    root: &'static Root,
    _marker: PhantomData<Cell<T>>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ReadSignal<T> {}

impl<T: 'static> ReadSignal<T> {
    fn with_node<R>(self, f: impl FnOnce(&ReactiveNode) -> R) -> R {
        let nodes = self.root.nodes.borrow();
        let node = nodes
            .get(self.id)
            .expect("signal used after its scope was disposed");
        f(node)
    }

    /// Registers this signal as a dependency of the current computation, without reading the
    /// value.
    pub fn track(self) {
        self.root.track_dependency(self.id);
    }

    /// Reads the value, registering a dependency. Requires `T: Clone`; use [`Self::with`] to
    /// avoid cloning.
    pub fn get(self) -> T
    where
        T: Clone,
    {
        self.track();
        self.get_untracked()
    }

    /// Reads the value without registering a dependency.
    pub fn get_untracked(self) -> T
    where
        T: Clone,
    {
        self.with_untracked(T::clone)
    }

    /// Calls `f` with a reference to the value, registering a dependency.
    pub fn with<R>(self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        self.with_untracked(f)
    }

    /// Calls `f` with a reference to the value without registering a dependency.
    ///
    /// Panics if called on a memo/selector that has not completed its first run yet (not
    /// reachable through the public API: memos always run once, synchronously, before
    /// [`create_memo`](crate::create_memo) returns).
    pub fn with_untracked<R>(self, f: impl FnOnce(&T) -> R) -> R {
        self.with_node(|node| {
            let value = node
                .value
                .as_ref()
                .expect("signal node missing its value")
                .downcast_ref::<Option<T>>()
                .expect("signal type mismatch")
                .as_ref()
                .expect("memo read before its first run completed");
            f(value)
        })
    }

    /// `true` if the scope that created this signal has not been disposed.
    pub fn is_alive(self) -> bool {
        self.root.nodes.borrow().contains_key(self.id)
    }

    pub(crate) fn id(self) -> NodeId {
        self.id
    }
}

/// A mutable reactive cell. Writing to it (via [`Self::set`] or similar) marks every computation
/// that has read it dirty, per [`propagate_updates`](crate::root::Root::propagate_updates).
pub struct Signal<T> {
    inner: ReadSignal<T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Signal<T> {}

impl<T: 'static> Signal<T> {
    pub fn track(self) {
        self.inner.track();
    }
    pub fn get(self) -> T
    where
        T: Clone,
    {
        self.inner.get()
    }
    pub fn get_untracked(self) -> T
    where
        T: Clone,
    {
        self.inner.get_untracked()
    }
    pub fn with<R>(self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }
    pub fn with_untracked<R>(self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with_untracked(f)
    }
    pub fn is_alive(self) -> bool {
        self.inner.is_alive()
    }

    /// Splits into a read-only handle and leaves `self` as the writable one. Both refer to the
    /// same underlying node.
    pub fn split(self) -> (ReadSignal<T>, Self) {
        (self.inner, self)
    }

    /// Overwrites the value and notifies dependents unconditionally.
    pub fn set(self, value: T) {
        self.update(move |slot| {
            *slot = value;
            true
        });
    }

    /// Like [`Self::set`], but does not notify dependents (they will read the stale value on
    /// their next run).
    pub fn set_silent(self, value: T) {
        self.update(move |slot| {
            *slot = value;
            false
        });
    }

    /// Replaces the value, returning the old one.
    pub fn replace(self, value: T) -> T {
        let mut incoming = Some(value);
        let mut old = None;
        self.update(|slot| {
            old = Some(std::mem::replace(slot, incoming.take().unwrap()));
            true
        });
        old.expect("update closure did not run")
    }

    /// Applies `f` to the current value in place, notifying dependents unconditionally.
    pub fn update(self, f: impl FnOnce(&mut T) -> bool) {
        let id = self.inner.id();
        let root = self.inner.root;
        let changed = {
            let mut nodes = root.nodes.borrow_mut();
            let node = nodes
                .get_mut(id)
                .expect("signal used after its scope was disposed");
            let value = node
                .value
                .as_mut()
                .expect("signal node missing its value")
                .downcast_mut::<Option<T>>()
                .expect("signal type mismatch")
                .as_mut()
                .expect("signal node missing its value");
            f(value)
        };
        if changed {
            root.propagate_updates(id);
        }
    }

    /// Maps this signal's value through `f` each time it changes, creating a new memo.
    pub fn map<U: PartialEq + 'static>(self, mut f: impl FnMut(&T) -> U + 'static) -> ReadSignal<U> {
        crate::memos::create_memo(move || self.with(&mut f))
    }
}

/// Creates a new signal with the given initial value, owned by the current scope.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// let count = create_signal(0);
/// assert_eq!(count.get(), 0);
/// count.set(1);
/// assert_eq!(count.get(), 1);
/// # });
/// # root.dispose();
/// ```
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_signal<T: 'static>(value: T) -> Signal<T> {
    let root = Root::global();
    let id = root.nodes.borrow_mut().insert(ReactiveNode {
        value: Some(Box::new(Some(value)) as Box<dyn Any>),
        callback: None,
        children: Vec::new(),
        parent: root.current_node.get(),
        dependents: Vec::new(),
        dependencies: Vec::new(),
        cleanups: Vec::new(),
        context: Vec::new(),
        state: NodeState::Clean,
        mark: Mark::None,
    });
    let parent = root.current_node.get();
    if !parent.is_null() {
        if let Some(parent_node) = root.nodes.borrow_mut().get_mut(parent) {
            parent_node.children.push(id);
        }
    }
    Signal {
        inner: ReadSignal {
            id,
            root,
            _marker: PhantomData,
        },
    }
}

impl<T> ReadSignal<T> {
    pub(crate) fn from_node(id: NodeId, root: &'static Root) -> Self {
        Self {
            id,
            root,
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_untracked(|v| f.debug_tuple("Signal").field(v).finish())
    }
}

impl<T: fmt::Display + Clone + 'static> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_untracked(|v| fmt::Display::fmt(v, f))
    }
}

impl<T: PartialEq + Clone + 'static> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get_untracked() == other.get_untracked()
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn signal_get_set() {
        let root = create_root(|| {
            let s = create_signal(1);
            assert_eq!(s.get(), 1);
            s.set(2);
            assert_eq!(s.get(), 2);
        });
        root.dispose();
    }

    #[test]
    fn signal_set_silent_does_not_notify() {
        let root = create_root(|| {
            let s = create_signal(1);
            let runs = create_signal(0);
            create_effect(move || {
                s.get();
                runs.set(runs.get_untracked() + 1);
            });
            assert_eq!(runs.get_untracked(), 1);
            s.set_silent(2);
            assert_eq!(runs.get_untracked(), 1);
            assert_eq!(s.get_untracked(), 2);
        });
        root.dispose();
    }

    #[test]
    fn signal_map() {
        let root = create_root(|| {
            let s = create_signal(2);
            let doubled = s.map(|v| v * 2);
            assert_eq!(doubled.get(), 4);
            s.set(3);
            assert_eq!(doubled.get(), 6);
        });
        root.dispose();
    }

    #[test]
    fn signal_split() {
        let root = create_root(|| {
            let s = create_signal(1);
            let (read, write) = s.split();
            write.set(5);
            assert_eq!(read.get(), 5);
        });
        root.dispose();
    }
}
