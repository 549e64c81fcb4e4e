//! Derived values: [`create_memo`], [`create_selector`], and [`create_reducer`].

use std::any::Any;
use std::rc::Rc;

use slotmap::Key;

use crate::node::{Mark, NodeState, ReactiveNode};
use crate::root::Root;
use crate::signals::{create_signal, ReadSignal};

/// Creates a computation that re-runs `f` whenever one of its dependencies changes, caching the
/// result and only notifying its own dependents when the result actually changed (by
/// `PartialEq`).
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// let a = create_signal(1);
/// let b = create_signal(2);
/// let sum = create_memo(move || a.get() + b.get());
/// assert_eq!(sum.get(), 3);
/// a.set(10);
/// assert_eq!(sum.get(), 12);
/// # });
/// # root.dispose();
/// ```
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_memo<T: PartialEq + 'static>(f: impl FnMut() -> T + 'static) -> ReadSignal<T> {
    create_selector_with(f, T::eq)
}

/// Like [`create_memo`], but allows a custom equality function instead of `PartialEq`.
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_selector_with<T: 'static>(
    mut f: impl FnMut() -> T + 'static,
    eq: impl Fn(&T, &T) -> bool + 'static,
) -> ReadSignal<T> {
    let root = Root::global();
    let parent = root.current_node.get();

    // The value is wrapped in `Option` so the slot holds a well-typed, downcastable value
    // (`None`) even before the callback has run for the first time.
    let callback: Box<dyn FnMut(&mut Box<dyn Any>) -> bool> = Box::new(move |value| {
        let new_value = f();
        let slot = value
            .downcast_mut::<Option<T>>()
            .expect("memo node type mismatch");
        match slot {
            Some(old) if eq(old, &new_value) => false,
            _ => {
                *slot = Some(new_value);
                true
            }
        }
    });

    let id = root.nodes.borrow_mut().insert(ReactiveNode {
        value: Some(Box::new(Option::<T>::None)),
        callback: Some(callback),
        children: Vec::new(),
        parent,
        dependents: Vec::new(),
        dependencies: Vec::new(),
        cleanups: Vec::new(),
        context: Vec::new(),
        state: NodeState::Dirty,
        mark: Mark::None,
    });
    if !parent.is_null() {
        if let Some(parent_node) = root.nodes.borrow_mut().get_mut(parent) {
            parent_node.children.push(id);
        }
    }

    root.run_node_update(id);

    ReadSignal::from_node(id, root)
}

/// Alias for [`create_memo`], for call sites that read as "the current matching value" rather
/// than "the derived value" — both are the same primitive.
pub fn create_selector<T: PartialEq + 'static>(f: impl FnMut() -> T + 'static) -> ReadSignal<T> {
    create_memo(f)
}

/// Creates a `(state, dispatch)` pair, where `dispatch(msg)` applies `reduce` to the current
/// state to produce the next one.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// let (count, dispatch) = create_reducer(0, |count, delta: i32| count + delta);
/// dispatch(3);
/// assert_eq!(count.get(), 3);
/// # });
/// # root.dispose();
/// ```
pub fn create_reducer<T: 'static, Msg: 'static>(
    initial: T,
    reduce: impl Fn(&T, Msg) -> T + 'static,
) -> (ReadSignal<T>, impl Fn(Msg)) {
    let signal = create_signal(initial);
    let reduce = Rc::new(reduce);
    let dispatch = move |msg: Msg| {
        let reduce = Rc::clone(&reduce);
        signal.update(move |value| {
            *value = reduce(value, msg);
            true
        });
    };
    (signal.split().0, dispatch)
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn memo_runs_once_eagerly() {
        let root = create_root(|| {
            let runs = create_signal(0);
            let a = create_signal(1);
            let _memo = create_memo(move || {
                runs.set(runs.get_untracked() + 1);
                a.get() * 2
            });
            assert_eq!(runs.get_untracked(), 1);
        });
        root.dispose();
    }

    #[test]
    fn memo_suppresses_equal_updates() {
        let root = create_root(|| {
            let a = create_signal(1);
            let parity = create_memo(move || a.get() % 2);
            let runs = create_signal(0);
            create_effect(move || {
                parity.get();
                runs.set(runs.get_untracked() + 1);
            });
            assert_eq!(runs.get_untracked(), 1);
            a.set(3); // still odd, parity unchanged
            assert_eq!(runs.get_untracked(), 1);
            a.set(4); // now even, parity changes
            assert_eq!(runs.get_untracked(), 2);
        });
        root.dispose();
    }

    #[test]
    fn dependency_on_memo() {
        let root = create_root(|| {
            let a = create_signal(1);
            let doubled = create_memo(move || a.get() * 2);
            let quadrupled = create_memo(move || doubled.get() * 2);
            assert_eq!(quadrupled.get(), 4);
            a.set(2);
            assert_eq!(quadrupled.get(), 8);
        });
        root.dispose();
    }

    #[test]
    fn reducer_dispatch() {
        let root = create_root(|| {
            let (count, dispatch) = create_reducer(10, |count, delta: i32| count + delta);
            dispatch(5);
            dispatch(-3);
            assert_eq!(count.get(), 12);
        });
        root.dispose();
    }
}
