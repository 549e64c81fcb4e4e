//! [`provide_context`] / [`use_context`]: values attached to a scope and inherited by its
//! descendants.

use crate::root::Root;
use slotmap::Key;

/// Attaches `value` to the current scope. Descendant scopes can retrieve it with
/// [`use_context`]/[`try_use_context`]; sibling and ancestor scopes cannot see it.
///
/// # Example
/// ```
/// # use fabricate_reactive::*;
/// # let root = create_root(|| {
/// provide_context(42i32);
/// create_child_scope(|| {
///     assert_eq!(use_context::<i32>(), 42);
/// });
/// # });
/// # root.dispose();
/// ```
pub fn provide_context<T: 'static>(value: T) {
    let root = Root::global();
    let current = root.current_node.get();
    if let Some(node) = root.nodes.borrow_mut().get_mut(current) {
        node.context.push(Box::new(value));
    }
}

/// Walks up from the current scope looking for a value of type `T` provided with
/// [`provide_context`], returning `None` if no ancestor provided one.
pub fn try_use_context<T: Clone + 'static>() -> Option<T> {
    let root = Root::global();
    let mut current = root.current_node.get();
    loop {
        if current.is_null() {
            return None;
        }
        let nodes = root.nodes.borrow();
        let node = nodes.get(current)?;
        if let Some(found) = node
            .context
            .iter()
            .rev()
            .find_map(|ctx| ctx.downcast_ref::<T>())
        {
            return Some(found.clone());
        }
        let parent = node.parent;
        drop(nodes);
        current = parent;
    }
}

/// A context as a (default value, current-value stack) pair. `create_context` hands back a
/// `Context<T>` carrying the default; [`Context::get`] reads the top of the ancestor-provided
/// stack for `T`, falling back to the default when no ancestor called [`Context::provide`] (or
/// the bare [`provide_context`]) for that type.
#[derive(Clone)]
pub struct Context<T> {
    default: T,
}

impl<T: Clone + 'static> Context<T> {
    /// Provides `value` on the current scope, shadowing the default for descendants.
    pub fn provide(&self, value: T) {
        provide_context(value);
    }

    /// Returns the nearest ancestor-provided value, or the default if none was provided.
    pub fn get(&self) -> T {
        try_use_context::<T>().unwrap_or_else(|| self.default.clone())
    }
}

/// Creates a context with a default value (§3 "Context", §6 `createContext`). The returned handle
/// is a plain value, not tied to any scope; call [`Context::provide`] inside a scope to shadow the
/// default for its descendants, and [`Context::get`] anywhere to read it.
pub fn create_context<T: Clone + 'static>(default: T) -> Context<T> {
    Context { default }
}

/// Like [`try_use_context`], but panics if no ancestor provided a value of type `T`.
#[cfg_attr(debug_assertions, track_caller)]
pub fn use_context<T: Clone + 'static>() -> T {
    try_use_context().unwrap_or_else(|| {
        panic!(
            "no context of type `{}` found in any ancestor scope",
            std::any::type_name::<T>()
        )
    })
}

/// Walks up from the current scope running `f` with each context value of type `T`, outermost
/// last. Useful when more than one ancestor provides the same context type and all of them
/// matter (e.g. nested error boundaries).
pub fn use_contexts<T: Clone + 'static>() -> Vec<T> {
    let root = Root::global();
    let mut current = root.current_node.get();
    let mut found = Vec::new();
    while !current.is_null() {
        let nodes = root.nodes.borrow();
        let Some(node) = nodes.get(current) else {
            break;
        };
        for ctx in node.context.iter().rev() {
            if let Some(value) = ctx.downcast_ref::<T>() {
                found.push(value.clone());
            }
        }
        let parent = node.parent;
        drop(nodes);
        current = parent;
    }
    found
}
