//! Control-flow helper components (§6), implemented purely on top of the §4.1/§4.2 primitives —
//! none of these need special-cased renderer support.

use std::any::Any;
use std::rc::Rc;

use fabricate_core::{Element, StructuralPanic};
use fabricate_reactive::{create_signal, MaybeDyn, Signal};

use crate::element_factory::{component, fragment};

/// Renders `children()` while `when` is true, an empty fragment otherwise.
pub fn show(when: impl Into<MaybeDyn<bool>>, children: impl Fn() -> Element + 'static) -> Element {
    let when = when.into();
    component(
        "Show",
        move |_props| if when.get() { children() } else { fragment(Vec::new()) },
        fabricate_core::Props::new(),
    )
}

/// Keyed list rendering over a reactive source (§2 "For/Keyed"). `key_fn` derives the stable
/// identity that becomes each item's element key; `view_fn` renders one item.
pub fn for_keyed<T, K>(
    items: impl Into<MaybeDyn<Vec<T>>>,
    key_fn: impl Fn(&T) -> K + 'static,
    view_fn: impl Fn(T) -> Element + 'static,
) -> Element
where
    T: Clone + 'static,
    K: std::fmt::Display,
{
    let items = items.into();
    component(
        "For",
        move |_props| {
            let current = items.get();
            let mut children = Vec::with_capacity(current.len());
            for item in current {
                let key = key_fn(&item).to_string();
                let mut element = view_fn(item);
                element.key = Some(key);
                children.push(element);
            }
            fragment(children)
        },
        fabricate_core::Props::new(),
    )
}

/// One arm of a [`switch`]: rendered when `when()` is the first arm in the list to return true.
pub struct MatchArm {
    when: Rc<dyn Fn() -> bool>,
    render: Rc<dyn Fn() -> Element>,
}

pub fn match_arm(when: impl Fn() -> bool + 'static, render: impl Fn() -> Element + 'static) -> MatchArm {
    MatchArm { when: Rc::new(when), render: Rc::new(render) }
}

/// Renders the first arm whose `when` predicate is true, or an empty fragment if none match.
pub fn switch(arms: Vec<MatchArm>) -> Element {
    component(
        "Switch",
        move |_props| {
            for arm in &arms {
                if (arm.when)() {
                    return (arm.render)();
                }
            }
            fragment(Vec::new())
        },
        fabricate_core::Props::new(),
    )
}

/// Catches a panic raised while rendering `children` and renders `fallback` instead (§7
/// "Reactive"). Structural errors are deliberately not caught here — they stay fatal, consistent
/// with §7 treating them as pre-apply failures rather than recoverable render faults. `fallback`
/// receives the panic message and a `reset` callback that, when called, re-attempts `children` on
/// the boundary's next render.
///
/// `generation` is read (tracked) but never written from inside the render closure itself —
/// `reset` writes it from wherever the caller invokes it, always outside this closure's own
/// execution. Reading and writing the same signal within one synchronous render would otherwise
/// look like a self-referential cycle to the reactive graph.
pub fn error_boundary(
    children: impl Fn() -> Element + 'static,
    fallback: impl Fn(String, Rc<dyn Fn()>) -> Element + 'static,
) -> Element {
    let generation: Signal<u32> = create_signal(0);
    component(
        "ErrorBoundary",
        move |_props| {
            let _ = generation.get();
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(&children)) {
                Ok(element) => element,
                Err(payload) => {
                    if payload.downcast_ref::<StructuralPanic>().is_some() {
                        std::panic::resume_unwind(payload);
                    }
                    let message = panic_message(&payload);
                    let reset: Rc<dyn Fn()> =
                        Rc::new(move || generation.set(generation.get_untracked() + 1));
                    fallback(message, reset)
                }
            }
        },
        fabricate_core::Props::new(),
    )
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "render panicked with a non-string payload".to_string()
    }
}
