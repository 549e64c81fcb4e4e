//! `ErrorBoundary` catches a panicking child render, renders the fallback, and recovers once
//! `reset()` is called and the underlying condition has cleared.
//!
//! This drives the render pipeline directly (not through `ConvergenceDriver`, which tears down
//! and rebuilds the whole reactive root on every iteration) because the boundary's recovery is a
//! property of one live root's reactivity, not of cross-run reconciliation.

use std::cell::RefCell;
use std::rc::Rc;

use fabricate::{component, create_root, create_signal, error_boundary, fragment, run, InstanceRegistry, Props};

#[test]
fn error_boundary_recovers_after_reset() {
    let root = create_root(|| {
        let should_fail = create_signal(true);
        let registry = Rc::new(InstanceRegistry::empty());

        let reset_cell: Rc<RefCell<Option<Rc<dyn Fn()>>>> = Rc::new(RefCell::new(None));
        let reset_cell_for_render = Rc::clone(&reset_cell);
        let fallback_hits = Rc::new(RefCell::new(0u32));
        let fallback_hits_for_render = Rc::clone(&fallback_hits);

        let element = component(
            "App",
            move |_props| {
                let should_fail = should_fail;
                let reset_cell = Rc::clone(&reset_cell_for_render);
                let fallback_hits = Rc::clone(&fallback_hits_for_render);
                error_boundary(
                    move || {
                        if should_fail.get() {
                            panic!("boom");
                        }
                        fragment(Vec::new())
                    },
                    move |_message, reset| {
                        *fallback_hits.borrow_mut() += 1;
                        *reset_cell.borrow_mut() = Some(reset);
                        fragment(Vec::new())
                    },
                )
            },
            Props::new(),
        );

        run(&element, &registry).expect("a caught panic is not a structural error");
        assert_eq!(*fallback_hits.borrow(), 1, "fallback renders once while the child keeps failing");

        should_fail.set(false);
        let reset = reset_cell.borrow_mut().take().expect("fallback should have captured reset");
        reset();

        assert_eq!(*fallback_hits.borrow(), 1, "resetting with the condition cleared should not re-enter the fallback");
    });
    root.dispose();
}
