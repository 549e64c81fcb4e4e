//! Fabricate: a reactive resource-instance runtime. Renders a component tree describing desired
//! resource instances, reconciles it against the previous run, and drives it to convergence
//! against a [`Provider`]-backed external system (§4.7).
//!
//! Re-exports the signal graph from `fabricate-reactive`, the render pipeline from
//! `fabricate-core`, and the reconciler from `fabricate-reconcile` alongside this crate's own
//! convergence driver, so a caller only needs this one crate on its dependency line.

mod backend;
mod config;
mod control_flow;
mod driver;
mod element_factory;
mod error;
mod in_memory_backend;
mod provider;
mod serialize;

pub use backend::Backend;
pub use config::{ConvergenceOptions, RetryPolicy};
pub use control_flow::{error_boundary, for_keyed, match_arm, show, switch, MatchArm};
pub use driver::{CancellationToken, ConvergenceDriver};
pub use element_factory::{component, create_element, fragment, jsx, jsx_dev, jsxs, tag, Fragment};
pub use error::{BackendError, DriverError, ProviderError};
pub use in_memory_backend::InMemoryBackend;
pub use provider::Provider;
pub use serialize::{from_serialized, json_to_prop_value, prop_value_to_json, to_serialized, SerializedNode, SerializedState};

pub use fabricate_core::{
    derive_reconcile_key, flatten, id_from_path, kebab_case, run, use_instance, AccessorBundle,
    ComponentFn, Element, ElementType, FiberHandle, FiberNode, InstanceId, InstanceNode,
    InstanceRegistry, PropValue, Props, RenderError, StructuralPanic,
};
pub use fabricate_reactive::{
    batch, create_child_scope, create_context, create_effect, create_memo, create_reducer,
    create_root, create_selector, create_selector_with, create_signal, on_cleanup,
    provide_context, try_use_context, untrack, use_context, use_contexts, use_current_scope, on,
    Context, MaybeDyn, NodeHandle, ReadSignal, RootHandle, Signal, Trackable,
};
pub use fabricate_reconcile::{
    diff, nodes_equal, parallel_batches, reconcile, topological_order, ChangeSet, Diff,
    DependencyGraph, ReconcileError,
};

/// Drops the instance registry and signal graph and hands back control over a fresh [`RootHandle`]
/// (§6 "resetRuntime").
pub struct Runtime;

impl Runtime {
    pub fn reset(previous: RootHandle) -> RootHandle {
        previous.dispose();
        create_root(|| {})
    }
}
