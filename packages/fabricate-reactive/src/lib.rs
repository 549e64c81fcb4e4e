//! Fine-grained reactivity: signals, memos, effects, scopes, and context.
//!
//! This crate implements the signal graph that the rest of the workspace renders against. It has
//! no notion of components, instances, or providers — just a dependency graph of typed cells and
//! the propagation algorithm that keeps it consistent.

mod context;
mod effects;
mod memos;
mod node;
mod root;
mod signals;
mod utils;

pub(crate) use root::Root;

pub use context::{create_context, provide_context, try_use_context, use_context, use_contexts, Context};
pub use effects::create_effect;
pub use memos::{create_memo, create_reducer, create_selector, create_selector_with};
pub use node::NodeHandle;
pub use root::{batch, create_child_scope, create_root, on_cleanup, untrack, use_current_scope, RootHandle};
pub use signals::{create_signal, ReadSignal, Signal};
pub use utils::{on, MaybeDyn, Trackable};
