//! Core render pipeline: elements, fibers, instance registry, and structural error handling.
//!
//! This crate owns everything in the spec's "Renderer" and "Instance registry" responsibilities;
//! the signal graph underneath it lives in `fabricate-reactive`, and diffing/deployment ordering
//! is handled one layer up in `fabricate-reconcile`.

mod element;
mod error;
mod fiber;
mod instance;
mod path;
mod props;
mod render;

pub use element::{ComponentFn, Element, ElementType};
pub use error::{RenderError, StructuralPanic};
pub use fiber::{flatten, FiberHandle, FiberNode};
pub use instance::{derive_reconcile_key, AccessorBundle, InstanceId, InstanceNode, InstanceRegistry};
pub use path::{id_from_path, kebab_case};
pub use props::{PropValue, Props};
pub use render::{run, use_instance};
