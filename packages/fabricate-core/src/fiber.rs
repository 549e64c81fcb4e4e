//! [`FiberNode`]: the intermediate per-component node produced during render (§3 "Fiber").

use std::cell::RefCell;
use std::rc::Rc;

use crate::instance::{InstanceId, InstanceNode, InstanceRegistry};

/// A live node in the fiber tree. Component fibers are owned by a dedicated reactive computation
/// that rewrites this struct's `instance_ids`/`children` in place whenever it re-runs, so the
/// tree always reflects the latest render without the driver needing to rebuild it from scratch.
#[derive(Debug)]
pub struct FiberNode {
    pub label: String,
    pub path: Vec<String>,
    pub key: Option<String>,
    pub instance_ids: Vec<InstanceId>,
    pub children: Vec<FiberHandle>,
    /// Set when this fiber's last render hit a `useInstance` call with an undefined prop (§4.4):
    /// at least one declared instance didn't materialize this pass.
    pub placeholder: bool,
}

pub type FiberHandle = Rc<RefCell<FiberNode>>;

impl FiberNode {
    pub fn new_handle(label: String, path: Vec<String>, key: Option<String>) -> FiberHandle {
        Rc::new(RefCell::new(FiberNode {
            label,
            path,
            key,
            instance_ids: Vec::new(),
            children: Vec::new(),
            placeholder: false,
        }))
    }
}

/// Walks the live fiber tree pre-order, resolving each referenced id against `registry.current`
/// to produce the flattened list the spec calls "the output of a pass" (§4.2).
pub fn flatten(root: &FiberHandle, registry: &InstanceRegistry) -> Vec<InstanceNode> {
    let mut out = Vec::new();
    flatten_into(root, registry, &mut out);
    out
}

fn flatten_into(fiber: &FiberHandle, registry: &InstanceRegistry, out: &mut Vec<InstanceNode>) {
    let fiber = fiber.borrow();
    let current = registry.current.borrow();
    for id in &fiber.instance_ids {
        if let Some(node) = current.get(id) {
            out.push(node.clone());
        }
    }
    drop(current);
    for child in &fiber.children {
        flatten_into(child, registry, out);
    }
}
