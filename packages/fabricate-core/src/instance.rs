//! [`InstanceNode`] and [`InstanceRegistry`] (§3 "InstanceNode", §4.3 "Instance Registry").

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use fabricate_reactive::{create_signal, Signal};
use indexmap::IndexMap;

use crate::props::{Props, PropValue};

pub type InstanceId = String;

/// A resource declaration produced by a `useInstance` call.
///
/// Cloning an `InstanceNode` clones the handle, not the data: `outputs` and `output_signals` are
/// `Rc`-shared so the registry, the reconciler, and the accessor bundle returned to the component
/// all observe the same live state.
#[derive(Clone)]
pub struct InstanceNode {
    pub id: InstanceId,
    pub path: Vec<String>,
    pub construct_type: String,
    pub props: Props,
    pub reconcile_key: String,
    outputs: Rc<RefCell<IndexMap<String, PropValue>>>,
    output_signals: Rc<RefCell<IndexMap<String, Signal<PropValue>>>>,
}

impl InstanceNode {
    /// Builds a node directly, bypassing `useInstance`. Used to reconstruct nodes from persisted
    /// state (deserializing a `SerializedNode`) and by the reconciler's tests. `hydrated_outputs`
    /// becomes the node's starting output values. No signal is created here — signals for
    /// `hydrated_outputs` are created lazily, seeded from this map, the first time
    /// [`Self::output_accessor`] or [`Self::set_outputs`] actually touches that key (see there).
    /// That means building a node — even with non-empty `hydrated_outputs` — never needs an active
    /// reactive root; only reading or writing an output does.
    pub fn new(
        id: InstanceId,
        path: Vec<String>,
        construct_type: String,
        props: Props,
        reconcile_key: String,
        hydrated_outputs: IndexMap<String, PropValue>,
    ) -> Self {
        Self {
            id,
            path,
            construct_type,
            props,
            reconcile_key,
            outputs: Rc::new(RefCell::new(hydrated_outputs)),
            output_signals: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// A plain snapshot of the current outputs, for persistence and reconcile diffing. Never
    /// tracked; reactive reads go through [`Self::output_accessor`].
    pub fn outputs_snapshot(&self) -> IndexMap<String, PropValue> {
        self.outputs.borrow().clone()
    }

    /// Replaces every output in one batch (§4.7 step 6, §9 "full replacement" resolution): keys
    /// present before but absent from `new_outputs` are reset to `Undefined` rather than left
    /// stale. Equal to the value already held, a key is left untouched so its signal does not
    /// notify subscribers that didn't actually see a change.
    pub fn set_outputs(&self, new_outputs: IndexMap<String, PropValue>) {
        fabricate_reactive::batch(|| {
            let mut outputs = self.outputs.borrow_mut();
            let mut signals = self.output_signals.borrow_mut();

            let stale: Vec<String> = outputs
                .keys()
                .filter(|k| !new_outputs.contains_key(*k))
                .cloned()
                .collect();
            for key in stale {
                if outputs.get(&key).is_some_and(PropValue::is_undefined) {
                    continue;
                }
                if let Some(signal) = signals.get(&key) {
                    signal.set(PropValue::Undefined);
                }
                outputs.insert(key, PropValue::Undefined);
            }

            for (key, value) in new_outputs {
                if outputs.get(&key).is_some_and(|current| *current == value) {
                    continue;
                }
                let signal = signals
                    .entry(key.clone())
                    .or_insert_with(|| create_signal(PropValue::Undefined));
                signal.set(value.clone());
                outputs.insert(key, value);
            }
        });
    }

    /// A tracked accessor for one output, created lazily on first read (§4.3 point 4), seeded from
    /// whatever value `outputs` already holds for `name` — which may be a hydrated value from a
    /// previous run, since [`Self::new`] never creates a signal up front.
    pub fn output_accessor(&self, name: &str) -> impl Fn() -> PropValue {
        let signals = Rc::clone(&self.output_signals);
        let outputs = Rc::clone(&self.outputs);
        let name = name.to_string();
        move || {
            let mut signals = signals.borrow_mut();
            let signal = signals.entry(name.clone()).or_insert_with(|| {
                let initial = outputs.borrow().get(&name).cloned().unwrap_or(PropValue::Undefined);
                create_signal(initial)
            });
            signal.get()
        }
    }
}

impl fmt::Debug for InstanceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceNode")
            .field("id", &self.id)
            .field("construct_type", &self.construct_type)
            .field("path", &self.path)
            .finish()
    }
}

/// A bundle of per-output accessors returned from `useInstance`. For a placeholder instance
/// (§4.4) every accessor returns [`PropValue::Undefined`].
#[derive(Clone)]
pub enum AccessorBundle {
    Placeholder,
    Node(InstanceNode),
}

impl AccessorBundle {
    pub fn get(&self, name: &str) -> PropValue {
        match self {
            AccessorBundle::Placeholder => PropValue::Undefined,
            AccessorBundle::Node(node) => node.output_accessor(name)(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, AccessorBundle::Placeholder)
    }
}

/// Derives `reconcileKey` (§4.5): construct type plus a user-stable name if one of the
/// conventional name-like props is present, else the full path.
pub fn derive_reconcile_key(construct_type: &str, props: &Props, path: &[String]) -> String {
    for candidate in ["name", "id", "key"] {
        if let Some(value) = props.get(candidate).and_then(PropValue::as_str) {
            return format!("{construct_type}:{value}");
        }
    }
    format!("{construct_type}@{}", path.join("."))
}

/// The canonical set of live instance nodes for the current render, plus the previous run's
/// nodes kept around for hydration (§4.3).
pub struct InstanceRegistry {
    pub current: RefCell<IndexMap<InstanceId, InstanceNode>>,
    previous_by_reconcile_key: IndexMap<String, InstanceNode>,
    hydrated: RefCell<HashSet<String>>,
}

impl InstanceRegistry {
    pub fn new(previous_nodes: Vec<InstanceNode>) -> Self {
        let previous_by_reconcile_key = previous_nodes
            .into_iter()
            .map(|node| (node.reconcile_key.clone(), node))
            .collect();
        Self {
            current: RefCell::new(IndexMap::new()),
            previous_by_reconcile_key,
            hydrated: RefCell::new(HashSet::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Implements `useInstance` (§4.3). `id` must already be known unique within this pass by the
    /// caller (the renderer checks this against [`Self::current`] before calling in).
    pub fn use_instance(
        &self,
        id: InstanceId,
        path: Vec<String>,
        construct_type: String,
        props: Props,
    ) -> AccessorBundle {
        if props.values().any(PropValue::is_undefined) {
            return AccessorBundle::Placeholder;
        }

        let reconcile_key = derive_reconcile_key(&construct_type, &props, &path);
        let hydrated_outputs = if self.hydrated.borrow().contains(&reconcile_key) {
            IndexMap::new()
        } else if let Some(previous) = self.previous_by_reconcile_key.get(&reconcile_key) {
            self.hydrated.borrow_mut().insert(reconcile_key.clone());
            previous.outputs_snapshot()
        } else {
            IndexMap::new()
        };

        let node = InstanceNode::new(id.clone(), path, construct_type, props, reconcile_key, hydrated_outputs);
        self.current.borrow_mut().insert(id, node.clone());
        AccessorBundle::Node(node)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.current.borrow().contains_key(id)
    }

    pub fn remove(&self, id: &str) {
        self.current.borrow_mut().shift_remove(id);
    }
}
