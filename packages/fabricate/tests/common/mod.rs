//! Shared test doubles for the convergence driver's end-to-end scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use fabricate::{InstanceNode, ProviderError, PropValue};
use indexmap::IndexMap;

/// A provider that records every node it was asked to apply/destroy, in call order, and hands
/// back a deterministic `host`/`addr` output pair so a child instance can read either one.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    pub applied: Rc<RefCell<Vec<String>>>,
    pub destroyed: Rc<RefCell<Vec<String>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl fabricate::Provider for RecordingProvider {
    async fn apply(&self, node: &InstanceNode) -> Result<IndexMap<String, PropValue>, ProviderError> {
        self.applied.borrow_mut().push(node.id.clone());
        let mut outputs = IndexMap::new();
        outputs.insert("host".to_string(), PropValue::string(node.id.clone()));
        outputs.insert("addr".to_string(), PropValue::string(node.id.clone()));
        Ok(outputs)
    }

    async fn destroy(&self, node: &InstanceNode) -> Result<(), ProviderError> {
        self.destroyed.borrow_mut().push(node.id.clone());
        Ok(())
    }
}
