//! [`ChangeSet`]: the reconciler's output (§3 "ChangeSet").

use fabricate_core::{InstanceId, InstanceNode};

/// What changed between two render passes, plus the order in which it must be applied.
///
/// `deployment_order` and `parallel_batches` only cover `creates` and `updates` — nodes with no
/// changes never reach a provider, satisfying the idempotence property (§8 invariant 8).
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub creates: Vec<InstanceNode>,
    pub updates: Vec<InstanceNode>,
    pub deletes: Vec<InstanceNode>,
    pub deployment_order: Vec<InstanceId>,
    pub parallel_batches: Vec<Vec<InstanceId>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}
