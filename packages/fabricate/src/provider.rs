//! [`Provider`]: the external interface that turns an instance node into a real resource (§6).

use async_trait::async_trait;
use fabricate_core::{InstanceNode, PropValue};
use indexmap::IndexMap;

use crate::error::ProviderError;

/// Applies and destroys instance nodes against whatever backs a construct type. Both methods must
/// be idempotent and safely retryable (§6 "Provider"): calling `apply` twice with an unchanged
/// node, or `destroy` twice on an already-gone node, must not error.
#[async_trait(?Send)]
pub trait Provider {
    async fn apply(&self, node: &InstanceNode) -> Result<IndexMap<String, PropValue>, ProviderError>;
    async fn destroy(&self, node: &InstanceNode) -> Result<(), ProviderError>;
}
