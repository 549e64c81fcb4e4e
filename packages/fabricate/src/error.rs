//! [`DriverError`]: the convergence driver's fatal conditions (§7).

use fabricate_core::RenderError;
use fabricate_reconcile::ReconcileError;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("provider failed to apply node `{node_id}`: {source}")]
    Provider {
        node_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("convergence did not settle within {0} iterations")]
    IterationLimitExceeded(usize),

    #[error("run cancelled after {0} iterations; state checkpointed")]
    Cancelled(usize),

    #[error("run panicked: {0}")]
    Panicked(String),
}

/// Per-node, potentially-retryable failure from a [`crate::provider::Provider`] call (§7
/// "Provider").
#[derive(Debug, thiserror::Error, Clone)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Fatal at the convergence-driver boundary (§7 "Backend").
#[derive(Debug, thiserror::Error, Clone)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
