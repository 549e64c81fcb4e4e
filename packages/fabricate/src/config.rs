//! Plain constructor-argument configuration for the convergence driver (§1.3 of the expanded spec).

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

/// Tunables for [`crate::driver::ConvergenceDriver`]. Always passed in explicitly; this crate
/// never reads environment variables or files itself.
#[derive(Debug, Clone)]
pub struct ConvergenceOptions {
    /// Hard cap on render→reconcile→apply iterations before giving up (§4.4).
    pub max_iterations: usize,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self { max_iterations: 50 }
    }
}

/// Retry behavior for a single node's failed `provider.apply`/`provider.destroy` call (§7
/// "Provider").
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: ExponentialBackoffBuilder::new()
                .with_initial_interval(Duration::from_millis(50))
                .with_max_interval(Duration::from_secs(2))
                .with_max_elapsed_time(Some(Duration::from_secs(10)))
                .build(),
        }
    }
}
