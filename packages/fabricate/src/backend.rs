//! [`Backend`]: persisted state and advisory locking (§6).

use async_trait::async_trait;
use std::time::Duration;

use crate::error::BackendError;
use crate::serialize::SerializedState;

/// Storage and coordination for a single named stack's persisted node list. Locks are advisory
/// and TTL-bounded (§6): a backend is not required to enforce mutual exclusion against a crashed
/// holder beyond letting the TTL expire.
#[async_trait(?Send)]
pub trait Backend {
    async fn get_state(&self, stack: &str) -> Result<Option<SerializedState>, BackendError>;
    async fn save_state(&self, stack: &str, state: &SerializedState) -> Result<(), BackendError>;
    async fn acquire_lock(&self, stack: &str, ttl: Duration) -> Result<(), BackendError>;
    async fn release_lock(&self, stack: &str) -> Result<(), BackendError>;

    async fn append_audit_log(&self, _stack: &str, _entry: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn get_audit_log(&self, _stack: &str) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }
}
