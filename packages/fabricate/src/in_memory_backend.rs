//! [`InMemoryBackend`]: a `Backend` test double with no disk or network I/O (§2).

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::serialize::SerializedState;

#[derive(Default)]
pub struct InMemoryBackend {
    states: RefCell<HashMap<String, SerializedState>>,
    locks: RefCell<HashMap<String, Duration>>,
    audit_logs: RefCell<HashMap<String, Vec<String>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Backend for InMemoryBackend {
    async fn get_state(&self, stack: &str) -> Result<Option<SerializedState>, BackendError> {
        Ok(self.states.borrow().get(stack).cloned())
    }

    async fn save_state(&self, stack: &str, state: &SerializedState) -> Result<(), BackendError> {
        self.states.borrow_mut().insert(stack.to_string(), state.clone());
        Ok(())
    }

    async fn acquire_lock(&self, stack: &str, ttl: Duration) -> Result<(), BackendError> {
        if self.locks.borrow().contains_key(stack) {
            return Err(BackendError::new(format!("stack `{stack}` is already locked")));
        }
        self.locks.borrow_mut().insert(stack.to_string(), ttl);
        Ok(())
    }

    async fn release_lock(&self, stack: &str) -> Result<(), BackendError> {
        self.locks.borrow_mut().remove(stack);
        Ok(())
    }

    async fn append_audit_log(&self, stack: &str, entry: &str) -> Result<(), BackendError> {
        self.audit_logs.borrow_mut().entry(stack.to_string()).or_default().push(entry.to_string());
        Ok(())
    }

    async fn get_audit_log(&self, stack: &str) -> Result<Vec<String>, BackendError> {
        Ok(self.audit_logs.borrow().get(stack).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn double_lock_acquire_fails() {
        let backend = InMemoryBackend::new();
        backend.acquire_lock("stack-a", Duration::from_secs(30)).await.unwrap();
        assert!(backend.acquire_lock("stack-a", Duration::from_secs(30)).await.is_err());
        backend.release_lock("stack-a").await.unwrap();
        assert!(backend.acquire_lock("stack-a", Duration::from_secs(30)).await.is_ok());
    }

    #[tokio::test]
    async fn save_and_get_state_round_trips() {
        let backend = InMemoryBackend::new();
        let state = SerializedState { nodes: Vec::new(), timestamp: 0, checkpoint_index: 0, audit_ref: None };
        backend.save_state("stack-a", &state).await.unwrap();
        let loaded = backend.get_state("stack-a").await.unwrap();
        assert!(loaded.is_some());
    }
}
