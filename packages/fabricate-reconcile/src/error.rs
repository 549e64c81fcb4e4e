//! [`ReconcileError`]: the reconciler's own fatal condition (§4.6 "cycle fatal").

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReconcileError {
    #[error("dependency graph contains a cycle; could not compute a deployment order")]
    CyclicDependency,
}
