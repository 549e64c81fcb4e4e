//! [`ConvergenceDriver`]: the single-threaded cooperative render→reconcile→apply loop (§4.7).

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::time::Duration;

use backoff::backoff::Backoff;
use fabricate_core::{run as render_pass, Element, FiberHandle, InstanceId, InstanceNode, InstanceRegistry, PropValue, RenderError};
use fabricate_reactive::create_root;
use futures::FutureExt;
use indexmap::IndexMap;

use crate::backend::Backend;
use crate::config::{ConvergenceOptions, RetryPolicy};
use crate::error::DriverError;
use crate::provider::Provider;
use crate::serialize::{from_serialized, to_serialized, SerializedState};

const LOCK_TTL: Duration = Duration::from_secs(300);

/// A cooperative cancellation flag checked at iteration and batch boundaries (§4.7). Cloning
/// shares the same underlying flag, so a token handed to a spawned task can be cancelled from the
/// caller that kept the original.
#[derive(Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

pub struct ConvergenceDriver<P: Provider, B: Backend> {
    provider: P,
    backend: B,
    options: ConvergenceOptions,
    retry: RetryPolicy,
}

impl<P: Provider, B: Backend> ConvergenceDriver<P, B> {
    pub fn new(provider: P, backend: B, options: ConvergenceOptions, retry: RetryPolicy) -> Self {
        Self { provider, backend, options, retry }
    }

    /// Runs the convergence loop for `stack`, rebuilding the element tree from `build` on every
    /// iteration, until two consecutive passes agree on both structure and outputs (§4.4, §4.7).
    pub async fn run(
        &self,
        stack: &str,
        build: impl Fn() -> Element,
    ) -> Result<Vec<InstanceNode>, DriverError> {
        self.run_cancellable(stack, build, &CancellationToken::new()).await
    }

    /// Like [`Self::run`], but observes `token` at iteration and batch boundaries (§4.7
    /// "cancellation"): once cancelled, the loop stops scheduling further work, persists whatever
    /// has been reconciled so far without running the final delete pass, and returns
    /// [`DriverError::Cancelled`]. The lock acquired for `stack` is released whether `run_locked`
    /// returns, errors, or panics.
    pub async fn run_cancellable(
        &self,
        stack: &str,
        build: impl Fn() -> Element,
        token: &CancellationToken,
    ) -> Result<Vec<InstanceNode>, DriverError> {
        self.backend.acquire_lock(stack, LOCK_TTL).await?;
        let result = AssertUnwindSafe(self.run_locked(stack, &build, token)).catch_unwind().await;
        self.backend.release_lock(stack).await?;
        match result {
            Ok(inner) => inner,
            Err(payload) => Err(DriverError::Panicked(panic_message(payload))),
        }
    }

    async fn run_locked(
        &self,
        stack: &str,
        build: &impl Fn() -> Element,
        token: &CancellationToken,
    ) -> Result<Vec<InstanceNode>, DriverError> {
        let original_previous: Vec<InstanceNode> = match self.backend.get_state(stack).await? {
            Some(state) => state.nodes.iter().map(from_serialized).collect(),
            None => Vec::new(),
        };

        let mut previous = original_previous.clone();
        let mut current_nodes = previous.clone();
        let mut iteration = 0usize;
        let mut cancelled = false;

        loop {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
            if iteration >= self.options.max_iterations {
                return Err(DriverError::IterationLimitExceeded(self.options.max_iterations));
            }
            iteration += 1;

            let (fiber, registry, root) = self.render_once(build, &previous)?;
            current_nodes = fabricate_core::flatten(&fiber, &registry);

            let changeset = fabricate_reconcile::reconcile(&previous, &current_nodes)?;
            let rescheduled = !changeset.creates.is_empty() || !changeset.updates.is_empty();

            let deploy_map: HashMap<InstanceId, InstanceNode> = changeset
                .creates
                .iter()
                .chain(changeset.updates.iter())
                .map(|n| (n.id.clone(), n.clone()))
                .collect();

            let apply_result =
                self.apply_batches(&changeset.parallel_batches, &deploy_map, &root, token).await;
            if let Err(err) = apply_result {
                root.dispose();
                return Err(err);
            }

            previous = current_nodes.clone();
            root.dispose();

            if !rescheduled {
                break;
            }
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            let state = SerializedState {
                nodes: current_nodes.iter().map(to_serialized).collect(),
                timestamp: 0,
                checkpoint_index: iteration,
                audit_ref: None,
            };
            self.backend.save_state(stack, &state).await?;
            return Err(DriverError::Cancelled(iteration));
        }

        let final_changeset = fabricate_reconcile::reconcile(&original_previous, &current_nodes)?;
        for node in &final_changeset.deletes {
            self.destroy_with_retry(node).await?;
        }

        let state = SerializedState {
            nodes: current_nodes.iter().map(to_serialized).collect(),
            timestamp: 0,
            checkpoint_index: iteration,
            audit_ref: None,
        };
        self.backend.save_state(stack, &state).await?;

        Ok(current_nodes)
    }

    fn render_once(
        &self,
        build: &impl Fn() -> Element,
        previous: &[InstanceNode],
    ) -> Result<(FiberHandle, Rc<InstanceRegistry>, fabricate_reactive::RootHandle), DriverError> {
        let element = build();
        let registry = Rc::new(InstanceRegistry::new(previous.to_vec()));
        let result_cell: Rc<RefCell<Option<Result<FiberHandle, RenderError>>>> = Rc::new(RefCell::new(None));

        let root = {
            let result_cell = Rc::clone(&result_cell);
            let registry = Rc::clone(&registry);
            create_root(move || {
                *result_cell.borrow_mut() = Some(render_pass(&element, &registry));
            })
        };

        let fiber = result_cell.borrow_mut().take().expect("render_pass always sets result_cell")?;
        Ok((fiber, registry, root))
    }

    async fn apply_batches(
        &self,
        batches: &[Vec<InstanceId>],
        deploy_map: &HashMap<InstanceId, InstanceNode>,
        root: &fabricate_reactive::RootHandle,
        token: &CancellationToken,
    ) -> Result<(), DriverError> {
        for batch in batches {
            if token.is_cancelled() {
                break;
            }
            let applies = batch.iter().map(|id| {
                let node = deploy_map.get(id).expect("batch id must be in deploy map").clone();
                async move {
                    let outcome = self.apply_with_retry(&node).await;
                    (node, outcome)
                }
            });
            let results = futures::future::join_all(applies).await;

            let mut failure = None;
            let successes: Vec<(InstanceNode, IndexMap<String, PropValue>)> = results
                .into_iter()
                .filter_map(|(node, outcome)| match outcome {
                    Ok(outputs) => Some((node, outputs)),
                    Err(err) => {
                        failure.get_or_insert(err);
                        None
                    }
                })
                .collect();

            root.run_in(|| {
                for (node, outputs) in &successes {
                    node.set_outputs(outputs.clone());
                }
            });

            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(())
    }

    async fn apply_with_retry(&self, node: &InstanceNode) -> Result<IndexMap<String, PropValue>, DriverError> {
        let mut backoff = self.retry.backoff.clone();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.provider.apply(node).await {
                Ok(outputs) => return Ok(outputs),
                Err(err) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(DriverError::Provider { node_id: node.id.clone(), source: err });
                    }
                    match backoff.next_backoff() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => return Err(DriverError::Provider { node_id: node.id.clone(), source: err }),
                    }
                }
            }
        }
    }

    async fn destroy_with_retry(&self, node: &InstanceNode) -> Result<(), DriverError> {
        let mut backoff = self.retry.backoff.clone();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.provider.destroy(node).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(DriverError::Provider { node_id: node.id.clone(), source: err });
                    }
                    match backoff.next_backoff() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => return Err(DriverError::Provider { node_id: node.id.clone(), source: err }),
                    }
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "driver panicked with a non-string payload".to_string()
    }
}
