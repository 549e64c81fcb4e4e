//! Cancelling a run before it starts leaves the backend untouched and reports the checkpoint
//! (§4.7 "cancellation").

mod common;

use common::RecordingProvider;
use fabricate::{component, fragment, use_instance, CancellationToken, ConvergenceDriver, ConvergenceOptions, DriverError, Element, InMemoryBackend, Props, PropValue, RetryPolicy};

fn app(_props: Props) -> Element {
    let mut props = Props::new();
    props.insert("name".to_string(), PropValue::string("main-db"));
    let _ = use_instance("Database", props);
    fragment(Vec::new())
}

#[tokio::test(flavor = "current_thread")]
async fn cancelling_before_the_first_iteration_checkpoints_nothing_applied() {
    let provider = RecordingProvider::new();
    let backend = InMemoryBackend::new();
    let driver = ConvergenceDriver::new(provider.clone(), backend, ConvergenceOptions::default(), RetryPolicy::default());

    let token = CancellationToken::new();
    token.cancel();

    let result = driver
        .run_cancellable("cancel-stack", || component("App", app, Props::new()), &token)
        .await;

    assert!(matches!(result, Err(DriverError::Cancelled(0))));
    assert!(provider.applied.borrow().is_empty(), "a run cancelled up front must not apply anything");
}
