//! Re-running an unchanged tree against a stack that already converged makes zero provider calls
//! (idempotence, §8): nothing to create, nothing whose output changed, nothing to destroy.

mod common;

use common::RecordingProvider;
use fabricate::{component, fragment, use_instance, ConvergenceDriver, ConvergenceOptions, Element, InMemoryBackend, Props, PropValue, RetryPolicy};

fn app(_props: Props) -> Element {
    let mut props = Props::new();
    props.insert("name".to_string(), PropValue::string("main-db"));
    let _ = use_instance("Database", props);
    fragment(Vec::new())
}

#[tokio::test(flavor = "current_thread")]
async fn unchanged_rerun_makes_no_provider_calls() {
    let provider = RecordingProvider::new();
    let backend = InMemoryBackend::new();
    let driver = ConvergenceDriver::new(provider.clone(), backend, ConvergenceOptions::default(), RetryPolicy::default());

    driver
        .run("idempotence-stack", || component("App", app, Props::new()))
        .await
        .expect("first run should converge");
    let applies_after_first_run = provider.applied.borrow().len();
    assert_eq!(applies_after_first_run, 1);

    let second = driver
        .run("idempotence-stack", || component("App", app, Props::new()))
        .await
        .expect("second run against an unchanged tree should also converge");

    assert_eq!(second.len(), 1);
    assert_eq!(provider.applied.borrow().len(), applies_after_first_run, "an unchanged tree issues no new apply calls");
    assert!(provider.destroyed.borrow().is_empty(), "nothing was removed from the tree");
}
