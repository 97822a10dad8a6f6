//! Dispatcher metrics regression tests

use super::helpers::*;
use fanout_dispatch::{
    DelayRequest, DispatchRequest, DispatcherConfig, DownstreamError, FailurePolicy, Payload,
};
use serial_test::serial;
use std::num::NonZeroUsize;
use std::time::Duration;

async fn echo(_: DelayRequest) -> Result<Payload, DownstreamError> {
    Ok(serde_json::json!({}))
}

async fn unavailable(_: DelayRequest) -> Result<Payload, DownstreamError> {
    Err(DownstreamError::Status { status: 503 })
}

#[tokio::test]
#[serial]
async fn dispatch_metrics_exist() {
    init_recorder();

    let dispatcher = DispatcherConfig::builder()
        .name("test_dispatch")
        .build(tower::service_fn(echo));

    dispatcher
        .dispatch(DispatchRequest::parallel(
            Duration::from_millis(1),
            4,
            NonZeroUsize::new(2),
        ))
        .await
        .unwrap();

    assert_counter_exists("dispatch_total");
    assert_metric_has_label("dispatch_total", "dispatcher", "test_dispatch");
    assert_metric_has_label("dispatch_total", "result", "success");

    assert_counter_exists("dispatch_tasks_total");
    assert_metric_has_label("dispatch_tasks_total", "result", "success");

    assert_histogram_exists("dispatch_duration_seconds");
    assert_histogram_exists("dispatch_task_duration_seconds");

    // The per-dispatch admission controller is named after the dispatcher.
    assert_metric_has_label(
        "admission_permits_acquired_total",
        "admission",
        "test_dispatch-admission",
    );
}

#[tokio::test]
#[serial]
async fn dispatch_failure_metrics() {
    init_recorder();

    let dispatcher = DispatcherConfig::builder()
        .name("failing_dispatch")
        .failure_policy(FailurePolicy::FailFastCancel)
        .build(tower::service_fn(unavailable));

    let _ = dispatcher
        .dispatch(DispatchRequest::sequential(Duration::from_millis(1), 3))
        .await;

    assert_metric_has_label("dispatch_total", "result", "failure");
    assert_metric_has_label("dispatch_tasks_total", "result", "failure");
}
