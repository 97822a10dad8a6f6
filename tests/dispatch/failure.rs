use super::DelayStub;
use fanout_dispatch::{
    DispatchError, DispatchRequest, Dispatcher, DispatcherConfig, DownstreamError, FailurePolicy,
};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(10);

#[tokio::test(start_paused = true)]
async fn fail_fast_reports_the_failed_request() {
    let stub = DelayStub::new().failing_on(&[2]);
    let dispatcher = Dispatcher::new(stub);

    let err = dispatcher
        .dispatch(DispatchRequest::sequential(DELAY, 5))
        .await
        .unwrap_err();

    match err {
        DispatchError::Downstream {
            request_number,
            source,
        } => {
            assert_eq!(request_number, 2);
            assert_eq!(source, DownstreamError::Status { status: 500 });
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// The first failure to complete wins, not the lowest request number.
#[tokio::test(start_paused = true)]
async fn fail_fast_picks_first_completed_failure() {
    let stub = DelayStub::new()
        .failing_on(&[1, 5])
        .with_skew(|i| Duration::from_millis(((6 - i) * 10) as u64));
    let dispatcher = Dispatcher::new(stub);

    let err = dispatcher
        .dispatch(DispatchRequest::parallel(DELAY, 5, None))
        .await
        .unwrap_err();

    assert_eq!(err.request_number(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn abandon_stops_issuing_queued_calls() {
    let stub = DelayStub::new().failing_on(&[2]);
    let dispatcher = DispatcherConfig::builder()
        .failure_policy(FailurePolicy::FailFastAbandon)
        .build(stub.clone());

    assert!(dispatcher
        .dispatch(DispatchRequest::sequential(DELAY, 10))
        .await
        .is_err());

    tokio::time::sleep(Duration::from_secs(60)).await;
    // Task 3 may take the permit task 2 released before the gate closes.
    assert!(stub.calls() <= 3, "calls: {}", stub.calls());
    assert_eq!(stub.current(), 0);
}

/// Calls already in flight when the dispatch fails still run to the end.
#[tokio::test(start_paused = true)]
async fn abandon_lets_in_flight_calls_finish() {
    let stub = DelayStub::new()
        .failing_on(&[1])
        .with_skew(|i| if i == 1 { Duration::ZERO } else { Duration::from_millis(50) });
    let dispatcher = DispatcherConfig::builder()
        .failure_policy(FailurePolicy::FailFastAbandon)
        .build(stub.clone());

    let err = dispatcher
        .dispatch(DispatchRequest::parallel(DELAY, 4, NonZeroUsize::new(2)))
        .await
        .unwrap_err();
    assert_eq!(err.request_number(), Some(1));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(stub.finished().contains(&2), "finished: {:?}", stub.finished());
    assert!(stub.calls() <= 3, "calls: {}", stub.calls());
    assert_eq!(stub.current(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_remaining_tasks() {
    let stub = DelayStub::new().failing_on(&[2]);
    let dispatcher = DispatcherConfig::builder()
        .failure_policy(FailurePolicy::FailFastCancel)
        .build(stub.clone());

    let err = dispatcher
        .dispatch(DispatchRequest::sequential(DELAY, 5))
        .await
        .unwrap_err();
    assert_eq!(err.request_number(), Some(2));

    tokio::time::sleep(Duration::from_secs(1)).await;
    // Task 3 may have been admitted before the abort landed; 4 and 5 never run.
    assert!(stub.calls() <= 3, "calls: {}", stub.calls());
}

#[tokio::test(start_paused = true)]
async fn collect_all_keeps_every_outcome() {
    let stub = DelayStub::new().failing_on(&[2, 4]);
    let dispatcher = DispatcherConfig::builder()
        .failure_policy(FailurePolicy::CollectAll)
        .build(stub);

    let result = dispatcher
        .dispatch(DispatchRequest::sequential(DELAY, 5))
        .await
        .unwrap();

    assert_eq!(result.results().len(), 5);
    assert!(!result.all_succeeded());
    for task in result.results() {
        let failed = matches!(task.request_number, 2 | 4);
        assert_eq!(task.outcome.failure().is_some(), failed);
    }
    assert_eq!(
        result.results()[1].outcome.failure().map(ToString::to_string),
        Some("HTTP error! status: 500".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn failure_listener_sees_reason() {
    let seen = Arc::new(Mutex::new(None));
    let s = Arc::clone(&seen);

    let dispatcher = DispatcherConfig::builder()
        .on_dispatch_failed(move |request_number, reason| {
            *s.lock().unwrap() = Some((request_number, reason.to_string()));
        })
        .build(DelayStub::new().failing_on(&[1]));

    let _ = dispatcher
        .dispatch(DispatchRequest::sequential(DELAY, 2))
        .await;

    assert_eq!(
        *seen.lock().unwrap(),
        Some((Some(1), "HTTP error! status: 500".to_string()))
    );
}
