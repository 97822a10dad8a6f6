use super::DelayStub;
use fanout_dispatch::{DispatchRequest, Dispatcher};
use serde_json::json;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Later calls finish first, results still come back in request order.
#[tokio::test(start_paused = true)]
async fn results_ordered_when_completion_is_reversed() {
    let n = 8;
    let stub = DelayStub::new().with_skew(move |i| Duration::from_millis(((n - i) * 10) as u64));
    let dispatcher = Dispatcher::new(stub.clone());

    let result = dispatcher
        .dispatch(DispatchRequest::parallel(Duration::from_millis(100), n, None))
        .await
        .unwrap();

    let numbers: Vec<_> = result.results().iter().map(|r| r.request_number).collect();
    assert_eq!(numbers, (1..=n).collect::<Vec<_>>());
    assert_eq!(stub.finished(), (1..=n).rev().collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn each_slot_carries_its_own_payload() {
    let stub = DelayStub::new();
    let dispatcher = Dispatcher::new(stub);

    let result = dispatcher
        .dispatch(DispatchRequest::sequential(Duration::from_millis(10), 5))
        .await
        .unwrap();

    for task in result.results() {
        assert_eq!(
            task.outcome.payload(),
            Some(&json!({ "call": task.request_number }))
        );
    }
}

#[tokio::test(start_paused = true)]
async fn limited_parallel_keeps_order_under_skew() {
    let stub = DelayStub::new().with_skew(|i| Duration::from_millis(if i % 2 == 0 { 0 } else { 50 }));
    let dispatcher = Dispatcher::new(stub);

    let result = dispatcher
        .dispatch(DispatchRequest::parallel(
            Duration::from_millis(20),
            9,
            NonZeroUsize::new(3),
        ))
        .await
        .unwrap();

    assert_eq!(result.total_requests(), 9);
    assert!(result
        .results()
        .windows(2)
        .all(|pair| pair[0].request_number + 1 == pair[1].request_number));
    assert!(result.all_succeeded());
}

/// Two dispatches on one dispatcher do not share permits or slots.
#[tokio::test(start_paused = true)]
async fn concurrent_dispatches_are_independent() {
    let dispatcher = Dispatcher::new(DelayStub::new());

    let a = dispatcher.dispatch(DispatchRequest::sequential(Duration::from_millis(100), 3));
    let b = dispatcher.dispatch(DispatchRequest::sequential(Duration::from_millis(100), 3));
    let (a, b) = tokio::join!(a, b);

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.total_requests(), 3);
    assert_eq!(b.total_requests(), 3);
    assert_eq!(a.total_time_ms(), 300);
    assert_eq!(b.total_time_ms(), 300);
}
