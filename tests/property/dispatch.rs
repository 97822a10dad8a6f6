//! Property tests for the dispatcher.
//!
//! Invariants tested:
//! - Exactly N results, ordered 1..=N, whatever order calls finish in
//! - Overlapping calls never exceed the effective limit
//! - Wall time is ceil(N / K) delays on a paused clock
//! - Running the same request twice gives the same totals and ordering

use fanout_dispatch::{DelayRequest, DispatchRequest, Dispatcher, DownstreamError, Payload};
use proptest::prelude::*;
use serde_json::json;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Test service that tracks concurrent executions.
///
/// Each call sleeps for the requested delay plus `jitter[index % len]`
/// milliseconds, so completion order differs from issue order.
#[derive(Clone)]
struct ConcurrencyTracker {
    current: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
    issued: Arc<AtomicUsize>,
    jitter: Arc<Vec<u64>>,
}

impl ConcurrencyTracker {
    fn new(jitter: Vec<u64>) -> Self {
        Self {
            current: Arc::new(AtomicUsize::new(0)),
            max_seen: Arc::new(AtomicUsize::new(0)),
            issued: Arc::new(AtomicUsize::new(0)),
            jitter: Arc::new(jitter),
        }
    }
}

impl tower::Service<DelayRequest> for ConcurrencyTracker {
    type Response = Payload;
    type Error = DownstreamError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DelayRequest) -> Self::Future {
        let index = self.issued.fetch_add(1, Ordering::SeqCst);
        let extra = if self.jitter.is_empty() {
            0
        } else {
            self.jitter[index % self.jitter.len()]
        };
        let current = Arc::clone(&self.current);
        let max_seen = Arc::clone(&self.max_seen);

        Box::pin(async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(req.delay + Duration::from_millis(extra)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            Ok(json!({ "index": index }))
        })
    }
}

fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: results are complete and ordered regardless of completion order
    #[test]
    fn results_are_complete_and_ordered(
        call_count in 1usize..=50,
        limit in proptest::option::of(1usize..=20),
        jitter in proptest::collection::vec(0u64..=50, 0..8),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let dispatcher = Dispatcher::new(ConcurrencyTracker::new(jitter));
            let request = DispatchRequest::parallel(
                Duration::from_millis(100),
                call_count,
                limit.and_then(NonZeroUsize::new),
            );

            let result = dispatcher.dispatch(request).await.unwrap();

            prop_assert_eq!(result.total_requests(), call_count);
            prop_assert_eq!(result.results().len(), call_count);
            for (i, task) in result.results().iter().enumerate() {
                prop_assert_eq!(task.request_number, i + 1);
                prop_assert!(task.outcome.is_success());
            }
            Ok(())
        })?;
    }

    /// Property: overlapping calls never exceed min(limit, call_count)
    #[test]
    fn peak_respects_effective_limit(
        call_count in 1usize..=50,
        limit in 1usize..=20,
        jitter in proptest::collection::vec(0u64..=50, 0..8),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let tracker = ConcurrencyTracker::new(jitter);
            let max_seen = Arc::clone(&tracker.max_seen);
            let dispatcher = Dispatcher::new(tracker);

            dispatcher
                .dispatch(DispatchRequest::parallel(
                    Duration::from_millis(10),
                    call_count,
                    NonZeroUsize::new(limit),
                ))
                .await
                .unwrap();

            let observed = max_seen.load(Ordering::SeqCst);
            prop_assert!(
                observed <= limit.min(call_count),
                "Observed {} concurrent calls but limit was {}",
                observed,
                limit
            );
            Ok(())
        })?;
    }

    /// Property: with uniform delays, wall time is ceil(N / K) delays
    #[test]
    fn wall_time_is_batches_of_delay(
        call_count in 1usize..=30,
        limit in 1usize..=10,
        delay_ms in 1u64..=1000,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let dispatcher = Dispatcher::new(ConcurrencyTracker::new(Vec::new()));
            let result = dispatcher
                .dispatch(DispatchRequest::parallel(
                    Duration::from_millis(delay_ms),
                    call_count,
                    NonZeroUsize::new(limit),
                ))
                .await
                .unwrap();

            let batches = call_count.div_ceil(limit) as u64;
            prop_assert_eq!(result.total_time_ms(), batches * delay_ms);
            Ok(())
        })?;
    }

    /// Property: sequential wall time is N delays
    #[test]
    fn sequential_wall_time(
        call_count in 1usize..=20,
        delay_ms in 1u64..=500,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let tracker = ConcurrencyTracker::new(Vec::new());
            let max_seen = Arc::clone(&tracker.max_seen);
            let dispatcher = Dispatcher::new(tracker);

            let result = dispatcher
                .dispatch(DispatchRequest::sequential(Duration::from_millis(delay_ms), call_count))
                .await
                .unwrap();

            prop_assert_eq!(result.total_time_ms(), call_count as u64 * delay_ms);
            prop_assert_eq!(max_seen.load(Ordering::SeqCst), 1);
            Ok(())
        })?;
    }

    /// Property: repeating a request on one dispatcher reproduces its result
    #[test]
    fn repeated_request_gives_same_result(
        call_count in 1usize..=30,
        limit in proptest::option::of(1usize..=10),
        sequential in any::<bool>(),
        delay_ms in 1u64..=500,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let dispatcher = Dispatcher::new(ConcurrencyTracker::new(Vec::new()));
            let delay = Duration::from_millis(delay_ms);
            let request = if sequential {
                DispatchRequest::sequential(delay, call_count)
            } else {
                DispatchRequest::parallel(delay, call_count, limit.and_then(NonZeroUsize::new))
            };

            let first = dispatcher.dispatch(request).await.unwrap();
            let second = dispatcher.dispatch(request).await.unwrap();

            prop_assert_eq!(first.total_requests(), second.total_requests());
            prop_assert_eq!(first.delay_per_request(), second.delay_per_request());
            prop_assert_eq!(first.total_time_ms(), second.total_time_ms());
            prop_assert_eq!(first.results().len(), second.results().len());
            let order = |r: &fanout_dispatch::DispatchResult| {
                r.results().iter().map(|t| t.request_number).collect::<Vec<_>>()
            };
            prop_assert_eq!(order(&first), order(&second));
            Ok(())
        })?;
    }
}
