//! Dispatcher tests.
//!
//! Test organization:
//! - ordering.rs: results land in request order
//! - timing.rs: wall time per execution mode
//! - concurrency.rs: peak in-flight never exceeds the limit
//! - failure.rs: the three failure policies

mod failure;
mod ordering;

use fanout_dispatch::{DelayRequest, DownstreamError, Payload};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

/// Stand-in for the delay-echo dependency.
///
/// Sleeps for the requested delay (plus an optional per-call skew), records
/// how many calls overlap and answers with the call's issue index. Calls
/// whose index is listed in `fail_on` answer with a 500.
#[derive(Clone)]
pub struct DelayStub {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    finished: Arc<Mutex<Vec<usize>>>,
    skew: Arc<dyn Fn(usize) -> Duration + Send + Sync>,
    fail_on: Arc<Vec<usize>>,
}

impl DelayStub {
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(Mutex::new(Vec::new())),
            skew: Arc::new(|_| Duration::ZERO),
            fail_on: Arc::new(Vec::new()),
        }
    }

    /// Adds `skew(call_index)` to each call's delay.
    pub fn with_skew<F>(mut self, skew: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.skew = Arc::new(skew);
        self
    }

    /// Fails the calls with these 1-based issue indices.
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = Arc::new(calls.to_vec());
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Issue indices in the order their calls finished.
    pub fn finished(&self) -> Vec<usize> {
        self.finished.lock().unwrap().clone()
    }
}

impl tower::Service<DelayRequest> for DelayStub {
    type Response = Payload;
    type Error = DownstreamError;
    type Future = Pin<Box<dyn Future<Output = Result<Payload, DownstreamError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DelayRequest) -> Self::Future {
        let index = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.current);
        let peak = Arc::clone(&self.peak);
        let finished = Arc::clone(&self.finished);
        let delay = req.delay + (self.skew)(index);
        let fail = self.fail_on.contains(&index);

        Box::pin(async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(delay).await;

            current.fetch_sub(1, Ordering::SeqCst);
            finished.lock().unwrap().push(index);

            if fail {
                Err(DownstreamError::Status { status: 500 })
            } else {
                Ok(json!({ "call": index }))
            }
        })
    }
}
