//! The dispatcher: one code path for sequential, parallel and
//! limited-parallel fan-out.

use crate::aggregator::{DispatchResult, ResultAggregator};
use crate::config::{DispatcherConfig, FailurePolicy};
use crate::error::DispatchError;
use crate::events::DispatchEvent;
use crate::executor::{CurrentRuntime, Executor};
use crate::request::DispatchRequest;
use fanout_admission::{AdmissionConfig, AdmissionController};
use fanout_downstream::{DelayRequest, DownstreamError, Payload, TaskOutcome};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Fans out N downstream calls under an admission limit.
///
/// Each call to [`dispatch`](Self::dispatch) creates its own
/// [`AdmissionController`], so concurrent dispatches on a shared dispatcher
/// never compete for permits.
#[derive(Clone)]
pub struct Dispatcher<S, E = CurrentRuntime> {
    service: S,
    executor: E,
    config: Arc<DispatcherConfig>,
}

impl<S> Dispatcher<S, CurrentRuntime> {
    /// Creates a dispatcher with default settings.
    pub fn new(service: S) -> Self {
        Self::with_config(service, DispatcherConfig::default())
    }

    /// Creates a dispatcher from a prepared configuration.
    pub fn with_config(service: S, config: DispatcherConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!("dispatch_total", "Total number of dispatches by result");
                describe_histogram!(
                    "dispatch_duration_seconds",
                    "Wall time of completed dispatches"
                );
                describe_counter!("dispatch_tasks_total", "Total number of tasks by result");
                describe_histogram!(
                    "dispatch_task_duration_seconds",
                    "Time each task spent in its downstream call"
                );
            });
        }

        Self {
            service,
            executor: CurrentRuntime,
            config: Arc::new(config),
        }
    }
}

impl<S, E> Dispatcher<S, E> {
    /// Runs tasks on a different executor.
    pub fn with_executor<E2: Executor>(self, executor: E2) -> Dispatcher<S, E2> {
        Dispatcher {
            service: self.service,
            executor,
            config: self.config,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

impl<S, E> Dispatcher<S, E>
where
    S: Service<DelayRequest, Response = Payload, Error = DownstreamError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    E: Executor,
{
    /// Issues `request.call_count` calls and collects their outcomes in
    /// request order.
    ///
    /// Tasks are spawned in order `1..=call_count`; each one waits for a
    /// permit, calls the service once and hands the permit back. Under a
    /// fail-fast policy the first failed call ends the dispatch with
    /// [`DispatchError::Downstream`] and no partial results are returned.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResult, DispatchError> {
        let limit = request.effective_limit();
        let controller = AdmissionConfig::builder()
            .limit(limit)
            .name(format!("{}-admission", self.config.name))
            .event_listeners(self.config.admission_listeners.clone())
            .build();

        #[cfg(feature = "tracing")]
        info!(
            dispatcher = %self.config.name,
            mode = %request.mode,
            call_count = request.call_count,
            limit = %limit,
            delay_ms = request.unit_delay.as_millis(),
            "Starting dispatch"
        );

        let start = Instant::now();
        let mut aborts = Vec::with_capacity(request.call_count);
        let mut pending = FuturesUnordered::new();

        for request_number in 1..=request.call_count {
            let task = run_task(
                request_number,
                request.unit_delay,
                controller.clone(),
                self.service.clone(),
                Arc::clone(&self.config),
            );
            let handle = self.executor.spawn(task);
            aborts.push(handle.abort_handle());
            pending.push(async move { (request_number, handle.await) });
        }

        #[cfg(feature = "tracing")]
        debug!(
            dispatcher = %self.config.name,
            tasks = pending.len(),
            "Tasks created, waiting for completion"
        );

        let mut aggregator = ResultAggregator::new(request.call_count, request.unit_delay);

        while let Some((request_number, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => return Err(self.fail(err, &controller, &aborts)),
                Err(_) => {
                    let err = DispatchError::TaskPanicked { request_number };
                    return Err(self.fail(err, &controller, &aborts));
                }
            };

            let outcome = match outcome {
                TaskOutcome::Failure(source) if self.config.failure_policy.is_fail_fast() => {
                    let err = DispatchError::Downstream {
                        request_number,
                        source,
                    };
                    return Err(self.fail(err, &controller, &aborts));
                }
                outcome => outcome,
            };

            if let Err(violation) = aggregator.record(request_number, outcome) {
                return Err(self.fail(violation.into(), &controller, &aborts));
            }
        }

        let result = match aggregator.finalize(start) {
            Ok(result) => result,
            Err(violation) => return Err(self.fail(violation.into(), &controller, &aborts)),
        };

        let elapsed = Duration::from_millis(result.total_time_ms());
        self.config
            .event_listeners
            .emit(&DispatchEvent::DispatchFinished {
                pattern_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                total_requests: result.total_requests(),
                elapsed,
            });

        #[cfg(feature = "metrics")]
        {
            counter!("dispatch_total", "dispatcher" => self.config.name.clone(), "result" => "success")
                .increment(1);
            histogram!("dispatch_duration_seconds", "dispatcher" => self.config.name.clone())
                .record(elapsed.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        info!(
            dispatcher = %self.config.name,
            total_requests = result.total_requests(),
            total_time_ms = result.total_time_ms(),
            "Dispatch finished"
        );

        Ok(result)
    }

    fn fail(
        &self,
        error: DispatchError,
        controller: &AdmissionController,
        aborts: &[AbortHandle],
    ) -> DispatchError {
        // Tasks still queued for a permit wake up refused and never call out.
        controller.close();
        if self.config.failure_policy == FailurePolicy::FailFastCancel {
            for handle in aborts {
                handle.abort();
            }
        }

        self.config
            .event_listeners
            .emit(&DispatchEvent::DispatchFailed {
                pattern_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                request_number: error.request_number(),
                reason: error.to_string(),
            });

        #[cfg(feature = "metrics")]
        counter!("dispatch_total", "dispatcher" => self.config.name.clone(), "result" => "failure")
            .increment(1);

        #[cfg(feature = "tracing")]
        warn!(
            dispatcher = %self.config.name,
            policy = %self.config.failure_policy,
            request_number = ?error.request_number(),
            in_flight = controller.in_flight(),
            error = %error,
            "Dispatch failed"
        );

        error
    }
}

impl<S, E> fmt::Debug for Dispatcher<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.config.name)
            .field("failure_policy", &self.config.failure_policy)
            .finish()
    }
}

/// Body of one task: permit, call, release.
async fn run_task<S>(
    request_number: usize,
    delay: Duration,
    controller: AdmissionController,
    mut service: S,
    config: Arc<DispatcherConfig>,
) -> Result<TaskOutcome, DispatchError>
where
    S: Service<DelayRequest, Response = Payload, Error = DownstreamError>,
{
    let permit = controller
        .acquire()
        .await
        .map_err(|source| DispatchError::Admission {
            request_number,
            source,
        })?;

    config.event_listeners.emit(&DispatchEvent::TaskStarted {
        pattern_name: config.name.clone(),
        timestamp: std::time::Instant::now(),
        request_number,
    });

    #[cfg(feature = "tracing")]
    debug!(
        dispatcher = %config.name,
        request_number,
        in_flight = controller.in_flight(),
        "Starting request"
    );

    let started = Instant::now();
    let outcome = match service.ready().await {
        Ok(ready) => TaskOutcome::from_result(ready.call(DelayRequest::new(delay)).await),
        Err(err) => TaskOutcome::Failure(err),
    };
    let duration = started.elapsed();

    controller.release(permit)?;

    let success = outcome.is_success();
    config.event_listeners.emit(&DispatchEvent::TaskCompleted {
        pattern_name: config.name.clone(),
        timestamp: std::time::Instant::now(),
        request_number,
        success,
        duration,
    });

    #[cfg(feature = "metrics")]
    {
        let result = if success { "success" } else { "failure" };
        counter!("dispatch_tasks_total", "dispatcher" => config.name.clone(), "result" => result)
            .increment(1);
        histogram!("dispatch_task_duration_seconds", "dispatcher" => config.name.clone())
            .record(duration.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    debug!(
        dispatcher = %config.name,
        request_number,
        success,
        took_ms = duration.as_millis(),
        "Completed request"
    );

    Ok(outcome)
}
