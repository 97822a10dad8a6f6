//! Bounded-concurrency fan-out.
//!
//! A [`Dispatcher`] issues N identical downstream calls, runs them under an
//! admission limit and returns every outcome in request order together with
//! the total wall time. Sequential, parallel and limited-parallel execution
//! share one code path: the only difference between them is the
//! [`Limit`] the per-dispatch admission controller is built with.
//!
//! The downstream is any [`tower::Service`] taking a [`DelayRequest`], so
//! tests can swap the HTTP client for an in-memory stub.
//!
//! # Example
//!
//! ```rust,no_run
//! use fanout_dispatch::{DispatchRequest, DispatcherConfig, FailurePolicy};
//! use fanout_downstream::DownstreamConfig;
//! use std::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DownstreamConfig::builder()
//!     .base_url("http://localhost:8080")
//!     .build()?;
//!
//! let dispatcher = DispatcherConfig::builder()
//!     .failure_policy(FailurePolicy::FailFastAbandon)
//!     .on_task_completed(|n, ok, took| println!("#{n} ok={ok} in {took:?}"))
//!     .build(client);
//!
//! let request = DispatchRequest::parallel(Duration::from_secs(1), 10, NonZeroUsize::new(3));
//! let result = dispatcher.dispatch(request).await?;
//! println!("{} calls in {}ms", result.total_requests(), result.total_time_ms());
//! # Ok(())
//! # }
//! ```
//!
//! # Failure policies
//!
//! - [`FailurePolicy::FailFastAbandon`]: the first failure fails the dispatch;
//!   calls already running finish in the background, queued ones never start.
//! - [`FailurePolicy::FailFastCancel`]: the first failure fails the dispatch
//!   and every outstanding task is aborted.
//! - [`FailurePolicy::CollectAll`]: every task runs to completion and each
//!   slot carries its own success or failure.

pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod executor;
pub mod request;

pub use aggregator::{DispatchResult, ResultAggregator, TaskResult};
pub use config::{DispatcherConfig, DispatcherConfigBuilder, FailurePolicy, ParsePolicyError};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use events::DispatchEvent;
pub use executor::{CurrentRuntime, Executor};
pub use request::{DispatchRequest, ExecutionMode};

pub use fanout_admission::Limit;
pub use fanout_downstream::{DelayRequest, DownstreamError, Payload, TaskOutcome};
