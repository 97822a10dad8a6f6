//! Downstream call adapter for fanout.
//!
//! [`DelayClient`] performs exactly one `GET <base_url>/delay/{n}` per
//! request against a delay-echo dependency (httpbin or compatible) and
//! classifies what came back:
//!
//! - a 2xx response with a JSON body is a [`TaskOutcome::Success`]
//! - a non-2xx status, a transport error, a malformed body, or a call that
//!   exceeds its time budget is a [`TaskOutcome::Failure`]
//!
//! Calls are bounded by a total timeout (30 s by default) and a connection
//! establishment timeout (10 s). Nothing is retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use fanout_downstream::{DelayRequest, DownstreamConfig};
//! use std::time::Duration;
//! use tower::ServiceExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DownstreamConfig::builder()
//!     .base_url("http://localhost:8080")
//!     .timeout(Duration::from_secs(30))
//!     .connect_timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let payload = client
//!     .oneshot(DelayRequest::new(Duration::from_secs(1)))
//!     .await?;
//! println!("{}", payload);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod outcome;

pub use client::{DelayClient, DelayRequest};
pub use config::{DownstreamConfig, DownstreamConfigBuilder, DEFAULT_BASE_URL};
pub use error::{BuildError, DownstreamError};
pub use events::DownstreamEvent;
pub use outcome::{Payload, TaskOutcome};
