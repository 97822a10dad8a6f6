//! HTTP client for the delay-echo dependency.

use crate::config::DownstreamConfig;
use crate::error::{BuildError, DownstreamError};
use crate::events::DownstreamEvent;
use crate::outcome::{Payload, TaskOutcome};
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// One request to the dependency: wait `delay`, then answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRequest {
    /// How long the dependency should wait before responding.
    ///
    /// The wire format carries whole seconds; any fraction is dropped.
    pub delay: Duration,
}

impl DelayRequest {
    /// Creates a request for the given delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Path of this request relative to the base URL.
    pub fn path(&self) -> String {
        format!("/delay/{}", self.delay.as_secs())
    }
}

/// Calls `GET <base_url>/delay/{n}` once per request.
///
/// Implements [`tower::Service`] so the dispatcher can drive it (or any
/// stand-in) the same way. No retries are attempted; the first failure is
/// final.
#[derive(Clone)]
pub struct DelayClient {
    http: reqwest::Client,
    config: Arc<DownstreamConfig>,
}

impl DelayClient {
    pub(crate) fn new(config: DownstreamConfig) -> Result<Self, BuildError> {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "downstream_calls_total",
                "Total number of downstream calls by result"
            );
            describe_histogram!(
                "downstream_call_duration_seconds",
                "Round trip of downstream calls"
            );
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DownstreamConfig {
        &self.config
    }

    /// Full URL for a request.
    pub fn url_for(&self, request: &DelayRequest) -> String {
        format!("{}{}", self.config.base_url, request.path())
    }

    /// Performs one call and classifies it.
    pub async fn call_delay(&self, delay: Duration) -> TaskOutcome {
        TaskOutcome::from_result(
            fetch(self.http.clone(), Arc::clone(&self.config), DelayRequest::new(delay)).await,
        )
    }
}

impl fmt::Debug for DelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayClient")
            .field("name", &self.config.name)
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl Service<DelayRequest> for DelayClient {
    type Response = Payload;
    type Error = DownstreamError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: DelayRequest) -> Self::Future {
        Box::pin(fetch(self.http.clone(), Arc::clone(&self.config), request))
    }
}

async fn fetch(
    http: reqwest::Client,
    config: Arc<DownstreamConfig>,
    request: DelayRequest,
) -> Result<Payload, DownstreamError> {
    let url = format!("{}{}", config.base_url, request.path());
    let start = Instant::now();

    #[cfg(feature = "tracing")]
    debug!(downstream = %config.name, %url, delay_secs = request.delay.as_secs(), "Calling downstream");

    let result = send(&http, &url, config.timeout).await;
    let duration = start.elapsed();

    match &result {
        Ok(_) => {
            config.event_listeners.emit(&DownstreamEvent::CallSucceeded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                delay: request.delay,
                duration,
            });

            #[cfg(feature = "metrics")]
            {
                counter!("downstream_calls_total", "downstream" => config.name.clone(), "result" => "success").increment(1);
                histogram!("downstream_call_duration_seconds", "downstream" => config.name.clone())
                    .record(duration.as_secs_f64());
            }

            #[cfg(feature = "tracing")]
            debug!(downstream = %config.name, duration_ms = duration.as_millis(), "Downstream call succeeded");
        }
        Err(err) => {
            config.event_listeners.emit(&DownstreamEvent::CallFailed {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                delay: request.delay,
                duration,
                reason: err.to_string(),
            });

            #[cfg(feature = "metrics")]
            {
                counter!("downstream_calls_total", "downstream" => config.name.clone(), "result" => err.kind()).increment(1);
                histogram!("downstream_call_duration_seconds", "downstream" => config.name.clone())
                    .record(duration.as_secs_f64());
            }

            #[cfg(feature = "tracing")]
            warn!(
                downstream = %config.name,
                duration_ms = duration.as_millis(),
                error = %err,
                "Downstream call failed"
            );
        }
    }

    result
}

async fn send(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Payload, DownstreamError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| classify(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownstreamError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|e| classify(e, timeout))?;
    serde_json::from_slice(&body).map_err(|e| DownstreamError::Decode(e.to_string()))
}

fn classify(err: reqwest::Error, timeout: Duration) -> DownstreamError {
    if err.is_timeout() {
        DownstreamError::Timeout { timeout }
    } else {
        DownstreamError::Transport(err.to_string())
    }
}
