//! Configuration for the downstream adapter.

use crate::client::DelayClient;
use crate::error::BuildError;
use crate::events::DownstreamEvent;
use fanout_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://httpbin:80";

/// Configuration for the downstream adapter.
#[derive(Clone)]
pub struct DownstreamConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) user_agent: String,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<DownstreamEvent>,
}

impl DownstreamConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> DownstreamConfigBuilder {
        DownstreamConfigBuilder::new()
    }

    /// Returns the base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the total per-call time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the connection establishment budget.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

/// Builder for [`DelayClient`].
pub struct DownstreamConfigBuilder {
    base_url: String,
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: String,
    name: String,
    event_listeners: EventListeners<DownstreamEvent>,
}

impl DownstreamConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("fanout/", env!("CARGO_PKG_VERSION")).to_string(),
            name: "downstream".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the base URL of the delay-echo dependency.
    ///
    /// Default: `http://httpbin:80`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the total time budget of one call, connection included.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection establishment budget.
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    ///
    /// Default: `fanout/<crate version>`
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the name of this adapter instance.
    ///
    /// Default: "downstream"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a call succeeds.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the observed round trip.
    pub fn on_call_succeeded<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DownstreamEvent::CallSucceeded { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when a call fails.
    ///
    /// # Callback Signature
    /// `Fn(Duration, &str)` - Called with the observed round trip and the
    /// rendered failure reason.
    ///
    /// # Example
    /// ```rust
    /// use fanout_downstream::DownstreamConfig;
    ///
    /// let client = DownstreamConfig::builder()
    ///     .base_url("http://localhost:8080")
    ///     .on_call_failed(|duration, reason| {
    ///         eprintln!("call failed after {:?}: {}", duration, reason);
    ///     })
    ///     .build()
    ///     .expect("valid configuration");
    /// # let _ = client;
    /// ```
    pub fn on_call_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DownstreamEvent::CallFailed {
                duration, reason, ..
            } = event
            {
                f(*duration, reason);
            }
        }));
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<DelayClient, BuildError> {
        let parsed = reqwest::Url::parse(&self.base_url).map_err(|e| BuildError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BuildError::InvalidBaseUrl {
                url: self.base_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let config = DownstreamConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent,
            name: self.name,
            event_listeners: self.event_listeners,
        };
        DelayClient::new(config)
    }
}

impl Default for DownstreamConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
