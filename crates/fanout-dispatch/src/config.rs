//! Configuration for the dispatcher.

use crate::dispatcher::Dispatcher;
use crate::events::DispatchEvent;
use crate::executor::CurrentRuntime;
use fanout_admission::AdmissionEvent;
use fanout_core::events::{EventListeners, FnListener};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What happens to the rest of a dispatch once one call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the dispatch immediately. Tasks already running are left to
    /// finish on their own and their outcomes are discarded; tasks still
    /// waiting for a permit never start their call.
    #[default]
    FailFastAbandon,
    /// Fail the dispatch immediately and abort every task still pending or
    /// running. Their permits return to the pool as they are dropped.
    FailFastCancel,
    /// Wait for every task and report each outcome, failures included.
    CollectAll,
}

impl FailurePolicy {
    /// Returns `true` for the two fail-fast policies.
    pub fn is_fail_fast(&self) -> bool {
        !matches!(self, FailurePolicy::CollectAll)
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFastAbandon => write!(f, "abandon"),
            FailurePolicy::FailFastCancel => write!(f, "cancel"),
            FailurePolicy::CollectAll => write!(f, "collect-all"),
        }
    }
}

/// Error returned when parsing an unknown [`FailurePolicy`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown failure policy '{0}', expected one of: abandon, cancel, collect-all")]
pub struct ParsePolicyError(String);

impl FromStr for FailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abandon" => Ok(FailurePolicy::FailFastAbandon),
            "cancel" => Ok(FailurePolicy::FailFastCancel),
            "collect-all" => Ok(FailurePolicy::CollectAll),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Configuration for the dispatcher.
#[derive(Clone)]
pub struct DispatcherConfig {
    pub(crate) failure_policy: FailurePolicy,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<DispatchEvent>,
    pub(crate) admission_listeners: EventListeners<AdmissionEvent>,
}

impl DispatcherConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new()
    }

    /// Returns the failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Returns the dispatcher name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfigBuilder::new().into_config()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherConfigBuilder {
    failure_policy: FailurePolicy,
    name: String,
    event_listeners: EventListeners<DispatchEvent>,
    admission_listeners: EventListeners<AdmissionEvent>,
}

impl DispatcherConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            name: "dispatcher".to_string(),
            event_listeners: EventListeners::new(),
            admission_listeners: EventListeners::new(),
        }
    }

    /// Sets the failure policy.
    ///
    /// Default: [`FailurePolicy::FailFastAbandon`]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the name of this dispatcher instance.
    ///
    /// Default: "dispatcher"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a task obtains its permit.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the task's request number.
    pub fn on_task_started<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::TaskStarted { request_number, .. } = event {
                f(*request_number);
            }
        }));
        self
    }

    /// Registers a callback when a task finishes its downstream call.
    ///
    /// # Callback Signature
    /// `Fn(usize, bool, Duration)` - Called with the request number, whether
    /// the call succeeded, and how long it took.
    ///
    /// # Example
    /// ```rust
    /// use fanout_dispatch::DispatcherConfig;
    ///
    /// let config = DispatcherConfig::builder()
    ///     .on_task_completed(|request_number, success, duration| {
    ///         println!("request {} ok={} in {:?}", request_number, success, duration);
    ///     })
    ///     .into_config();
    /// # let _ = config;
    /// ```
    pub fn on_task_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, bool, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::TaskCompleted {
                request_number,
                success,
                duration,
                ..
            } = event
            {
                f(*request_number, *success, *duration);
            }
        }));
        self
    }

    /// Registers a callback when a dispatch completes.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the total wall time.
    pub fn on_dispatch_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::DispatchFinished { elapsed, .. } = event {
                f(*elapsed);
            }
        }));
        self
    }

    /// Registers a callback when a dispatch fails.
    ///
    /// # Callback Signature
    /// `Fn(Option<usize>, &str)` - Called with the offending request number,
    /// if any, and the rendered reason.
    pub fn on_dispatch_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<usize>, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::DispatchFailed {
                request_number,
                reason,
                ..
            } = event
            {
                f(*request_number, reason);
            }
        }));
        self
    }

    /// Registers a callback on every permit handed out by the per-dispatch
    /// admission controller.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the number of tasks in flight, including
    /// the one just admitted.
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.admission_listeners.add(FnListener::new(move |event| {
            if let AdmissionEvent::PermitAcquired { in_flight, .. } = event {
                f(*in_flight);
            }
        }));
        self
    }

    /// Builds the configuration without attaching a service.
    pub fn into_config(self) -> DispatcherConfig {
        DispatcherConfig {
            failure_policy: self.failure_policy,
            name: self.name,
            event_listeners: self.event_listeners,
            admission_listeners: self.admission_listeners,
        }
    }

    /// Builds a dispatcher driving `service` on the current runtime.
    pub fn build<S>(self, service: S) -> Dispatcher<S, CurrentRuntime> {
        Dispatcher::with_config(service, self.into_config())
    }
}

impl Default for DispatcherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
