//! Configuration for the admission controller.

use crate::controller::AdmissionController;
use crate::events::AdmissionEvent;
use fanout_core::events::{EventListeners, FnListener};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

/// How many permits an admission controller hands out at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many permits may be outstanding.
    Bounded(NonZeroUsize),
    /// Acquisition never suspends.
    Unbounded,
}

impl Limit {
    /// A limit of one permit, giving strictly sequential execution.
    pub const SEQUENTIAL: Limit = Limit::Bounded(NonZeroUsize::MIN);

    /// Creates a bounded limit, or `None` when `max` is zero.
    pub fn bounded(max: usize) -> Option<Self> {
        NonZeroUsize::new(max).map(Limit::Bounded)
    }

    /// Returns the bound, or `None` for [`Limit::Unbounded`].
    pub fn get(&self) -> Option<usize> {
        match self {
            Limit::Bounded(max) => Some(max.get()),
            Limit::Unbounded => None,
        }
    }

    /// Returns `true` if this limit never suspends an acquirer.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Limit::Unbounded)
    }
}

impl From<NonZeroUsize> for Limit {
    fn from(max: NonZeroUsize) -> Self {
        Limit::Bounded(max)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Bounded(max) => write!(f, "{}", max),
            Limit::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Configuration for an admission controller.
#[derive(Clone)]
pub struct AdmissionConfig {
    /// Maximum number of outstanding permits.
    pub(crate) limit: Limit,
    /// Name of this controller instance.
    pub(crate) name: String,
    /// Event listeners.
    pub(crate) event_listeners: EventListeners<AdmissionEvent>,
}

impl AdmissionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> AdmissionConfigBuilder {
        AdmissionConfigBuilder::new()
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> Limit {
        self.limit
    }

    /// Returns the configured name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for admission controller configuration.
pub struct AdmissionConfigBuilder {
    limit: Limit,
    name: String,
    event_listeners: EventListeners<AdmissionEvent>,
}

impl AdmissionConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            limit: Limit::Unbounded,
            name: "admission".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the permit limit.
    ///
    /// Default: [`Limit::Unbounded`]
    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = limit.into();
        self
    }

    /// Sets the name of this controller instance.
    ///
    /// Default: "admission"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a permit is handed out.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - Called with the number of permits outstanding
    /// after this acquisition (between 1 and the limit) and how long the
    /// acquirer waited.
    ///
    /// # Example
    /// ```rust
    /// use fanout_admission::{AdmissionConfig, Limit};
    ///
    /// let controller = AdmissionConfig::builder()
    ///     .limit(Limit::bounded(4).unwrap())
    ///     .on_permit_acquired(|in_flight, waited| {
    ///         println!("{} in flight, waited {:?}", in_flight, waited);
    ///     })
    ///     .build();
    /// assert_eq!(controller.limit().get(), Some(4));
    /// ```
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let AdmissionEvent::PermitAcquired { in_flight, wait, .. } = event {
                f(*in_flight, *wait);
            }
        }));
        self
    }

    /// Registers a callback when a permit goes back to the pool.
    ///
    /// Fires for explicit [`release`](AdmissionController::release) calls
    /// and for permits dropped by tasks that were aborted or panicked.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - Called with the number of permits still
    /// outstanding and how long this permit was held.
    pub fn on_permit_released<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let AdmissionEvent::PermitReleased { in_flight, held, .. } = event {
                f(*in_flight, *held);
            }
        }));
        self
    }

    /// Replaces the registered listeners with a prepared set.
    ///
    /// Used by callers that create one controller per operation and want
    /// every controller to report to the same listeners.
    pub fn event_listeners(mut self, listeners: EventListeners<AdmissionEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    /// Builds the configuration without creating a controller.
    pub fn into_config(self) -> AdmissionConfig {
        AdmissionConfig {
            limit: self.limit,
            name: self.name,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the configuration and returns a fresh controller.
    pub fn build(self) -> AdmissionController {
        AdmissionController::with_config(self.into_config())
    }
}

impl Default for AdmissionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
