//! The admission controller and the permits it issues.

use crate::config::{AdmissionConfig, Limit};
use crate::error::AdmissionError;
use crate::events::AdmissionEvent;
use fanout_core::InvariantViolation;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

/// A counting permit gate.
///
/// Waiters are served strictly in arrival order: the semaphore underneath
/// hands a released permit to the longest-waiting acquirer before any new
/// caller can take it. Cloning the controller shares the same pool.
#[derive(Clone)]
pub struct AdmissionController {
    shared: Arc<Shared>,
}

struct Shared {
    id: u64,
    semaphore: Option<Arc<Semaphore>>,
    closed: AtomicBool,
    in_flight: AtomicUsize,
    waiting: AtomicUsize,
    config: AdmissionConfig,
}

impl AdmissionController {
    /// Creates a controller with the given limit and default settings.
    pub fn new(limit: Limit) -> Self {
        AdmissionConfig::builder().limit(limit).build()
    }

    /// Creates a controller from a prepared configuration.
    pub fn with_config(config: AdmissionConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "admission_permits_acquired_total",
                    "Total number of permits handed out"
                );
                describe_gauge!(
                    "admission_in_flight",
                    "Current number of outstanding permits"
                );
                describe_histogram!(
                    "admission_wait_duration_seconds",
                    "Time spent waiting to acquire a permit"
                );
                describe_histogram!(
                    "admission_hold_duration_seconds",
                    "Time a permit was held before release"
                );
            });
        }

        let semaphore = config.limit.get().map(|max| Arc::new(Semaphore::new(max)));
        Self {
            shared: Arc::new(Shared {
                id: NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed),
                semaphore,
                closed: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                waiting: AtomicUsize::new(0),
                config,
            }),
        }
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> Limit {
        self.shared.config.limit
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Number of permits currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Number of permits that could be handed out right now, or `None`
    /// when the controller is unbounded.
    pub fn available(&self) -> Option<usize> {
        self.shared
            .semaphore
            .as_ref()
            .map(|semaphore| semaphore.available_permits())
    }

    /// Number of callers suspended in [`acquire`](Self::acquire).
    pub fn waiting(&self) -> usize {
        self.shared.waiting.load(Ordering::SeqCst)
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Waits for a permit.
    ///
    /// Never suspends when the limit is [`Limit::Unbounded`]. Fails only if
    /// the controller is closed before a permit becomes available.
    pub async fn acquire(&self) -> Result<Permit, AdmissionError> {
        let started = Instant::now();

        let semaphore_permit = match &self.shared.semaphore {
            Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(TryAcquireError::Closed) => return Err(self.closed_error()),
                Err(TryAcquireError::NoPermits) => {
                    let _waiting = WaitingGuard::enter(&self.shared.waiting);
                    match Arc::clone(semaphore).acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => return Err(self.closed_error()),
                    }
                }
            },
            None if self.is_closed() => return Err(self.closed_error()),
            None => None,
        };

        Ok(self.issue(semaphore_permit, started.elapsed()))
    }

    /// Takes a permit if one is immediately available.
    pub fn try_acquire(&self) -> Option<Permit> {
        let semaphore_permit = match &self.shared.semaphore {
            Some(semaphore) => Some(Arc::clone(semaphore).try_acquire_owned().ok()?),
            None if self.is_closed() => return None,
            None => None,
        };
        Some(self.issue(semaphore_permit, Duration::ZERO))
    }

    /// Returns a permit to the pool, waking the longest waiter.
    ///
    /// Handing in a permit that another controller issued is a bug in the
    /// caller and is reported as an [`InvariantViolation`]; the permit still
    /// goes back to the controller that issued it.
    pub fn release(&self, permit: Permit) -> Result<(), InvariantViolation> {
        if permit.shared.id != self.shared.id {
            return Err(InvariantViolation::new(
                "admission",
                format!(
                    "permit issued by '{}' (#{}) released into '{}' (#{})",
                    permit.shared.config.name,
                    permit.shared.id,
                    self.shared.config.name,
                    self.shared.id
                ),
            ));
        }
        drop(permit);
        Ok(())
    }

    /// Stops handing out permits.
    ///
    /// Suspended acquirers wake up with [`AdmissionError::Closed`]. Permits
    /// already outstanding stay valid until they are released.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(semaphore) = &self.shared.semaphore {
            semaphore.close();
        }

        #[cfg(feature = "tracing")]
        debug!(admission = %self.shared.config.name, "Admission controller closed");
    }

    fn issue(&self, semaphore_permit: Option<OwnedSemaphorePermit>, wait: Duration) -> Permit {
        let in_flight = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let config = &self.shared.config;

        config.event_listeners.emit(&AdmissionEvent::PermitAcquired {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            in_flight,
            wait,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("admission_permits_acquired_total", "admission" => config.name.clone())
                .increment(1);
            gauge!("admission_in_flight", "admission" => config.name.clone())
                .set(in_flight as f64);
            histogram!("admission_wait_duration_seconds", "admission" => config.name.clone())
                .record(wait.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        debug!(
            admission = %config.name,
            in_flight,
            limit = %config.limit,
            wait_ms = wait.as_millis(),
            "Permit acquired"
        );

        Permit {
            shared: Arc::clone(&self.shared),
            semaphore_permit,
            acquired_at: Instant::now(),
        }
    }

    fn closed_error(&self) -> AdmissionError {
        AdmissionError::Closed {
            name: self.shared.config.name.clone(),
        }
    }
}

impl fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionController")
            .field("name", &self.shared.config.name)
            .field("limit", &self.shared.config.limit)
            .field("in_flight", &self.in_flight())
            .field("waiting", &self.waiting())
            .finish()
    }
}

/// The right to run one unit of work.
///
/// Dropping a permit returns it to the controller that issued it, so a task
/// that fails, panics or is aborted can never leak one.
#[must_use = "a permit is released as soon as it is dropped"]
pub struct Permit {
    shared: Arc<Shared>,
    semaphore_permit: Option<OwnedSemaphorePermit>,
    acquired_at: Instant,
}

impl Permit {
    /// Name of the controller that issued this permit.
    pub fn controller_name(&self) -> &str {
        &self.shared.config.name
    }

    /// How long this permit has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let in_flight = self
            .shared
            .in_flight
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        let held = self.acquired_at.elapsed();
        let config = &self.shared.config;

        config.event_listeners.emit(&AdmissionEvent::PermitReleased {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            in_flight,
            held,
        });

        #[cfg(feature = "metrics")]
        {
            gauge!("admission_in_flight", "admission" => config.name.clone())
                .set(in_flight as f64);
            histogram!("admission_hold_duration_seconds", "admission" => config.name.clone())
                .record(held.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        trace!(admission = %config.name, in_flight, held_ms = held.as_millis(), "Permit released");

        // The counter drops before the slot reopens, so observers never see
        // more than `limit` permits outstanding.
        drop(self.semaphore_permit.take());
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("controller", &self.shared.config.name)
            .field("held_for", &self.held_for())
            .finish()
    }
}

struct WaitingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
