//! Observation hooks for dispatches, permits and downstream calls.
//!
//! Each component defines its own event enum and hands every instance to
//! the [`EventListeners`] held in its config. Listeners are registered on
//! the config builder; there is no global registry, so a listener only sees
//! the component it was attached to.
//!
//! Listeners run inline on the task that produced the event. Keep them
//! cheap: a slow listener delays the permit release or result it reports.

use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::error;

/// Something a fanout component observed.
pub trait FanoutEvent: Send + Sync + fmt::Debug {
    /// Short snake_case tag, such as `"permit_acquired"` or `"task_completed"`.
    fn event_type(&self) -> &'static str;

    /// Wall-clock instant the event was recorded.
    fn timestamp(&self) -> Instant;

    /// Name of the dispatcher, controller or client that emitted it.
    fn source_name(&self) -> &str;
}

/// Receives events of one component type.
pub trait EventListener<E: FanoutEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// Shared handle to a listener.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// Ordered set of listeners for one event type.
///
/// Cloning is cheap: listeners are reference counted, so a dispatcher can
/// hand the same set to every per-dispatch admission controller.
pub struct EventListeners<E: FanoutEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: FanoutEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Appends a listener. Listeners are called in registration order.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// A listener that panics does not stop delivery to the ones after it,
    /// and the panic never reaches the emitting task.
    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if delivered.is_err() {
                #[cfg(feature = "tracing")]
                error!(
                    source = event.source_name(),
                    event_type = event.event_type(),
                    listener = index,
                    "Event listener panicked"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = index;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: FanoutEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: FanoutEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: FanoutEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Adapts a closure into an [`EventListener`].
///
/// The `on_*` builder methods wrap their callbacks in one of these and
/// filter for the variant they care about.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: FanoutEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
