//! Events emitted by the dispatcher.

use fanout_core::FanoutEvent;
use std::time::{Duration, Instant};

/// Events emitted by the dispatcher.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A task obtained its permit and is calling downstream.
    TaskStarted {
        /// Name of the dispatcher.
        pattern_name: String,
        /// When the task started.
        timestamp: Instant,
        /// The task's request number.
        request_number: usize,
    },
    /// A task finished its downstream call and released its permit.
    TaskCompleted {
        /// Name of the dispatcher.
        pattern_name: String,
        /// When the task completed.
        timestamp: Instant,
        /// The task's request number.
        request_number: usize,
        /// Whether the downstream call succeeded.
        success: bool,
        /// Time spent in the downstream call.
        duration: Duration,
    },
    /// Every task resolved and the result was assembled.
    DispatchFinished {
        /// Name of the dispatcher.
        pattern_name: String,
        /// When the dispatch finished.
        timestamp: Instant,
        /// Number of calls issued.
        total_requests: usize,
        /// Total wall time.
        elapsed: Duration,
    },
    /// The dispatch as a whole failed.
    DispatchFailed {
        /// Name of the dispatcher.
        pattern_name: String,
        /// When the failure was observed.
        timestamp: Instant,
        /// The task that caused the failure, if any.
        request_number: Option<usize>,
        /// Rendered failure reason.
        reason: String,
    },
}

impl FanoutEvent for DispatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::TaskStarted { .. } => "task_started",
            DispatchEvent::TaskCompleted { .. } => "task_completed",
            DispatchEvent::DispatchFinished { .. } => "dispatch_finished",
            DispatchEvent::DispatchFailed { .. } => "dispatch_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            DispatchEvent::TaskStarted { timestamp, .. }
            | DispatchEvent::TaskCompleted { timestamp, .. }
            | DispatchEvent::DispatchFinished { timestamp, .. }
            | DispatchEvent::DispatchFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            DispatchEvent::TaskStarted { pattern_name, .. }
            | DispatchEvent::TaskCompleted { pattern_name, .. }
            | DispatchEvent::DispatchFinished { pattern_name, .. }
            | DispatchEvent::DispatchFailed { pattern_name, .. } => pattern_name,
        }
    }
}
