//! Events emitted by the downstream adapter.

use fanout_core::FanoutEvent;
use std::time::{Duration, Instant};

/// Events emitted by the downstream adapter.
#[derive(Debug, Clone)]
pub enum DownstreamEvent {
    /// A call returned a well-formed 2xx response.
    CallSucceeded {
        /// Name of the adapter.
        pattern_name: String,
        /// When the call finished.
        timestamp: Instant,
        /// Delay requested from the dependency.
        delay: Duration,
        /// Observed round trip.
        duration: Duration,
    },
    /// A call failed.
    CallFailed {
        /// Name of the adapter.
        pattern_name: String,
        /// When the call finished.
        timestamp: Instant,
        /// Delay requested from the dependency.
        delay: Duration,
        /// Observed round trip.
        duration: Duration,
        /// Rendered failure reason.
        reason: String,
    },
}

impl FanoutEvent for DownstreamEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DownstreamEvent::CallSucceeded { .. } => "call_succeeded",
            DownstreamEvent::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            DownstreamEvent::CallSucceeded { timestamp, .. }
            | DownstreamEvent::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            DownstreamEvent::CallSucceeded { pattern_name, .. }
            | DownstreamEvent::CallFailed { pattern_name, .. } => pattern_name,
        }
    }
}
