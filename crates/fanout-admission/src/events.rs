//! Events emitted by the admission controller.

use fanout_core::FanoutEvent;
use std::time::{Duration, Instant};

/// Events emitted by the admission controller.
#[derive(Debug, Clone)]
pub enum AdmissionEvent {
    /// A permit was handed out.
    PermitAcquired {
        /// Name of the controller.
        pattern_name: String,
        /// When the permit was handed out.
        timestamp: Instant,
        /// Permits outstanding after this acquisition.
        in_flight: usize,
        /// How long the acquirer was suspended.
        wait: Duration,
    },
    /// A permit went back to the pool.
    PermitReleased {
        /// Name of the controller.
        pattern_name: String,
        /// When the permit was returned.
        timestamp: Instant,
        /// Permits outstanding after this release.
        in_flight: usize,
        /// How long the permit was held.
        held: Duration,
    },
}

impl FanoutEvent for AdmissionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdmissionEvent::PermitAcquired { .. } => "permit_acquired",
            AdmissionEvent::PermitReleased { .. } => "permit_released",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            AdmissionEvent::PermitAcquired { timestamp, .. }
            | AdmissionEvent::PermitReleased { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            AdmissionEvent::PermitAcquired { pattern_name, .. }
            | AdmissionEvent::PermitReleased { pattern_name, .. } => pattern_name,
        }
    }
}
