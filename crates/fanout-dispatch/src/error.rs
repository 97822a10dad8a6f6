//! Error types for the dispatcher.

use fanout_admission::AdmissionError;
use fanout_core::InvariantViolation;
use fanout_downstream::DownstreamError;

/// Why a dispatch failed as a whole.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// A downstream call failed under a fail-fast policy.
    ///
    /// Results of the other tasks are not reported.
    #[error("{source}")]
    Downstream {
        /// The task whose call failed.
        request_number: usize,
        /// Why the call failed.
        source: DownstreamError,
    },
    /// A task could not obtain a permit.
    #[error("request {request_number} was not admitted: {source}")]
    Admission {
        /// The task that was refused.
        request_number: usize,
        /// Why it was refused.
        source: AdmissionError,
    },
    /// A task panicked before producing an outcome.
    #[error("request {request_number} panicked")]
    TaskPanicked {
        /// The task that panicked.
        request_number: usize,
    },
    /// The dispatcher broke one of its own invariants.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl DispatchError {
    /// The task that caused the failure, if a single task did.
    pub fn request_number(&self) -> Option<usize> {
        match self {
            DispatchError::Downstream { request_number, .. }
            | DispatchError::Admission { request_number, .. }
            | DispatchError::TaskPanicked { request_number } => Some(*request_number),
            DispatchError::Invariant(_) => None,
        }
    }

    /// Returns `true` for downstream failures.
    pub fn is_downstream(&self) -> bool {
        matches!(self, DispatchError::Downstream { .. })
    }

    /// Returns `true` for failures that indicate a bug rather than a bad
    /// dependency.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DispatchError::Invariant(_) | DispatchError::TaskPanicked { .. }
        )
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
