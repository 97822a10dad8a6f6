//! Invariant violations.
//!
//! Caller-facing failures (bad parameters, a downstream returning 503) are
//! modelled by each component's own error type. [`InvariantViolation`] is the
//! other kind: a bug inside the fanout machinery itself, such as releasing a
//! permit into a controller that never issued it or finalizing a result set
//! that still has empty slots. These are never retried and never silently
//! dropped; every constructor logs at error level when the `tracing` feature
//! is enabled.
//!
//! ```
//! use fanout_core::InvariantViolation;
//!
//! let err = InvariantViolation::new("aggregator", "slot 3 recorded twice");
//! assert_eq!(err.component(), "aggregator");
//! assert!(err.to_string().contains("slot 3 recorded twice"));
//! ```

/// A broken internal invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invariant violated in {component}: {detail}")]
pub struct InvariantViolation {
    component: &'static str,
    detail: String,
}

impl InvariantViolation {
    /// Creates a new violation for the given component.
    pub fn new(component: &'static str, detail: impl Into<String>) -> Self {
        let detail = detail.into();

        #[cfg(feature = "tracing")]
        tracing::error!(component, detail = %detail, "Invariant violated");

        Self { component, detail }
    }

    /// Returns the component that detected the violation.
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Returns a description of what went wrong.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}
