//! Error types for the admission controller.

/// Errors returned when acquiring a permit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    /// The controller was closed before a permit became available.
    #[error("admission controller '{name}' is closed")]
    Closed {
        /// Name of the closed controller.
        name: String,
    },
}

/// Result type for admission operations.
pub type Result<T> = std::result::Result<T, AdmissionError>;
