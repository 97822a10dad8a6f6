//! Classified results of a single downstream call.

use crate::error::DownstreamError;

/// The JSON body returned by the delay-echo dependency.
pub type Payload = serde_json::Value;

/// What one task produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The dependency answered with a well-formed 2xx response.
    Success(Payload),
    /// The call failed and will not be retried.
    Failure(DownstreamError),
}

impl TaskOutcome {
    /// Classifies the result of a downstream call.
    pub fn from_result(result: Result<Payload, DownstreamError>) -> Self {
        match result {
            Ok(payload) => TaskOutcome::Success(payload),
            Err(reason) => TaskOutcome::Failure(reason),
        }
    }

    /// Returns `true` for [`TaskOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    /// Returns the payload of a successful call.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            TaskOutcome::Success(payload) => Some(payload),
            TaskOutcome::Failure(_) => None,
        }
    }

    /// Returns the reason of a failed call.
    pub fn failure(&self) -> Option<&DownstreamError> {
        match self {
            TaskOutcome::Success(_) => None,
            TaskOutcome::Failure(reason) => Some(reason),
        }
    }

    /// Converts back into a `Result`.
    pub fn into_result(self) -> Result<Payload, DownstreamError> {
        match self {
            TaskOutcome::Success(payload) => Ok(payload),
            TaskOutcome::Failure(reason) => Err(reason),
        }
    }
}

impl From<Result<Payload, DownstreamError>> for TaskOutcome {
    fn from(result: Result<Payload, DownstreamError>) -> Self {
        TaskOutcome::from_result(result)
    }
}
