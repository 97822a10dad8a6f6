//! Response bodies.

use fanout_dispatch::{DispatchResult, Payload, TaskOutcome};
use serde::Serialize;

/// Body of a successful delay endpoint call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayResponse {
    pub total_requests: usize,
    /// Whole seconds, as requested.
    pub delay_per_request: u64,
    pub total_time_ms: u64,
    pub results: Vec<CallResult>,
}

/// One entry of [`DelayResponse::results`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub request_number: usize,
    pub result: CallBody,
}

/// The payload of a call, or the reason it failed when every outcome is
/// collected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallBody {
    Payload(Payload),
    Failure { error: String },
}

impl From<DispatchResult> for DelayResponse {
    fn from(result: DispatchResult) -> Self {
        let total_requests = result.total_requests();
        let delay_per_request = result.delay_per_request().as_secs();
        let total_time_ms = result.total_time_ms();

        let results = result
            .into_results()
            .into_iter()
            .map(|task| CallResult {
                request_number: task.request_number,
                result: match task.outcome {
                    TaskOutcome::Success(payload) => CallBody::Payload(payload),
                    TaskOutcome::Failure(reason) => CallBody::Failure {
                        error: reason.to_string(),
                    },
                },
            })
            .collect();

        Self {
            total_requests,
            delay_per_request,
            total_time_ms,
            results,
        }
    }
}
