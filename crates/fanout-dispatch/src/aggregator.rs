//! Index-addressed collection of task outcomes.

use fanout_core::InvariantViolation;
use fanout_downstream::TaskOutcome;
use std::time::Duration;
use tokio::time::Instant;

/// The outcome of one task, tagged with its request number.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    /// 1-based position of the task in issuance order.
    pub request_number: usize,
    /// What the downstream call produced.
    pub outcome: TaskOutcome,
}

/// The final, immutable result of a dispatch.
///
/// `results` always holds one entry per call, ordered by request number.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    total_requests: usize,
    delay_per_request: Duration,
    total_time_ms: u64,
    results: Vec<TaskResult>,
}

impl DispatchResult {
    /// Number of calls issued.
    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    /// Delay each call asked for.
    pub fn delay_per_request(&self) -> Duration {
        self.delay_per_request
    }

    /// Wall time from the first issued call to the last completion.
    pub fn total_time_ms(&self) -> u64 {
        self.total_time_ms
    }

    /// Results in request order.
    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    /// Consumes the result, returning the ordered task results.
    pub fn into_results(self) -> Vec<TaskResult> {
        self.results
    }

    /// Returns `true` if every task succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }
}

/// Collects outcomes into fixed slots so completion order never leaks into
/// the final ordering.
#[derive(Debug)]
pub struct ResultAggregator {
    slots: Vec<Option<TaskOutcome>>,
    filled: usize,
    delay_per_request: Duration,
}

impl ResultAggregator {
    /// Creates an aggregator with one empty slot per call.
    pub fn new(call_count: usize, delay_per_request: Duration) -> Self {
        Self {
            slots: vec![None; call_count],
            filled: 0,
            delay_per_request,
        }
    }

    /// Stores an outcome in slot `request_number - 1`.
    ///
    /// Recording outside `1..=call_count` or recording the same request twice
    /// is an invariant violation.
    pub fn record(
        &mut self,
        request_number: usize,
        outcome: TaskOutcome,
    ) -> Result<(), InvariantViolation> {
        let capacity = self.slots.len();
        let slot = request_number
            .checked_sub(1)
            .and_then(|index| self.slots.get_mut(index))
            .ok_or_else(|| {
                InvariantViolation::new(
                    "aggregator",
                    format!("request {} outside 1..={}", request_number, capacity),
                )
            })?;

        if slot.is_some() {
            return Err(InvariantViolation::new(
                "aggregator",
                format!("request {} recorded twice", request_number),
            ));
        }

        *slot = Some(outcome);
        self.filled += 1;
        Ok(())
    }

    /// Number of slots filled so far.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Returns `true` once every slot holds an outcome.
    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Request numbers that have not been recorded yet.
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index + 1)
            .collect()
    }

    /// Produces the final result, timing it from `start`.
    ///
    /// Finalizing while slots are still empty is an invariant violation.
    pub fn finalize(self, start: Instant) -> Result<DispatchResult, InvariantViolation> {
        let total_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !self.is_complete() {
            return Err(InvariantViolation::new(
                "aggregator",
                format!(
                    "finalized with {} of {} results, missing {:?}",
                    self.filled,
                    self.slots.len(),
                    self.missing()
                ),
            ));
        }

        let total_requests = self.slots.len();
        let results = self
            .slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.map(|outcome| TaskResult {
                    request_number: index + 1,
                    outcome,
                })
            })
            .collect();

        Ok(DispatchResult {
            total_requests,
            delay_per_request: self.delay_per_request,
            total_time_ms,
            results,
        })
    }
}
