//! Dispatch requests and execution modes.

use fanout_admission::Limit;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

/// How the calls of one dispatch may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One call at a time.
    Sequential,
    /// Calls overlap, optionally bounded by a concurrency limit.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// A validated fan-out request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Delay each downstream call asks for.
    pub unit_delay: Duration,
    /// Number of downstream calls to issue.
    pub call_count: usize,
    /// Upper bound on overlapping calls in parallel mode.
    pub concurrency_limit: Option<NonZeroUsize>,
    /// Execution strategy.
    pub mode: ExecutionMode,
}

impl DispatchRequest {
    /// One call at a time.
    pub fn sequential(unit_delay: Duration, call_count: usize) -> Self {
        Self {
            unit_delay,
            call_count,
            concurrency_limit: None,
            mode: ExecutionMode::Sequential,
        }
    }

    /// Overlapping calls; `None` means no bound at all.
    pub fn parallel(
        unit_delay: Duration,
        call_count: usize,
        concurrency_limit: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            unit_delay,
            call_count,
            concurrency_limit,
            mode: ExecutionMode::Parallel,
        }
    }

    /// The admission limit this request runs under.
    ///
    /// Sequential mode is a limit of one. In parallel mode a limit above
    /// `call_count` is clamped to it, since the extra permits could never be
    /// used.
    pub fn effective_limit(&self) -> Limit {
        match (self.mode, self.concurrency_limit) {
            (ExecutionMode::Sequential, _) => Limit::SEQUENTIAL,
            (ExecutionMode::Parallel, None) => Limit::Unbounded,
            (ExecutionMode::Parallel, Some(limit)) => {
                let clamped = NonZeroUsize::new(self.call_count)
                    .map_or(limit, |count| limit.min(count));
                Limit::Bounded(clamped)
            }
        }
    }
}
