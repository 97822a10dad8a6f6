//! Query parameter parsing and validation.
//!
//! Both camelCase and snake_case names are accepted. A value that is missing
//! takes its default; a value that is present but not an integer fails with
//! the same message as an out-of-range one. Parsing is strict: there is no
//! leading-digits fallback, so `2.5` and `3s` are rejected rather than read
//! as `2` and `3`.

use fanout_dispatch::{DispatchRequest, ExecutionMode};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// Delay used when `delaySecs` is absent.
pub const DEFAULT_DELAY_SECS: u64 = 2;
/// Call count used when `numOfCalls` is absent.
pub const DEFAULT_NUM_OF_CALLS: usize = 10;

const DELAY_SECS_RANGE: RangeInclusive<u64> = 1..=10;
const NUM_OF_CALLS_RANGE: RangeInclusive<usize> = 2..=50;
const CALL_LIMIT_RANGE: RangeInclusive<usize> = 1..=20;

/// A query parameter outside its allowed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("delaySecs must be between 1 and 10")]
    DelaySecs,
    #[error("numOfCalls must be between 2 and 50")]
    NumOfCalls,
    #[error("callLimit must be between 1 and 20")]
    CallLimit,
}

/// Validated parameters of a delay endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayParams {
    pub delay_secs: u64,
    pub num_of_calls: usize,
    pub call_limit: Option<NonZeroUsize>,
}

impl DelayParams {
    /// Validates the raw query string map.
    ///
    /// Checks run in order `delaySecs`, `numOfCalls`, `callLimit`; the first
    /// violation wins.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let delay_secs = parse_in_range(
            lookup(query, "delaySecs", "delay_secs"),
            DELAY_SECS_RANGE,
            ValidationError::DelaySecs,
        )?
        .unwrap_or(DEFAULT_DELAY_SECS);

        let num_of_calls = parse_in_range(
            lookup(query, "numOfCalls", "num_of_calls"),
            NUM_OF_CALLS_RANGE,
            ValidationError::NumOfCalls,
        )?
        .unwrap_or(DEFAULT_NUM_OF_CALLS);

        let call_limit = parse_in_range(
            lookup(query, "callLimit", "call_limit"),
            CALL_LIMIT_RANGE,
            ValidationError::CallLimit,
        )?
        .and_then(NonZeroUsize::new);

        Ok(Self {
            delay_secs,
            num_of_calls,
            call_limit,
        })
    }

    /// Builds the dispatch request for `mode`. `callLimit` only applies to
    /// parallel mode.
    pub fn into_request(self, mode: ExecutionMode) -> DispatchRequest {
        let delay = Duration::from_secs(self.delay_secs);
        match mode {
            ExecutionMode::Sequential => DispatchRequest::sequential(delay, self.num_of_calls),
            ExecutionMode::Parallel => {
                DispatchRequest::parallel(delay, self.num_of_calls, self.call_limit)
            }
        }
    }
}

fn lookup<'a>(query: &'a HashMap<String, String>, camel: &str, snake: &str) -> Option<&'a str> {
    query
        .get(camel)
        .or_else(|| query.get(snake))
        .map(String::as_str)
}

fn parse_in_range<T>(
    raw: Option<&str>,
    range: RangeInclusive<T>,
    error: ValidationError,
) -> Result<Option<T>, ValidationError>
where
    T: FromStr + PartialOrd,
{
    match raw {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if range.contains(&value) => Ok(Some(value)),
            _ => Err(error),
        },
    }
}
