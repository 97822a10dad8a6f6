//! Core infrastructure for fanout.
//!
//! This crate provides functionality shared by every fanout component:
//! - Event system for observability
//! - The invariant-violation error used for internal programming errors

pub mod error;
pub mod events;

pub use error::InvariantViolation;
pub use events::{EventListener, EventListeners, FanoutEvent, FnListener};
