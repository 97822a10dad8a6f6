//! Admission control for fanout tasks.
//!
//! An [`AdmissionController`] bounds how many tasks run at once. Each task
//! takes a [`Permit`] before doing its work and hands it back afterwards;
//! callers that arrive while every permit is out are suspended and woken in
//! arrival order.
//!
//! A limit of one gives strictly sequential execution and
//! [`Limit::Unbounded`] lets every task through immediately, so the same
//! controller covers all three execution strategies.
//!
//! # Basic Example
//!
//! ```rust
//! use fanout_admission::{AdmissionController, Limit};
//!
//! # async fn example() {
//! let controller = AdmissionController::new(Limit::bounded(2).unwrap());
//!
//! let permit = controller.acquire().await.expect("controller is open");
//! assert_eq!(controller.in_flight(), 1);
//!
//! // ... do the work ...
//!
//! controller.release(permit).expect("permit came from this controller");
//! assert_eq!(controller.in_flight(), 0);
//! # }
//! ```
//!
//! # Example with Event Listeners
//!
//! ```rust
//! use fanout_admission::{AdmissionConfig, Limit};
//!
//! let controller = AdmissionConfig::builder()
//!     .limit(Limit::SEQUENTIAL)
//!     .name("sequential")
//!     .on_permit_acquired(|in_flight, waited| {
//!         println!("permit out ({} in flight) after {:?}", in_flight, waited);
//!     })
//!     .on_permit_released(|in_flight, held| {
//!         println!("permit back ({} in flight), held {:?}", in_flight, held);
//!     })
//!     .build();
//! # let _ = controller;
//! ```
//!
//! # Ownership
//!
//! [`AdmissionController::release`] consumes the permit, so a permit cannot
//! be released twice. A permit issued by a different controller is rejected
//! with an [`InvariantViolation`](fanout_core::InvariantViolation). A permit
//! that is simply dropped, for example by an aborted task, goes back to its
//! pool automatically.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;

pub use config::{AdmissionConfig, AdmissionConfigBuilder, Limit};
pub use controller::{AdmissionController, Permit};
pub use error::{AdmissionError, Result};
pub use events::AdmissionEvent;
