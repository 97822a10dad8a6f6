//! Admission controller tests.
//!
//! Test organization:
//! - permits.rs: permit lifecycle across tasks
//! - fairness.rs: FIFO wakeups and waiter accounting
