//! Session module for presentation state
//!
//! Provides an explicit state machine with four phases:
//! - Idle: nothing in flight, nothing shown yet
//! - Busy: one request in flight, re-submission refused
//! - Success: last request produced a result (or the empty placeholder)
//! - Failed: last request produced an error message

mod machine;

pub use machine::{Phase, Session, Ticket};
