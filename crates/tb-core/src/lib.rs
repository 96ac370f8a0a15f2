//! Trailblaze Core Library
//!
//! Adaptive exploration and search for black-box test generation:
//! - `fsm`: incrementally built state abstraction of the application
//! - `surrogate`: prediction layer that replays known behavior in memory
//! - `novelty`: subjective-logic novelty scoring of traces
//! - `search`: generic genetic engine, comparators and grey-box fuzzing
//! - `testcase`: action-sequence test cases, their operators and the campaign context
//! - `target`: the contract with the application under test

pub mod fsm;
pub mod logging;
pub mod novelty;
pub mod search;
pub mod surrogate;
pub mod target;
pub mod testcase;

pub use fsm::{StateModel, Transition};
pub use surrogate::SurrogateModel;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
