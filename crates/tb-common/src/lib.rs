//! Trailblaze common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the tb-* crates:
//! - Stable handles for states and chromosomes
//! - The unified error type with codes and categories

pub mod error;
pub mod id;

pub use error::{Error, ErrorCategory, Result};
pub use id::{ChromosomeId, StateId};
