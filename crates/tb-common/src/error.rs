//! Error types for Trailblaze.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for the campaign driver
//!
//! Module-local errors (state model, opinions, target execution, config
//! validation) are defined next to their modules and convert into [`Error`]
//! at crate boundaries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Trailblaze operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Search configuration errors.
    Config,
    /// State model and opinion algebra errors.
    Model,
    /// Search engine errors.
    Search,
    /// Failures of the application under test.
    Target,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Search => write!(f, "search"),
            ErrorCategory::Target => write!(f, "target"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Trailblaze.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid search configuration: {0}")]
    InvalidSearchConfig(String),

    // Model errors (20-29)
    #[error("state {state} was never registered in the state model")]
    UnknownState { state: String },

    #[error("invalid opinion: {0}")]
    InvalidOpinion(String),

    // Search errors (30-39)
    #[error("search failed: {0}")]
    Search(String),

    #[error("empty population: {0}")]
    EmptyPopulation(String),

    // Target errors (40-49)
    #[error("target unreachable: {0}")]
    TargetUnreachable(String),

    #[error("target crashed: {0}")]
    TargetCrashed(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Model errors
    /// - 30-39: Search errors
    /// - 40-49: Target errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSearchConfig(_) => 11,
            Error::UnknownState { .. } => 20,
            Error::InvalidOpinion(_) => 21,
            Error::Search(_) => 30,
            Error::EmptyPopulation(_) => 31,
            Error::TargetUnreachable(_) => 40,
            Error::TargetCrashed(_) => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidSearchConfig(_) => ErrorCategory::Config,
            Error::UnknownState { .. } | Error::InvalidOpinion(_) => ErrorCategory::Model,
            Error::Search(_) | Error::EmptyPopulation(_) => ErrorCategory::Search,
            Error::TargetUnreachable(_) | Error::TargetCrashed(_) => ErrorCategory::Target,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Caller errors against the model are fatal. Target failures are
    /// recoverable by restarting the application and moving on to the next
    /// chromosome.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidSearchConfig(_) => true,

            // Caller bug: never retried
            Error::UnknownState { .. } => false,
            Error::InvalidOpinion(_) => false,

            Error::Search(_) => false,
            Error::EmptyPopulation(_) => false,

            Error::TargetUnreachable(_) => true,
            Error::TargetCrashed(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }
}
