//! Configuration validation errors and semantic validation.

use crate::search::{FuzzingParams, GeneticParams, NoveltyParams, SearchConfig, StateModelParams};
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for tb_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) | ValidationError::ParseError(msg) => {
                tb_common::Error::Config(msg)
            }
            other => tb_common::Error::InvalidSearchConfig(other.to_string()),
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

fn check_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 1], got {}", value)));
    }
    Ok(())
}

/// Validate a search configuration semantically.
pub fn validate_search_config(config: &SearchConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_genetic(&config.genetic)?;
    validate_fuzzing(&config.fuzzing)?;
    validate_novelty(&config.novelty)?;
    validate_state_model(&config.state_model)?;

    Ok(())
}

fn validate_genetic(params: &GeneticParams) -> ValidationResult<()> {
    if params.population_size < 2 {
        return Err(invalid(
            "genetic.population_size",
            format!("Must be at least 2, got {}", params.population_size),
        ));
    }
    if params.big_population_size < params.population_size {
        return Err(invalid(
            "genetic.big_population_size",
            format!(
                "Must be >= population_size ({}), got {}",
                params.population_size, params.big_population_size
            ),
        ));
    }
    check_probability("genetic.p_crossover", params.p_crossover)?;
    check_probability("genetic.p_mutate", params.p_mutate)?;
    if params.tournament_size == 0 {
        return Err(invalid(
            "genetic.tournament_size",
            "Must be at least 1".to_string(),
        ));
    }
    if params.max_test_case_length == 0 {
        return Err(invalid(
            "genetic.max_test_case_length",
            "Must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_fuzzing(params: &FuzzingParams) -> ValidationResult<()> {
    if params.initial_corpus_size == 0 {
        return Err(invalid(
            "fuzzing.initial_corpus_size",
            "Must be at least 1".to_string(),
        ));
    }
    if !params.max_energy.is_finite() || params.max_energy < 1.0 {
        return Err(invalid(
            "fuzzing.max_energy",
            format!("Must be finite and >= 1, got {}", params.max_energy),
        ));
    }
    if params.max_length == 0 {
        return Err(invalid(
            "fuzzing.max_length",
            "Must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_novelty(params: &NoveltyParams) -> ValidationResult<()> {
    if !params.alpha.is_finite() || params.alpha < 0.0 {
        return Err(invalid(
            "novelty.alpha",
            format!("Must be finite and >= 0, got {}", params.alpha),
        ));
    }
    if params.min_prefix_length == 0 {
        return Err(invalid(
            "novelty.min_prefix_length",
            "Must be at least 1".to_string(),
        ));
    }
    if params.min_subsequence_length == 0 {
        return Err(invalid(
            "novelty.min_subsequence_length",
            "Must be at least 1".to_string(),
        ));
    }
    check_probability(
        "novelty.min_subsequence_fraction",
        params.min_subsequence_fraction,
    )
}

fn validate_state_model(params: &StateModelParams) -> ValidationResult<()> {
    let t = params.similarity_threshold;
    if !(t > 0.0 && t <= 1.0) {
        return Err(invalid(
            "state_model.similarity_threshold",
            format!("Must be in (0, 1], got {}", t),
        ));
    }
    Ok(())
}
