//! Trailblaze search configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for search.json
//! - Config file lookup (explicit path, environment, user config dir, defaults)
//! - Semantic validation
//! - Named presets

pub mod preset;
pub mod resolve;
pub mod search;
pub mod validate;

pub use resolve::{load_search_config, resolve_config, ConfigSource, ResolvedConfig};
pub use search::{
    CoveragePolicy, EquivalencePolicy, FuzzingParams, GeneticParams, NoveltyEstimatorKind,
    NoveltyParams, SearchConfig, StateModelParams, SurrogateParams, TieBreak,
};
pub use validate::{validate_search_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
