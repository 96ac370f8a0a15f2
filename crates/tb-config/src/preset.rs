//! Configuration presets for common campaign shapes.
//!
//! - Default: the built-in configuration
//! - Quick: small populations and short budgets for smoke runs
//! - Thorough: large populations, exact coverage accounting, long budgets

use crate::search::{CoveragePolicy, EquivalencePolicy, SearchConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Default,
    Quick,
    Thorough,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Default, PresetName::Quick, PresetName::Thorough];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Quick => "quick",
            PresetName::Thorough => "thorough",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" | "standard" => Some(PresetName::Default),
            "quick" | "smoke" | "ci" => Some(PresetName::Quick),
            "thorough" | "deep" | "nightly" => Some(PresetName::Thorough),
            _ => None,
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> SearchConfig {
    let mut config = SearchConfig::default();
    match name {
        PresetName::Default => {}
        PresetName::Quick => {
            config.genetic.population_size = 8;
            config.genetic.big_population_size = 16;
            config.genetic.max_test_case_length = 15;
            config.genetic.max_generations = Some(10);
            config.fuzzing.initial_corpus_size = 4;
            config.fuzzing.max_energy = 10.0;
            config.fuzzing.max_length = 15;
            config.fuzzing.max_cycles = Some(20);
        }
        PresetName::Thorough => {
            config.genetic.population_size = 100;
            config.genetic.big_population_size = 200;
            config.genetic.max_generations = Some(1000);
            config.fuzzing.coverage_policy = CoveragePolicy::Recompute;
            config.fuzzing.max_cycles = Some(2000);
            config.state_model.equivalence = EquivalencePolicy::Exact;
        }
    }
    config.notes = Some(format!("preset: {}", name));
    config
}

/// List all presets with their configurations.
pub fn list_presets() -> Vec<(PresetName, SearchConfig)> {
    PresetName::ALL
        .iter()
        .map(|&name| (name, get_preset(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_search_config;

    #[test]
    fn test_all_presets_validate() {
        for (name, config) in list_presets() {
            validate_search_config(&config)
                .unwrap_or_else(|e| panic!("preset {} invalid: {}", name, e));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(PresetName::parse("smoke"), Some(PresetName::Quick));
        assert_eq!(PresetName::parse("NIGHTLY"), Some(PresetName::Thorough));
        assert_eq!(PresetName::parse("bogus"), None);
    }

    #[test]
    fn test_presets_are_deterministic() {
        assert_eq!(get_preset(PresetName::Quick), get_preset(PresetName::Quick));
    }
}
