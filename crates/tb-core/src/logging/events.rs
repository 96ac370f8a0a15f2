//! Structured event names and search stages.
//!
//! Every event emitted by the engines carries an `event` field with one of
//! the names below and a `stage` field, so JSONL logs can be filtered
//! without parsing messages.

use serde::{Deserialize, Serialize};

/// Stages of a search campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Executing actions against the application.
    Explore,
    /// Replaying known behavior from the surrogate model.
    Predict,
    /// Generational search.
    Evolve,
    /// Grey-box fuzzing cycles.
    Fuzz,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Explore, Stage::Predict, Stage::Evolve, Stage::Fuzz];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Explore => "explore",
            Stage::Predict => "predict",
            Stage::Evolve => "evolve",
            Stage::Fuzz => "fuzz",
        }
    }

    /// Module whose events belong to the stage, used as a filter target.
    pub fn module(self) -> &'static str {
        match self {
            Stage::Explore => "tb_core::testcase",
            Stage::Predict => "tb_core::surrogate",
            Stage::Evolve => "tb_core::search::genetic",
            Stage::Fuzz => "tb_core::search::fuzzing",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

/// Stable event names.
pub mod event_names {
    pub const SEARCH_STARTED: &str = "search.started";
    pub const SEARCH_FINISHED: &str = "search.finished";
    pub const POPULATION_CREATED: &str = "search.population_created";
    pub const GENERATION_EVOLVED: &str = "search.generation_evolved";
    pub const ARCHIVE_UPDATED: &str = "search.archive_updated";

    pub const FUZZ_ENERGY_ASSIGNED: &str = "fuzz.energy_assigned";
    pub const FUZZ_INTERESTING: &str = "fuzz.interesting";
    pub const FUZZ_CRASH: &str = "fuzz.crash";

    pub const SURROGATE_MISS: &str = "surrogate.prediction_miss";
    pub const SURROGATE_TEST_CASE: &str = "surrogate.test_case_finished";

    pub const TARGET_FAILURE: &str = "target.failure";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Evolve).unwrap(), "\"evolve\"");
        assert_eq!(Stage::Predict.to_string(), "predict");
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn test_event_names_are_namespaced() {
        for name in [
            event_names::SEARCH_STARTED,
            event_names::GENERATION_EVOLVED,
            event_names::FUZZ_CRASH,
            event_names::SURROGATE_MISS,
            event_names::TARGET_FAILURE,
        ] {
            assert!(name.contains('.'), "{name}");
        }
    }
}
