//! Search configuration types.
//!
//! Every section has defaults, so a minimal `search.json` only needs
//! `schema_version`.

use serde::{Deserialize, Serialize};

/// Complete search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub schema_version: String,

    /// Seed for every random source in a campaign. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub genetic: GeneticParams,
    #[serde(default)]
    pub fuzzing: FuzzingParams,
    #[serde(default)]
    pub novelty: NoveltyParams,
    #[serde(default)]
    pub surrogate: SurrogateParams,
    #[serde(default)]
    pub state_model: StateModelParams,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            seed: None,
            genetic: GeneticParams::default(),
            fuzzing: FuzzingParams::default(),
            novelty: NoveltyParams::default(),
            surrogate: SurrogateParams::default(),
            state_model: StateModelParams::default(),
            notes: None,
        }
    }
}

impl SearchConfig {
    /// Load a search configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::validate::ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::validate::ValidationError::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse_json(&content)
    }

    /// Parse a search configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, crate::validate::ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid JSON: {}", e))
        })
    }
}

/// Parameters of the generational genetic engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    pub population_size: usize,
    /// Size the intermediate population grows to before survivor selection.
    pub big_population_size: usize,
    pub p_crossover: f64,
    pub p_mutate: f64,
    pub tournament_size: usize,
    /// Upper bound on actions per generated test case.
    pub max_test_case_length: usize,
    /// Stop after this many generations. `None` runs until another condition stops the search.
    pub max_generations: Option<u64>,
    /// Wall-clock budget for the whole search, checked between generations.
    pub max_seconds: Option<u64>,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            big_population_size: 100,
            p_crossover: 0.7,
            p_mutate: 0.3,
            tournament_size: 2,
            max_test_case_length: 50,
            max_generations: Some(100),
            max_seconds: None,
        }
    }
}

/// How the grey-box fuzzer decides whether a mutant increased coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Baseline computed once per energy assignment. Every mutant after the
    /// first gain in a cycle also beats the stale baseline and joins the corpus.
    #[default]
    Snapshot,
    /// Baseline recomputed before every mutant.
    Recompute,
}

/// Parameters of the grey-box fuzzing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzingParams {
    pub initial_corpus_size: usize,
    pub max_energy: f64,
    /// Length at which a seed receives the minimum energy of 1.
    pub max_length: usize,
    pub coverage_policy: CoveragePolicy,
    /// Stop after this many energy cycles.
    pub max_cycles: Option<u64>,
    pub max_seconds: Option<u64>,
}

impl Default for FuzzingParams {
    fn default() -> Self {
        Self {
            initial_corpus_size: 10,
            max_energy: 50.0,
            max_length: 50,
            coverage_policy: CoveragePolicy::Snapshot,
            max_cycles: Some(200),
            max_seconds: None,
        }
    }
}

/// Novelty estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyEstimatorKind {
    Average,
    #[default]
    Multiplicative,
    Fusion,
    MaxNovelPrefix,
    MaxNovelSubsequence,
}

/// Parameters of the subjective-logic novelty scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyParams {
    /// Weight of disbelief relative to uncertainty in the score.
    pub alpha: f64,
    pub estimator: NoveltyEstimatorKind,
    /// Divide the score by trace length.
    pub discounted: bool,
    pub min_prefix_length: usize,
    pub min_subsequence_length: usize,
    /// Minimum window size as a fraction of the trace length.
    pub min_subsequence_fraction: f64,
}

impl Default for NoveltyParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            estimator: NoveltyEstimatorKind::Multiplicative,
            discounted: false,
            min_prefix_length: 5,
            min_subsequence_length: 3,
            min_subsequence_fraction: 0.2,
        }
    }
}

/// Choice among equally frequent surrogate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    UniformRandom,
    MostRecent,
}

/// Parameters of the surrogate prediction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurrogateParams {
    pub enabled: bool,
    pub tie_break: TieBreak,
}

impl Default for SurrogateParams {
    fn default() -> Self {
        Self {
            enabled: true,
            tie_break: TieBreak::UniformRandom,
        }
    }
}

/// Observation equivalence used by the state model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquivalencePolicy {
    Exact,
    #[default]
    Cosine,
}

/// Parameters of the state abstraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateModelParams {
    pub equivalence: EquivalencePolicy,
    /// Minimum cosine similarity for two observations to share a state.
    pub similarity_threshold: f64,
}

impl Default for StateModelParams {
    fn default() -> Self {
        Self {
            equivalence: EquivalencePolicy::Cosine,
            similarity_threshold: 0.95,
        }
    }
}
