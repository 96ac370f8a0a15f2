//! Test cases for the application under test and the wiring that plugs
//! them into the search engines.

mod campaign;
mod case;
mod fitness;
mod operators;

pub use campaign::{Campaign, CampaignStats, CoverageTracker};
pub use case::{ExecutionRecord, TestCase};
pub use fitness::{
    CodeCoverage, Length, NoveltyFitness, StateCoverage, TargetStateDistance, TestCaseOracle,
};
pub use operators::{CutPointMutation, RandomTestCaseFactory, SinglePointCrossover};

use crate::search::{FitnessFunction, GeneticEngine, GreyBoxFuzzer};
use crate::target::Target;
use tb_common::Result;
use tb_config::SearchConfig;

/// Objective list over test cases of `T`.
pub type Objectives<T> =
    Vec<Box<dyn FitnessFunction<TestCase<<T as Target>::Action>, Campaign<T>>>>;

/// Genetic engine over test cases with random exploration, cut-and-splice
/// crossover and cut-point mutation.
pub fn genetic_engine<T: Target>(
    config: &SearchConfig,
    seed: u64,
    objectives: Objectives<T>,
) -> Result<GeneticEngine<TestCase<T::Action>, Campaign<T>>> {
    let max_length = config.genetic.max_test_case_length;
    GeneticEngine::new(
        &config.genetic,
        seed,
        RandomTestCaseFactory { max_length },
        SinglePointCrossover { max_length },
        CutPointMutation { max_length },
        objectives,
    )
}

/// Grey-box fuzzer over test cases, guided by code and state coverage.
pub fn greybox_fuzzer<T: Target>(
    config: &SearchConfig,
    seed: u64,
) -> Result<GreyBoxFuzzer<TestCase<T::Action>, Campaign<T>>> {
    let max_length = config.fuzzing.max_length;
    GreyBoxFuzzer::new(
        &config.fuzzing,
        seed,
        RandomTestCaseFactory { max_length },
        CutPointMutation { max_length },
        TestCaseOracle,
    )
}
