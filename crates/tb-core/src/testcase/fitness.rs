//! Objectives and fuzzing feedback for test cases.
//!
//! Every objective executes the test case through the campaign first; the
//! execution record is cached on the test case so the other objectives
//! reuse it.

use super::campaign::Campaign;
use super::case::{ExecutionRecord, TestCase};
use crate::novelty::{BehaviorModel, NoveltyScorer, TransitionEvidenceModel};
use crate::search::{Direction, FitnessFunction, FuzzOracle};
use crate::target::Target;
use tb_common::StateId;

/// Distinct abstract states visited.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateCoverage;

impl<T: Target> FitnessFunction<TestCase<T::Action>, Campaign<T>> for StateCoverage {
    fn name(&self) -> &str {
        "state_coverage"
    }

    fn fitness(&self, value: &mut TestCase<T::Action>, campaign: &mut Campaign<T>) -> f64 {
        campaign.execute(value).distinct_states().len() as f64
    }
}

/// Coverage goals hit by the test case, whether run live or predicted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeCoverage;

impl<T: Target> FitnessFunction<TestCase<T::Action>, Campaign<T>> for CodeCoverage {
    fn name(&self) -> &str {
        "code_coverage"
    }

    fn fitness(&self, value: &mut TestCase<T::Action>, campaign: &mut Campaign<T>) -> f64 {
        campaign.execute(value).coverage.len() as f64
    }
}

/// Shortest known distance from any visited state to a goal state.
///
/// Unreachable goals score the number of known states, one more than any
/// real path can be long.
#[derive(Debug, Clone, Copy)]
pub struct TargetStateDistance {
    pub goal: StateId,
}

impl<T: Target> FitnessFunction<TestCase<T::Action>, Campaign<T>> for TargetStateDistance {
    fn name(&self) -> &str {
        "target_state_distance"
    }

    fn fitness(&self, value: &mut TestCase<T::Action>, campaign: &mut Campaign<T>) -> f64 {
        let visited = campaign.execute(value).distinct_states();
        let model = campaign.state_model();
        visited
            .iter()
            .filter_map(|&s| model.shortest_path(s, self.goal).map(|path| path.len()))
            .min()
            .unwrap_or(model.num_states()) as f64
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }
}

/// Number of actions; shorter is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Length;

impl<T: Target> FitnessFunction<TestCase<T::Action>, Campaign<T>> for Length {
    fn name(&self) -> &str {
        "length"
    }

    fn fitness(&self, value: &mut TestCase<T::Action>, _campaign: &mut Campaign<T>) -> f64 {
        value.actions().len() as f64
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }
}

/// Subjective-logic novelty of the executed trace.
///
/// Without an explicit behavior model, opinions come from the surrogate's
/// frequency counters at evaluation time.
pub struct NoveltyFitness<A> {
    scorer: NoveltyScorer,
    model: Option<Box<dyn BehaviorModel<A>>>,
}

impl<A> NoveltyFitness<A> {
    pub fn new(scorer: NoveltyScorer) -> Self {
        Self {
            scorer,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl BehaviorModel<A> + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }
}

impl<T: Target> FitnessFunction<TestCase<T::Action>, Campaign<T>> for NoveltyFitness<T::Action> {
    fn name(&self) -> &str {
        "novelty"
    }

    fn fitness(&self, value: &mut TestCase<T::Action>, campaign: &mut Campaign<T>) -> f64 {
        let record = campaign.execute(value);
        match &self.model {
            Some(model) => self.scorer.score(model.as_ref(), &record.transitions),
            None => {
                let model = TransitionEvidenceModel::from_surrogate(campaign.surrogate());
                self.scorer.score(&model, &record.transitions)
            }
        }
    }
}

/// Fuzzing feedback: code goals plus distinct states, campaign-wide and per test case.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestCaseOracle;

impl<T: Target> FuzzOracle<TestCase<T::Action>, Campaign<T>> for TestCaseOracle {
    fn coverage(&self, value: &mut TestCase<T::Action>, campaign: &mut Campaign<T>) -> f64 {
        let record = campaign.execute(value);
        (record.coverage.len() + record.distinct_states().len()) as f64
    }

    fn combined_coverage(&self, campaign: &Campaign<T>) -> f64 {
        campaign.coverage().combined() as f64
    }

    fn is_crash(&self, value: &TestCase<T::Action>, _campaign: &Campaign<T>) -> bool {
        value.record().is_some_and(ExecutionRecord::crashed)
    }
}
