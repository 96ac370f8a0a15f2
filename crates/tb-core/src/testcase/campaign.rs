//! Campaign context: the application, the surrogate in front of it and
//! campaign-wide coverage.
//!
//! A `Campaign` is the context object handed `&mut` to every operator and
//! objective working on test cases. Test cases start from a fresh launch of
//! the application, which is assumed to land in the root state.

use super::case::{ExecutionRecord, TestCase};
use crate::fsm::{policy_from_params, StateModel, Transition};
use crate::logging::{event_names, Stage};
use crate::surrogate::SurrogateModel;
use crate::target::{Target, TargetError, TraceSet};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::collections::BTreeSet;
use tb_common::StateId;
use tb_config::SearchConfig;

type Surrogate<T> =
    SurrogateModel<<T as Target>::Observation, <T as Target>::Action, <T as Target>::Outcome>;

/// Coverage accumulated over the whole campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageTracker {
    goals: BTreeSet<u64>,
    states: BTreeSet<StateId>,
}

impl CoverageTracker {
    /// Merge coverage goals; returns how many were new.
    pub fn record_goals(&mut self, goals: &BTreeSet<u64>) -> usize {
        let before = self.goals.len();
        self.goals.extend(goals.iter().copied());
        self.goals.len() - before
    }

    pub fn record_state(&mut self, state: StateId) -> bool {
        self.states.insert(state)
    }

    pub fn goals(&self) -> &BTreeSet<u64> {
        &self.goals
    }

    pub fn states(&self) -> &BTreeSet<StateId> {
        &self.states
    }

    /// Combined coverage: code goals plus distinct states reached.
    pub fn combined(&self) -> usize {
        self.goals.len() + self.states.len()
    }
}

/// Counters of real and predicted work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CampaignStats {
    pub real_actions: u64,
    pub predicted_actions: u64,
    pub restarts: u64,
    pub failures: u64,
}

pub struct Campaign<T: Target> {
    target: T,
    surrogate: Surrogate<T>,
    coverage: CoverageTracker,
    /// Goals the application hits on launch, credited to predicted test cases.
    launch_goals: BTreeSet<u64>,
    use_surrogate: bool,
    stats: CampaignStats,
}

impl<T: Target> Campaign<T> {
    /// Launch the application once to anchor the state model's root.
    pub fn new(mut target: T, config: &SearchConfig, seed: u64) -> Result<Self, TargetError> {
        let initial = target.restart()?;
        let mut coverage = CoverageTracker::default();
        let launch_goals = target.take_coverage();
        coverage.record_goals(&launch_goals);

        let model = StateModel::new(initial, policy_from_params(&config.state_model));
        coverage.record_state(model.root());
        let surrogate = SurrogateModel::new(model, &config.surrogate, seed);
        Ok(Self {
            target,
            surrogate,
            coverage,
            launch_goals,
            use_surrogate: config.surrogate.enabled,
            stats: CampaignStats {
                restarts: 1,
                ..CampaignStats::default()
            },
        })
    }

    /// Execute a test case unless it already carries an execution record.
    pub fn execute<'a>(
        &mut self,
        test_case: &'a mut TestCase<T::Action>,
    ) -> &'a ExecutionRecord<T::Action> {
        test_case.record_or_run(|actions| self.run_actions(actions))
    }

    /// Run an action sequence, from the surrogate while it can answer and
    /// for real from the first miss on.
    pub fn run_actions(&mut self, actions: &[T::Action]) -> ExecutionRecord<T::Action> {
        let mut record = ExecutionRecord::default();
        let root = self.surrogate.state_model().root();
        let mut live = !(self.use_surrogate && self.surrogate.reset_to_state(root).is_ok());

        if live {
            if let Err(err) = self.restart_live(&mut record, true) {
                self.fail(&mut record, err);
                return record;
            }
        } else {
            record.restart(root);
            record.coverage.extend(self.launch_goals.iter().copied());
        }

        for action in actions {
            if !live {
                let source = self.surrogate.current_state();
                if self.surrogate.predict_action(action).is_some() {
                    let traces = self
                        .surrogate
                        .predicted_traces()
                        .last()
                        .cloned()
                        .unwrap_or_default();
                    if let Some(goals) = self.surrogate.predicted_goals().last() {
                        record.coverage.extend(goals.iter().copied());
                    }
                    let transition =
                        Transition::new(source, action.clone(), self.surrogate.current_state());
                    record.push(transition, traces);
                    self.stats.predicted_actions += 1;
                    continue;
                }

                // Replay what was predicted so far, this time for real.
                live = true;
                let replay = self.surrogate.take_replay();
                if let Err(err) = self.restart_live(&mut record, false) {
                    self.fail(&mut record, err);
                    return record;
                }
                for replayed in &replay {
                    if let Err(err) = self.step_live(replayed, &mut record) {
                        self.fail(&mut record, err);
                        return record;
                    }
                }
            }

            if let Err(err) = self.step_live(action, &mut record) {
                self.fail(&mut record, err);
                return record;
            }
        }

        record.predicted = !live && self.surrogate.has_predicted_every_action();
        for &state in &record.visited {
            self.coverage.record_state(state);
        }
        record
    }

    /// Run `prefix` for real, then extend it with up to `tail` random actions
    /// chosen from what the application offers on each screen.
    pub fn explore(
        &mut self,
        prefix: &[T::Action],
        tail: usize,
        rng: &mut StdRng,
    ) -> TestCase<T::Action> {
        let mut actions = prefix.to_vec();
        let mut record = ExecutionRecord::default();
        if let Err(err) = self.restart_live(&mut record, true) {
            self.fail(&mut record, err);
            return TestCase::executed(actions, record);
        }
        for action in prefix {
            if let Err(err) = self.step_live(action, &mut record) {
                self.fail(&mut record, err);
                return TestCase::executed(actions, record);
            }
        }
        for _ in 0..tail {
            let Some(action) = self.target.available_actions().choose(rng).cloned() else {
                break;
            };
            actions.push(action.clone());
            if let Err(err) = self.step_live(&action, &mut record) {
                self.fail(&mut record, err);
                break;
            }
        }
        for &state in &record.visited {
            self.coverage.record_state(state);
        }
        TestCase::executed(actions, record)
    }

    fn restart_live(
        &mut self,
        record: &mut ExecutionRecord<T::Action>,
        fresh: bool,
    ) -> Result<(), TargetError> {
        let observation = self.target.restart()?;
        self.stats.restarts += 1;
        let goals = self.target.take_coverage();
        self.coverage.record_goals(&goals);
        self.launch_goals.extend(goals.iter().copied());
        record.coverage.extend(goals);

        let state = if fresh {
            self.surrogate.reset(observation)
        } else {
            self.surrogate.resync(observation)
        };
        record.restart(state);
        Ok(())
    }

    fn step_live(
        &mut self,
        action: &T::Action,
        record: &mut ExecutionRecord<T::Action>,
    ) -> Result<(), TargetError> {
        let source = self.surrogate.current_state();
        let execution = self.target.execute(action)?;
        self.stats.real_actions += 1;

        let goals = self.target.take_coverage();
        self.coverage.record_goals(&goals);
        record.coverage.extend(goals.iter().copied());

        let target = self.surrogate.get_state(execution.observation);
        let traces: TraceSet = execution.traces;
        self.surrogate.update(
            source,
            target,
            action.clone(),
            execution.outcome,
            traces.clone(),
            goals,
        );
        record.push(Transition::new(source, action.clone(), target), traces);
        Ok(())
    }

    fn fail(&mut self, record: &mut ExecutionRecord<T::Action>, err: TargetError) {
        self.stats.failures += 1;
        tracing::warn!(
            event = event_names::TARGET_FAILURE,
            stage = %Stage::Explore,
            error = %err,
            steps = record.transitions.len(),
            "target failure stopped the test case"
        );
        for &state in &record.visited {
            self.coverage.record_state(state);
        }
        record.failure = Some(err);
    }

    pub fn surrogate(&self) -> &Surrogate<T> {
        &self.surrogate
    }

    pub fn state_model(&self) -> &StateModel<T::Observation, T::Action> {
        self.surrogate.state_model()
    }

    pub fn coverage(&self) -> &CoverageTracker {
        &self.coverage
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn stats(&self) -> CampaignStats {
        self.stats
    }
}
