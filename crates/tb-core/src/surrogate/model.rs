//! Surrogate prediction layer over the state model.
//!
//! Every real execution is recorded as a [`SurrogateTransition`] keyed by
//! `(source, action, target, traces)`, together with the coverage goals the
//! step hit. While a test case runs in prediction mode, actions are answered
//! from these records without touching the application. The first miss switches the test case to ground truth for
//! good: the cursor rolls back to the last really-reached state
//! (the checkpoint) and the caller replays the predicted actions for real.

use crate::fsm::{FsmError, StateModel, Transition};
use crate::logging::{event_names, Stage};
use crate::target::TraceSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use tb_common::StateId;
use tb_config::{SurrogateParams, TieBreak};

/// A transition observed for real, with its cached result.
#[derive(Debug, Clone)]
pub struct SurrogateTransition<A, R> {
    transition: Transition<A>,
    traces: TraceSet,
    goals: BTreeSet<u64>,
    result: R,
    frequency: u32,
    last_seen: u64,
}

impl<A, R> SurrogateTransition<A, R> {
    pub fn transition(&self) -> &Transition<A> {
        &self.transition
    }

    pub fn traces(&self) -> &TraceSet {
        &self.traces
    }

    /// Union of the coverage goals hit each time the transition was observed.
    pub fn goals(&self) -> &BTreeSet<u64> {
        &self.goals
    }

    pub fn result(&self) -> &R {
        &self.result
    }

    /// Number of times this exact transition was observed.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }
}

/// Whether the current test case is still answered from the surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Prediction,
    GroundTruth,
}

/// Lifetime prediction statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurrogateStats {
    pub predictions: u64,
    pub misses: u64,
    pub test_cases: u64,
    /// Test cases answered entirely without the application.
    pub fully_predicted: u64,
}

impl SurrogateStats {
    pub fn hit_rate(&self) -> f64 {
        let attempts = self.predictions + self.misses;
        if attempts == 0 {
            return 0.0;
        }
        self.predictions as f64 / attempts as f64
    }
}

/// State model wrapped with a learned transition cache.
pub struct SurrogateModel<O, A, R> {
    model: StateModel<O, A>,
    transitions: Vec<SurrogateTransition<A, R>>,
    by_source_action: HashMap<(StateId, A), Vec<usize>>,
    checkpoint: StateId,
    mode: Mode,
    predicted_traces: Vec<TraceSet>,
    predicted_goals: Vec<BTreeSet<u64>>,
    unconfirmed: Vec<A>,
    predictions: u32,
    misses: u32,
    stats: SurrogateStats,
    tie_break: TieBreak,
    rng: StdRng,
    clock: u64,
}

impl<O, A, R> SurrogateModel<O, A, R>
where
    A: Clone + Eq + Hash + std::fmt::Debug,
    R: Clone,
{
    pub fn new(model: StateModel<O, A>, params: &SurrogateParams, seed: u64) -> Self {
        let checkpoint = model.current_state();
        Self {
            model,
            transitions: Vec::new(),
            by_source_action: HashMap::new(),
            checkpoint,
            mode: Mode::Prediction,
            predicted_traces: Vec::new(),
            predicted_goals: Vec::new(),
            unconfirmed: Vec::new(),
            predictions: 0,
            misses: 0,
            stats: SurrogateStats::default(),
            tie_break: params.tie_break,
            rng: StdRng::seed_from_u64(seed),
            clock: 0,
        }
    }

    /// Answer `action` from the cache, or `None` if it cannot be predicted.
    ///
    /// `None` means the caller must execute for real: first the actions
    /// returned by [`SurrogateModel::take_replay`], then `action` itself.
    pub fn predict_action(&mut self, action: &A) -> Option<R> {
        if self.mode == Mode::GroundTruth {
            return None;
        }

        let current = self.model.current_state();
        let candidates = self
            .by_source_action
            .get(&(current, action.clone()))
            .cloned()
            .unwrap_or_default();
        if candidates.is_empty() {
            self.record_miss(current, action);
            return None;
        }
        let chosen = self.choose(candidates);

        let target = self.transitions[chosen].transition.target;
        if self.model.go_to_state(target).is_err() {
            // Target was pruned from the model since it was recorded.
            self.record_miss(current, action);
            return None;
        }

        let entry = &self.transitions[chosen];
        self.predicted_traces.push(entry.traces.clone());
        self.predicted_goals.push(entry.goals.clone());
        self.unconfirmed.push(action.clone());
        self.predictions += 1;
        self.stats.predictions += 1;
        tracing::trace!(
            stage = %Stage::Predict,
            source = %current,
            target = %target,
            frequency = entry.frequency,
            "predicted action"
        );
        Some(entry.result.clone())
    }

    /// Highest frequency wins; ties are broken by the configured policy.
    fn choose(&mut self, candidates: Vec<usize>) -> usize {
        let best = candidates
            .iter()
            .map(|&i| self.transitions[i].frequency)
            .max()
            .unwrap_or(0);
        let tied: Vec<usize> = candidates
            .into_iter()
            .filter(|&i| self.transitions[i].frequency == best)
            .collect();
        match self.tie_break {
            TieBreak::UniformRandom => tied[self.rng.random_range(0..tied.len())],
            TieBreak::MostRecent => tied
                .iter()
                .copied()
                .max_by_key(|&i| self.transitions[i].last_seen)
                .unwrap_or(tied[0]),
        }
    }

    fn record_miss(&mut self, state: StateId, action: &A) {
        self.misses += 1;
        self.stats.misses += 1;
        self.predicted_traces.clear();
        self.predicted_goals.clear();
        self.mode = Mode::GroundTruth;
        if let Err(err) = self.model.go_to_state(self.checkpoint) {
            tracing::warn!(error = %err, "checkpoint vanished from the state model");
        }
        tracing::debug!(
            event = event_names::SURROGATE_MISS,
            stage = %Stage::Predict,
            state = %state,
            action = ?action,
            replay = self.unconfirmed.len(),
            "surrogate cannot predict action"
        );
    }

    /// Record a real execution.
    pub fn update(
        &mut self,
        source: StateId,
        target: StateId,
        action: A,
        result: R,
        traces: TraceSet,
        goals: BTreeSet<u64>,
    ) {
        self.clock += 1;
        let key = (source, action.clone());
        let existing = self.by_source_action.get(&key).and_then(|indices| {
            indices.iter().copied().find(|&i| {
                let st = &self.transitions[i];
                st.transition.target == target && st.traces == traces
            })
        });

        match existing {
            Some(idx) => {
                let entry = &mut self.transitions[idx];
                entry.frequency += 1;
                entry.last_seen = self.clock;
                entry.goals.extend(goals);
            }
            None => {
                let idx = self.transitions.len();
                self.transitions.push(SurrogateTransition {
                    transition: Transition::new(source, action.clone(), target),
                    traces,
                    goals,
                    result,
                    frequency: 1,
                    last_seen: self.clock,
                });
                self.by_source_action.entry(key).or_default().push(idx);
            }
        }

        self.model.add_transition(Transition::new(source, action, target));
        self.checkpoint = target;
    }

    /// Start a new test case at the state matching `observation`.
    pub fn reset(&mut self, observation: O) -> StateId {
        self.finish_test_case();
        let state = self.model.restart_at(observation);
        self.checkpoint = state;
        state
    }

    /// Start a new test case at a registered state without observing the
    /// application, e.g. the root when every test case starts from a fresh launch.
    pub fn reset_to_state(&mut self, state: StateId) -> Result<(), FsmError> {
        self.model.go_to_state(state)?;
        self.finish_test_case();
        self.checkpoint = state;
        Ok(())
    }

    /// Re-anchor cursor and checkpoint on a fresh observation of the real
    /// application, keeping the test case's mode and counters.
    pub fn resync(&mut self, observation: O) -> StateId {
        let state = self.model.restart_at(observation);
        self.checkpoint = state;
        state
    }

    fn finish_test_case(&mut self) {
        if self.predictions + self.misses > 0 {
            self.stats.test_cases += 1;
            if self.has_predicted_every_action() {
                self.stats.fully_predicted += 1;
            }
            tracing::trace!(
                event = event_names::SURROGATE_TEST_CASE,
                predictions = self.predictions,
                misses = self.misses,
                "surrogate test case finished"
            );
        }
        self.predictions = 0;
        self.misses = 0;
        self.mode = Mode::Prediction;
        self.predicted_traces.clear();
        self.predicted_goals.clear();
        self.unconfirmed.clear();
    }

    /// True iff the current test case never missed and predicted at least once.
    pub fn has_predicted_every_action(&self) -> bool {
        self.misses == 0 && self.predictions > 0
    }

    /// Actions predicted since the checkpoint, to be replayed for real after a miss.
    pub fn take_replay(&mut self) -> Vec<A> {
        std::mem::take(&mut self.unconfirmed)
    }

    /// Move both cursor and checkpoint to a registered state.
    pub fn go_to_state(&mut self, state: StateId) -> Result<(), FsmError> {
        self.model.go_to_state(state)?;
        self.checkpoint = state;
        Ok(())
    }

    /// Map an observation to its abstract state.
    pub fn get_state(&mut self, observation: O) -> StateId {
        self.model.get_state(observation)
    }

    pub fn state_model(&self) -> &StateModel<O, A> {
        &self.model
    }

    pub fn current_state(&self) -> StateId {
        self.model.current_state()
    }

    pub fn checkpoint(&self) -> StateId {
        self.checkpoint
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Trace signatures of the actions predicted so far in this test case.
    pub fn predicted_traces(&self) -> &[TraceSet] {
        &self.predicted_traces
    }

    /// Coverage goals of the actions predicted so far, one set per action.
    pub fn predicted_goals(&self) -> &[BTreeSet<u64>] {
        &self.predicted_goals
    }

    pub fn surrogate_transitions(&self) -> &[SurrogateTransition<A, R>] {
        &self.transitions
    }

    /// Recorded transitions leaving `source` under `action`.
    pub fn candidates(&self, source: StateId, action: &A) -> Vec<&SurrogateTransition<A, R>> {
        self.by_source_action
            .get(&(source, action.clone()))
            .map(|indices| indices.iter().map(|&i| &self.transitions[i]).collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> &SurrogateStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::ExactMatch;

    type Model = SurrogateModel<u32, &'static str, &'static str>;

    fn surrogate(tie_break: TieBreak, seed: u64) -> Model {
        let params = SurrogateParams {
            enabled: true,
            tie_break,
        };
        SurrogateModel::new(StateModel::new(0, Box::new(ExactMatch)), &params, seed)
    }

    fn traces(items: &[&str]) -> TraceSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_then_predict() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        let s = sm.reset(0);
        let t = sm.get_state(1);
        sm.update(s, t, "tap", "ok", traces(&["a"]), BTreeSet::new());

        sm.reset(0);
        assert_eq!(sm.predict_action(&"tap"), Some("ok"));
        assert_eq!(sm.current_state(), t);
        assert_eq!(sm.predicted_traces(), &[traces(&["a"])]);
        assert!(sm.has_predicted_every_action());
    }

    #[test]
    fn test_prediction_carries_observed_goals() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        let s = sm.reset(0);
        let t = sm.get_state(1);
        sm.update(s, t, "tap", "ok", traces(&["a"]), [1, 2].into());
        sm.update(s, t, "tap", "ok", traces(&["a"]), [3].into());
        assert_eq!(sm.candidates(s, &"tap")[0].goals(), &BTreeSet::from([1, 2, 3]));

        sm.reset(0);
        sm.predict_action(&"tap");
        assert_eq!(sm.predicted_goals(), &[BTreeSet::from([1, 2, 3])]);

        // A miss drops what was predicted along with the traces.
        assert_eq!(sm.predict_action(&"swipe"), None);
        assert!(sm.predicted_goals().is_empty());
    }

    #[test]
    fn test_repeated_update_bumps_frequency_without_duplicates() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        let s = sm.reset(0);
        let t = sm.get_state(1);
        sm.update(s, t, "tap", "ok", traces(&["a"]), BTreeSet::new());
        sm.update(s, t, "tap", "ok", traces(&["a"]), BTreeSet::new());
        sm.update(s, t, "tap", "ok", traces(&["a"]), BTreeSet::new());

        let candidates = sm.candidates(s, &"tap");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].frequency(), 3);
        assert_eq!(sm.state_model().num_transitions(), 1);

        // Different traces make a distinct surrogate transition, same FSM edge.
        sm.update(s, t, "tap", "ok", traces(&["b"]), BTreeSet::new());
        assert_eq!(sm.candidates(s, &"tap").len(), 2);
        assert_eq!(sm.state_model().num_transitions(), 1);
    }

    #[test]
    fn test_miss_reverts_to_ground_truth() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        let s = sm.reset(0);
        let t = sm.get_state(1);
        sm.update(s, t, "tap", "ok", traces(&["a"]), BTreeSet::new());

        sm.reset(0);
        assert_eq!(sm.predict_action(&"tap"), Some("ok"));
        assert_eq!(sm.predict_action(&"swipe"), None);
        assert_eq!(sm.mode(), Mode::GroundTruth);
        assert!(sm.predicted_traces().is_empty());
        assert_eq!(sm.current_state(), s, "cursor rolls back to the checkpoint");
        assert_eq!(sm.take_replay(), vec!["tap"]);
        assert!(!sm.has_predicted_every_action());

        // Even a known action is not predicted for the rest of the test case.
        assert_eq!(sm.predict_action(&"tap"), None);
        assert_eq!(sm.stats().misses, 1);
    }

    #[test]
    fn test_highest_frequency_wins() {
        let mut sm = surrogate(TieBreak::UniformRandom, 7);
        let s = sm.reset(0);
        let rare = sm.get_state(1);
        let common = sm.get_state(2);
        sm.update(s, rare, "tap", "rare", TraceSet::new(), BTreeSet::new());
        for _ in 0..3 {
            sm.update(s, common, "tap", "common", TraceSet::new(), BTreeSet::new());
        }
        for _ in 0..20 {
            sm.reset(0);
            assert_eq!(sm.predict_action(&"tap"), Some("common"));
        }
    }

    #[test]
    fn test_uniform_tie_break_only_picks_tied() {
        let mut sm = surrogate(TieBreak::UniformRandom, 11);
        let s = sm.reset(0);
        let a = sm.get_state(1);
        let b = sm.get_state(2);
        let c = sm.get_state(3);
        sm.update(s, a, "tap", "a", TraceSet::new(), BTreeSet::new());
        sm.update(s, a, "tap", "a", TraceSet::new(), BTreeSet::new());
        sm.update(s, b, "tap", "b", TraceSet::new(), BTreeSet::new());
        sm.update(s, b, "tap", "b", TraceSet::new(), BTreeSet::new());
        sm.update(s, c, "tap", "c", TraceSet::new(), BTreeSet::new());

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..64 {
            sm.reset(0);
            seen.insert(sm.predict_action(&"tap").unwrap());
        }
        assert!(!seen.contains("c"));
        assert_eq!(seen.len(), 2, "both tied transitions should be chosen eventually");
    }

    #[test]
    fn test_most_recent_tie_break() {
        let mut sm = surrogate(TieBreak::MostRecent, 3);
        let s = sm.reset(0);
        let a = sm.get_state(1);
        let b = sm.get_state(2);
        sm.update(s, a, "tap", "a", TraceSet::new(), BTreeSet::new());
        sm.update(s, b, "tap", "b", TraceSet::new(), BTreeSet::new());
        sm.reset(0);
        assert_eq!(sm.predict_action(&"tap"), Some("b"));

        sm.go_to_state(s).unwrap();
        sm.update(s, a, "tap", "a", TraceSet::new(), BTreeSet::new());
        sm.update(s, b, "tap", "b", TraceSet::new(), BTreeSet::new());
        sm.go_to_state(s).unwrap();
        sm.update(s, a, "tap", "a", TraceSet::new(), BTreeSet::new());
        sm.reset(0);
        assert_eq!(sm.predict_action(&"tap"), Some("a"));
    }

    #[test]
    fn test_reset_accumulates_lifetime_stats() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        let s = sm.reset(0);
        let t = sm.get_state(1);
        sm.update(s, t, "tap", "ok", TraceSet::new(), BTreeSet::new());

        sm.reset(0);
        sm.predict_action(&"tap");
        sm.reset(0);
        sm.predict_action(&"back");
        sm.reset(0);

        let stats = sm.stats();
        assert_eq!(stats.test_cases, 2);
        assert_eq!(stats.fully_predicted, 1);
        assert_eq!(stats.predictions, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reset_to_state_and_resync() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        let root = sm.reset(0);
        let t = sm.get_state(1);
        sm.update(root, t, "tap", "ok", TraceSet::new(), BTreeSet::new());

        sm.reset_to_state(root).unwrap();
        assert_eq!(sm.predict_action(&"tap"), Some("ok"));
        assert_eq!(sm.predict_action(&"back"), None);

        // A real restart mid test case keeps ground-truth mode.
        assert_eq!(sm.resync(0), root);
        assert_eq!(sm.mode(), Mode::GroundTruth);
        assert_eq!(sm.checkpoint(), root);

        let unregistered = sm.get_state(9);
        assert!(sm.reset_to_state(unregistered).is_err());
        assert_eq!(sm.mode(), Mode::GroundTruth, "failed reset leaves the test case untouched");
    }

    #[test]
    fn test_no_prediction_is_not_full_prediction() {
        let mut sm = surrogate(TieBreak::UniformRandom, 1);
        sm.reset(0);
        assert!(!sm.has_predicted_every_action());
    }
}
