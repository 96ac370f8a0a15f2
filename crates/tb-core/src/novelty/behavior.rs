//! Behavioral opinion models: trace -> per-transition opinions.

use crate::fsm::Transition;
use crate::surrogate::SurrogateModel;
use std::collections::HashMap;
use std::hash::Hash;
use tb_common::StateId;
use tb_math::BinomialOpinion;

/// Maps a trace to one opinion per transition on "this transition is typical".
pub trait BehaviorModel<A> {
    fn coarsen(&self, trace: &[Transition<A>]) -> Vec<BinomialOpinion>;
}

impl<A, F> BehaviorModel<A> for F
where
    F: Fn(&[Transition<A>]) -> Vec<BinomialOpinion>,
{
    fn coarsen(&self, trace: &[Transition<A>]) -> Vec<BinomialOpinion> {
        self(trace)
    }
}

/// Opinions derived from how often each transition was really observed.
///
/// For `s --a--> t`, positive evidence is the count of that exact outcome
/// and negative evidence the count of every other outcome of `(s, a)`. A
/// transition never observed gets the vacuous opinion.
#[derive(Debug, Clone)]
pub struct TransitionEvidenceModel<A> {
    counts: HashMap<(StateId, A), HashMap<StateId, u64>>,
    apriori: f64,
}

impl<A: Clone + Eq + Hash> TransitionEvidenceModel<A> {
    pub const DEFAULT_APRIORI: f64 = 0.5;

    pub fn new(apriori: f64) -> Self {
        Self {
            counts: HashMap::new(),
            apriori: apriori.clamp(0.0, 1.0),
        }
    }

    pub fn observe(&mut self, transition: &Transition<A>, times: u64) {
        *self
            .counts
            .entry((transition.source, transition.action.clone()))
            .or_default()
            .entry(transition.target)
            .or_default() += times;
    }

    /// Snapshot the frequency counters of a surrogate.
    pub fn from_surrogate<O, R>(surrogate: &SurrogateModel<O, A, R>) -> Self
    where
        A: std::fmt::Debug,
        R: Clone,
    {
        let mut model = Self::new(Self::DEFAULT_APRIORI);
        for entry in surrogate.surrogate_transitions() {
            model.observe(entry.transition(), u64::from(entry.frequency()));
        }
        model
    }

    fn opinion(&self, transition: &Transition<A>) -> BinomialOpinion {
        let Some(outcomes) = self
            .counts
            .get(&(transition.source, transition.action.clone()))
        else {
            return BinomialOpinion::vacuous(self.apriori);
        };
        let total: u64 = outcomes.values().sum();
        let positive = outcomes.get(&transition.target).copied().unwrap_or(0);
        BinomialOpinion::from_evidence(positive as f64, (total - positive) as f64, self.apriori)
            .unwrap_or_else(|_| BinomialOpinion::vacuous(self.apriori))
    }
}

impl<A: Clone + Eq + Hash> BehaviorModel<A> for TransitionEvidenceModel<A> {
    fn coarsen(&self, trace: &[Transition<A>]) -> Vec<BinomialOpinion> {
        trace.iter().map(|t| self.opinion(t)).collect()
    }
}
