//! Observation equivalence policies.
//!
//! The state model asks a policy whether two observations describe the same
//! abstract state. Exact matching keeps every structural difference; the
//! cosine policy compares coarsened feature vectors and merges observations
//! whose similarity reaches the threshold.

use tb_config::{EquivalencePolicy, StateModelParams};
use tb_math::cosine_similarity;

/// Decides whether two observations belong to the same abstract state.
pub trait StateEquivalence<O> {
    fn equivalent(&self, a: &O, b: &O) -> bool;
}

/// Coarsened numeric view of an observation.
///
/// Properties that should not distinguish states (clock text, scroll
/// offsets, ...) are simply left out of the vector.
pub trait FeatureVector {
    fn features(&self) -> Vec<f64>;
}

/// Structural equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl<O: PartialEq> StateEquivalence<O> for ExactMatch {
    fn equivalent(&self, a: &O, b: &O) -> bool {
        a == b
    }
}

/// Cosine similarity of feature vectors at or above a threshold.
#[derive(Debug, Clone, Copy)]
pub struct CosineSimilarity {
    threshold: f64,
}

impl CosineSimilarity {
    pub const DEFAULT_THRESHOLD: f64 = 0.95;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for CosineSimilarity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl<O: FeatureVector> StateEquivalence<O> for CosineSimilarity {
    fn equivalent(&self, a: &O, b: &O) -> bool {
        cosine_similarity(&a.features(), &b.features()) >= self.threshold
    }
}

/// Build the configured equivalence policy.
pub fn policy_from_params<O>(params: &StateModelParams) -> Box<dyn StateEquivalence<O>>
where
    O: PartialEq + FeatureVector + 'static,
{
    match params.equivalence {
        EquivalencePolicy::Exact => Box::new(ExactMatch),
        EquivalencePolicy::Cosine => Box::new(CosineSimilarity::new(params.similarity_threshold)),
    }
}
