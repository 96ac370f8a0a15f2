//! Subjective-logic novelty scoring of traces.

mod behavior;
mod estimator;

pub use behavior::{BehaviorModel, TransitionEvidenceModel};
pub use estimator::{
    estimator_from_params, opinion_score, Average, DiscountedSum, Fusion, MaxNovelPrefix,
    MaxNovelSubsequence, Multiplicative, NoveltyEstimator,
};

use crate::fsm::Transition;
use tb_config::NoveltyParams;

/// Behavior model and estimator bundled into one trace scorer.
pub struct NoveltyScorer {
    estimator: Box<dyn NoveltyEstimator>,
}

impl NoveltyScorer {
    pub fn new(estimator: Box<dyn NoveltyEstimator>) -> Self {
        Self { estimator }
    }

    pub fn from_params(params: &NoveltyParams) -> Self {
        Self::new(estimator_from_params(params))
    }

    pub fn score<A>(&self, model: &dyn BehaviorModel<A>, trace: &[Transition<A>]) -> f64 {
        let opinions = model.coarsen(trace);
        let score = self.estimator.estimate(&opinions);
        tracing::trace!(
            estimator = self.estimator.name(),
            trace_len = trace.len(),
            score,
            "novelty estimated"
        );
        score
    }

    pub fn estimator(&self) -> &dyn NoveltyEstimator {
        self.estimator.as_ref()
    }
}
