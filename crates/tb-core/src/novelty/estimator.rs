//! Novelty estimators over per-transition opinions.
//!
//! Each opinion expresses how typical one transition of a trace is. An
//! estimator collapses the sequence into a single score where higher means
//! more novel. The score of one opinion is `alpha * disbelief + uncertainty`:
//! disbelief rewards behavior known to be atypical, uncertainty rewards
//! behavior never sampled.

use tb_config::{NoveltyEstimatorKind, NoveltyParams};
use tb_math::{averaged_opinion, weighted_fusion, BinomialOpinion};

/// Collapses a trace of opinions into a novelty score.
pub trait NoveltyEstimator {
    /// Score an opinion sequence. Empty input scores 0.0.
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64;

    fn name(&self) -> &'static str;
}

impl NoveltyEstimator for Box<dyn NoveltyEstimator> {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        (**self).estimate(opinions)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Novelty of a single opinion.
pub fn opinion_score(opinion: &BinomialOpinion, alpha: f64) -> f64 {
    alpha * opinion.disbelief() + opinion.uncertainty()
}

fn product(opinions: &[BinomialOpinion]) -> BinomialOpinion {
    opinions
        .iter()
        .fold(BinomialOpinion::certain_true(), |acc, o| acc.multiply(o))
}

/// Component-wise mean of the whole trace.
#[derive(Debug, Clone, Copy)]
pub struct Average {
    pub alpha: f64,
}

impl NoveltyEstimator for Average {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        averaged_opinion(opinions)
            .map(|o| opinion_score(&o, self.alpha))
            .unwrap_or(0.0)
    }

    fn name(&self) -> &'static str {
        "average"
    }
}

/// Conjunction: every transition must be typical for the trace to be typical.
#[derive(Debug, Clone, Copy)]
pub struct Multiplicative {
    pub alpha: f64,
}

impl NoveltyEstimator for Multiplicative {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        if opinions.is_empty() {
            return 0.0;
        }
        opinion_score(&product(opinions), self.alpha)
    }

    fn name(&self) -> &'static str {
        "multiplicative"
    }
}

/// Consensus of the transitions as independent sources.
#[derive(Debug, Clone, Copy)]
pub struct Fusion {
    pub alpha: f64,
}

impl NoveltyEstimator for Fusion {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        weighted_fusion(opinions)
            .map(|o| opinion_score(&o, self.alpha))
            .unwrap_or(0.0)
    }

    fn name(&self) -> &'static str {
        "fusion"
    }
}

/// Best multiplicative score over all prefixes of at least `min_length`.
///
/// Traces shorter than the minimum are scored as a whole.
#[derive(Debug, Clone, Copy)]
pub struct MaxNovelPrefix {
    pub alpha: f64,
    pub min_length: usize,
}

impl NoveltyEstimator for MaxNovelPrefix {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        if opinions.is_empty() {
            return 0.0;
        }
        if opinions.len() < self.min_length {
            return opinion_score(&product(opinions), self.alpha);
        }

        let mut acc = BinomialOpinion::certain_true();
        let mut best = f64::NEG_INFINITY;
        for (i, opinion) in opinions.iter().enumerate() {
            acc = acc.multiply(opinion);
            if i + 1 >= self.min_length {
                best = best.max(opinion_score(&acc, self.alpha));
            }
        }
        best
    }

    fn name(&self) -> &'static str {
        "max_novel_prefix"
    }
}

/// Best multiplicative score over all contiguous windows.
///
/// The minimum window is `max(min_length, ceil(min_fraction * n))`. Traces
/// shorter than that are scored as a whole. Quadratic in trace length.
#[derive(Debug, Clone, Copy)]
pub struct MaxNovelSubsequence {
    pub alpha: f64,
    pub min_length: usize,
    pub min_fraction: f64,
}

impl MaxNovelSubsequence {
    pub fn window(&self, trace_len: usize) -> usize {
        let scaled = (self.min_fraction * trace_len as f64).ceil() as usize;
        self.min_length.max(scaled).max(1)
    }
}

impl NoveltyEstimator for MaxNovelSubsequence {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        let n = opinions.len();
        if n == 0 {
            return 0.0;
        }
        let window = self.window(n);
        if n < window {
            return opinion_score(&product(opinions), self.alpha);
        }

        let mut best = f64::NEG_INFINITY;
        for start in 0..=n - window {
            let mut acc = BinomialOpinion::certain_true();
            for (offset, opinion) in opinions[start..].iter().enumerate() {
                acc = acc.multiply(opinion);
                if offset + 1 >= window {
                    best = best.max(opinion_score(&acc, self.alpha));
                }
            }
        }
        best
    }

    fn name(&self) -> &'static str {
        "max_novel_subsequence"
    }
}

/// Divides the wrapped estimator's score by trace length.
#[derive(Debug, Clone, Copy)]
pub struct DiscountedSum<E> {
    pub inner: E,
}

impl<E: NoveltyEstimator> NoveltyEstimator for DiscountedSum<E> {
    fn estimate(&self, opinions: &[BinomialOpinion]) -> f64 {
        if opinions.is_empty() {
            return 0.0;
        }
        self.inner.estimate(opinions) / opinions.len() as f64
    }

    fn name(&self) -> &'static str {
        "discounted_sum"
    }
}

/// Build the configured estimator.
pub fn estimator_from_params(params: &NoveltyParams) -> Box<dyn NoveltyEstimator> {
    let alpha = params.alpha;
    let base: Box<dyn NoveltyEstimator> = match params.estimator {
        NoveltyEstimatorKind::Average => Box::new(Average { alpha }),
        NoveltyEstimatorKind::Multiplicative => Box::new(Multiplicative { alpha }),
        NoveltyEstimatorKind::Fusion => Box::new(Fusion { alpha }),
        NoveltyEstimatorKind::MaxNovelPrefix => Box::new(MaxNovelPrefix {
            alpha,
            min_length: params.min_prefix_length,
        }),
        NoveltyEstimatorKind::MaxNovelSubsequence => Box::new(MaxNovelSubsequence {
            alpha,
            min_length: params.min_subsequence_length,
            min_fraction: params.min_subsequence_fraction,
        }),
    };
    if params.discounted {
        Box::new(DiscountedSum { inner: base })
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(b: f64, d: f64, u: f64) -> BinomialOpinion {
        BinomialOpinion::new(b, d, u, 0.5).unwrap()
    }

    fn typical() -> BinomialOpinion {
        op(0.9, 0.0, 0.1)
    }

    fn atypical() -> BinomialOpinion {
        op(0.0, 1.0, 0.0)
    }

    fn all_estimators(alpha: f64) -> Vec<Box<dyn NoveltyEstimator>> {
        vec![
            Box::new(Average { alpha }),
            Box::new(Multiplicative { alpha }),
            Box::new(Fusion { alpha }),
            Box::new(MaxNovelPrefix {
                alpha,
                min_length: 5,
            }),
            Box::new(MaxNovelSubsequence {
                alpha,
                min_length: 3,
                min_fraction: 0.2,
            }),
            Box::new(DiscountedSum {
                inner: Multiplicative { alpha },
            }),
        ]
    }

    #[test]
    fn test_empty_trace_is_neutral() {
        for estimator in all_estimators(1.0) {
            assert_eq!(estimator.estimate(&[]), 0.0, "{}", estimator.name());
        }
    }

    #[test]
    fn test_fully_atypical_trace_scores_alpha() {
        let trace = vec![atypical(); 5];
        let alpha = 2.5;
        let scores = [
            Average { alpha }.estimate(&trace),
            Multiplicative { alpha }.estimate(&trace),
            Fusion { alpha }.estimate(&trace),
        ];
        for score in scores {
            assert!((score - alpha).abs() < 1e-9, "got {score}");
        }
    }

    #[test]
    fn test_single_opinion_score() {
        let o = op(0.2, 0.3, 0.5);
        assert!((opinion_score(&o, 2.0) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_multiplication_accumulates_atypicality() {
        let one = Multiplicative { alpha: 1.0 }.estimate(&[op(0.5, 0.5, 0.0)]);
        let two = Multiplicative { alpha: 1.0 }.estimate(&[op(0.5, 0.5, 0.0), op(0.5, 0.5, 0.0)]);
        assert!(two > one);
    }

    #[test]
    fn test_prefix_shorter_than_minimum_scores_whole_trace() {
        let trace = vec![typical(), atypical()];
        let prefix = MaxNovelPrefix {
            alpha: 1.0,
            min_length: 5,
        };
        let whole = Multiplicative { alpha: 1.0 }.estimate(&trace);
        assert!((prefix.estimate(&trace) - whole).abs() < 1e-12);
    }

    #[test]
    fn test_prefix_ignores_short_prefixes() {
        // The first prefix alone would be maximally novel but is below the minimum.
        let mut trace = vec![atypical()];
        trace.extend(std::iter::repeat(typical()).take(5));
        let with_min = MaxNovelPrefix {
            alpha: 1.0,
            min_length: 3,
        };
        let score = with_min.estimate(&trace);
        // Any prefix containing the atypical opinion keeps disbelief 1.
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_subsequence_finds_novel_window() {
        let mut trace = vec![typical(); 10];
        trace[6] = atypical();
        let sub = MaxNovelSubsequence {
            alpha: 1.0,
            min_length: 3,
            min_fraction: 0.2,
        };
        assert!((sub.estimate(&trace) - 1.0).abs() < 1e-9);

        let baseline = MaxNovelSubsequence {
            alpha: 1.0,
            min_length: 3,
            min_fraction: 0.2,
        }
        .estimate(&vec![typical(); 10]);
        assert!(baseline < 1.0);
    }

    #[test]
    fn test_subsequence_window_scales_with_length() {
        let sub = MaxNovelSubsequence {
            alpha: 1.0,
            min_length: 3,
            min_fraction: 0.2,
        };
        assert_eq!(sub.window(5), 3);
        assert_eq!(sub.window(15), 3);
        assert_eq!(sub.window(16), 4);
        assert_eq!(sub.window(50), 10);
    }

    #[test]
    fn test_discounted_divides_by_length() {
        let trace = vec![atypical(); 4];
        let inner = Multiplicative { alpha: 1.0 };
        let discounted = DiscountedSum { inner };
        assert!((discounted.estimate(&trace) - inner.estimate(&trace) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimator_from_params() {
        let mut params = NoveltyParams::default();
        assert_eq!(estimator_from_params(&params).name(), "multiplicative");
        params.estimator = NoveltyEstimatorKind::MaxNovelSubsequence;
        assert_eq!(estimator_from_params(&params).name(), "max_novel_subsequence");
        params.discounted = true;
        assert_eq!(estimator_from_params(&params).name(), "discounted_sum");
    }
}
