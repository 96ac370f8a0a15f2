//! Fuzz target for the novelty estimators.
//!
//! Tests that every estimator returns a finite score for arbitrary
//! traces of valid opinions.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tb_core::novelty::{
    Average, DiscountedSum, Fusion, MaxNovelPrefix, MaxNovelSubsequence, Multiplicative,
    NoveltyEstimator,
};
use tb_math::BinomialOpinion;

#[derive(Debug, Arbitrary)]
struct Input {
    counts: Vec<(u8, u8)>,
    min_length: u8,
    min_fraction: u8,
}

fuzz_target!(|input: Input| {
    let opinions: Vec<BinomialOpinion> = input
        .counts
        .iter()
        .filter_map(|&(pos, neg)| {
            BinomialOpinion::from_evidence(f64::from(pos), f64::from(neg), 0.5).ok()
        })
        .collect();
    let min_length = usize::from(input.min_length % 16);
    let estimators: Vec<Box<dyn NoveltyEstimator>> = vec![
        Box::new(Average { alpha: 1.0 }),
        Box::new(Multiplicative { alpha: 1.0 }),
        Box::new(Fusion { alpha: 1.0 }),
        Box::new(MaxNovelPrefix {
            alpha: 1.0,
            min_length,
        }),
        Box::new(MaxNovelSubsequence {
            alpha: 1.0,
            min_length,
            min_fraction: f64::from(input.min_fraction) / 255.0,
        }),
        Box::new(DiscountedSum {
            inner: Multiplicative { alpha: 1.0 },
        }),
    ];

    for estimator in &estimators {
        let score = estimator.estimate(&opinions);
        assert!(score.is_finite(), "{} produced {score}", estimator.name());
    }
});
