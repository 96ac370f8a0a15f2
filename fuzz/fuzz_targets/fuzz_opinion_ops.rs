//! Fuzz target for binomial opinion construction and multiplication.
//!
//! Every opinion built from evidence must stay a valid opinion after
//! multiplication, whatever the evidence.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tb_math::{weighted_fusion, BinomialOpinion, OPINION_TOLERANCE};

#[derive(Debug, Arbitrary)]
struct Evidence {
    positive: f64,
    negative: f64,
    apriori: f64,
}

fuzz_target!(|input: Vec<Evidence>| {
    let opinions: Vec<BinomialOpinion> = input
        .iter()
        .filter_map(|e| BinomialOpinion::from_evidence(e.positive, e.negative, e.apriori).ok())
        .collect();

    let product = opinions
        .iter()
        .fold(BinomialOpinion::certain_true(), |acc, o| acc.multiply(o));
    let mass = product.belief() + product.disbelief() + product.uncertainty();
    assert!((mass - 1.0).abs() <= OPINION_TOLERANCE * 10.0, "mass {mass}");

    if let Some(fused) = weighted_fusion(&opinions) {
        assert!(fused.projected_probability().is_finite());
    }
});
