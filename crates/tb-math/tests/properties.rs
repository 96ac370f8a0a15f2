//! Property-based tests for the opinion algebra.
//!
//! Uses proptest to verify subjective-logic invariants across random opinions.

use proptest::prelude::*;
use tb_math::{averaged_opinion, weighted_fusion, BinomialOpinion};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn opinion_strategy() -> impl Strategy<Value = BinomialOpinion> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(|(x, y, apriori)| {
        // Split the unit interval at two points to get a valid (b, d, u) triple.
        let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
        BinomialOpinion::new(lo, hi - lo, 1.0 - hi, apriori).expect("valid split")
    })
}

fn mass(o: &BinomialOpinion) -> f64 {
    o.belief() + o.disbelief() + o.uncertainty()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Multiplying by certain-true leaves the opinion unchanged.
    #[test]
    fn certain_true_is_multiplicative_identity(x in opinion_strategy()) {
        let t = BinomialOpinion::certain_true();
        let p = t.multiply(&x);
        prop_assert!((p.belief() - x.belief()).abs() < TOL, "{} * {} = {}", t, x, p);
        prop_assert!((p.disbelief() - x.disbelief()).abs() < TOL, "{} * {} = {}", t, x, p);
        prop_assert!((p.uncertainty() - x.uncertainty()).abs() < TOL, "{} * {} = {}", t, x, p);
        prop_assert!((p.apriori() - x.apriori()).abs() < TOL, "{} * {} = {}", t, x, p);
    }

    /// Products stay valid opinions.
    #[test]
    fn multiply_preserves_mass(x in opinion_strategy(), y in opinion_strategy()) {
        let p = x.multiply(&y);
        prop_assert!((mass(&p) - 1.0).abs() < TOL, "mass of {} is {}", p, mass(&p));
        prop_assert!(p.belief() >= 0.0 && p.disbelief() >= 0.0 && p.uncertainty() >= 0.0);
    }

    /// Disbelief of a conjunction never drops below either operand's disbelief.
    #[test]
    fn multiply_disbelief_is_monotone(x in opinion_strategy(), y in opinion_strategy()) {
        let p = x.multiply(&y);
        prop_assert!(p.disbelief() + TOL >= x.disbelief().max(y.disbelief()));
    }

    /// Averaging and fusion both yield valid opinions.
    #[test]
    fn combinations_preserve_mass(xs in prop::collection::vec(opinion_strategy(), 1..20)) {
        let avg = averaged_opinion(&xs).expect("non-empty");
        prop_assert!((mass(&avg) - 1.0).abs() < TOL);
        let fused = weighted_fusion(&xs).expect("non-empty");
        prop_assert!((mass(&fused) - 1.0).abs() < TOL);
        prop_assert!((0.0..=1.0).contains(&fused.apriori()));
    }

    /// Fusion is insensitive to source order.
    #[test]
    fn fusion_is_order_independent(xs in prop::collection::vec(opinion_strategy(), 1..10)) {
        let forward = weighted_fusion(&xs).expect("non-empty");
        let mut reversed = xs.clone();
        reversed.reverse();
        let backward = weighted_fusion(&reversed).expect("non-empty");
        prop_assert!((forward.belief() - backward.belief()).abs() < 1e-7);
        prop_assert!((forward.uncertainty() - backward.uncertainty()).abs() < 1e-7);
    }
}
