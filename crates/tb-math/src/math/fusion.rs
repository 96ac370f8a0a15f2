//! Combining opinions from several sources.
//!
//! Two algebras are provided:
//! - [`averaged_opinion`]: plain component-wise mean
//! - [`weighted_fusion`]: Jøsang's weighted belief fusion, where each
//!   source is weighted by its confidence `1 - u`
//!
//! Both return `None` for an empty input so callers can pick their own
//! neutral element.

use super::opinion::{BinomialOpinion, OPINION_TOLERANCE};

/// Component-wise mean of all opinions.
pub fn averaged_opinion(opinions: &[BinomialOpinion]) -> Option<BinomialOpinion> {
    if opinions.is_empty() {
        return None;
    }
    let n = opinions.len() as f64;
    let (mut b, mut d, mut u, mut a) = (0.0, 0.0, 0.0, 0.0);
    for o in opinions {
        b += o.belief();
        d += o.disbelief();
        u += o.uncertainty();
        a += o.apriori();
    }
    Some(BinomialOpinion::renormalized(b / n, d / n, u / n, a / n))
}

/// Weighted belief fusion of independent sources.
///
/// Cases:
/// - dogmatic sources present (`u = 0`): equal-weight mean over those sources
/// - all sources vacuous (`u = 1`): vacuous opinion with the mean base rate
/// - otherwise: `b = Σ b_i·w_i / Σ w_i` with `w_i = (1 - u_i) / u_i`,
///   `u = Σ (1 - u_i) / Σ w_i`, base rate weighted by `1 - u_i`
pub fn weighted_fusion(opinions: &[BinomialOpinion]) -> Option<BinomialOpinion> {
    if opinions.is_empty() {
        return None;
    }

    let dogmatic: Vec<BinomialOpinion> = opinions
        .iter()
        .copied()
        .filter(BinomialOpinion::is_dogmatic)
        .collect();
    if !dogmatic.is_empty() {
        let mean = averaged_opinion(&dogmatic)?;
        return Some(BinomialOpinion::renormalized(
            mean.belief(),
            mean.disbelief(),
            0.0,
            mean.apriori(),
        ));
    }

    if opinions
        .iter()
        .all(|o| o.uncertainty() >= 1.0 - OPINION_TOLERANCE)
    {
        let mean_apriori =
            opinions.iter().map(BinomialOpinion::apriori).sum::<f64>() / opinions.len() as f64;
        return Some(BinomialOpinion::vacuous(mean_apriori));
    }

    let mut weight_sum = 0.0;
    let mut belief = 0.0;
    let mut disbelief = 0.0;
    let mut confidence_sum = 0.0;
    let mut apriori = 0.0;
    for o in opinions {
        let confidence = 1.0 - o.uncertainty();
        let weight = confidence / o.uncertainty();
        weight_sum += weight;
        belief += o.belief() * weight;
        disbelief += o.disbelief() * weight;
        confidence_sum += confidence;
        apriori += o.apriori() * confidence;
    }

    Some(BinomialOpinion::renormalized(
        belief / weight_sum,
        disbelief / weight_sum,
        confidence_sum / weight_sum,
        apriori / confidence_sum,
    ))
}
