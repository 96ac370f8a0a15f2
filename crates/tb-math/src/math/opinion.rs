//! Binomial opinions from subjective logic.
//!
//! An opinion `ω = (b, d, u, a)` expresses belief, disbelief and uncertainty
//! about a binary proposition together with the base rate `a` that applies
//! when no evidence is available. The components satisfy `b + d + u = 1`.
//!
//! Multiplication follows Jøsang's binomial multiplication (logical AND of
//! two propositions). Fusion of several sources lives in [`super::fusion`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tolerance for the `b + d + u = 1` invariant.
pub const OPINION_TOLERANCE: f64 = 1e-6;

/// Non-informative prior weight used by the evidence mapping.
pub const NON_INFORMATIVE_WEIGHT: f64 = 2.0;

/// Threshold below which `1 - a1·a2` is treated as zero.
const BASE_RATE_EPS: f64 = 1e-12;

/// Error types for opinion construction.
#[derive(Debug, Error, PartialEq)]
pub enum OpinionError {
    #[error("opinion component {name} out of range [0, 1]: {value}")]
    ComponentOutOfRange { name: &'static str, value: f64 },

    #[error("opinion components must sum to 1.0 (sum={0})")]
    InvalidMass(f64),

    #[error("evidence counts must be finite and non-negative (positive={positive}, negative={negative})")]
    InvalidEvidence { positive: f64, negative: f64 },
}

impl From<OpinionError> for tb_common::Error {
    fn from(err: OpinionError) -> Self {
        tb_common::Error::InvalidOpinion(err.to_string())
    }
}

/// A subjective-logic binomial opinion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OpinionParts", into = "OpinionParts")]
pub struct BinomialOpinion {
    belief: f64,
    disbelief: f64,
    uncertainty: f64,
    apriori: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct OpinionParts {
    belief: f64,
    disbelief: f64,
    uncertainty: f64,
    apriori: f64,
}

impl TryFrom<OpinionParts> for BinomialOpinion {
    type Error = OpinionError;

    fn try_from(parts: OpinionParts) -> Result<Self, Self::Error> {
        BinomialOpinion::new(parts.belief, parts.disbelief, parts.uncertainty, parts.apriori)
    }
}

impl From<BinomialOpinion> for OpinionParts {
    fn from(o: BinomialOpinion) -> Self {
        OpinionParts {
            belief: o.belief,
            disbelief: o.disbelief,
            uncertainty: o.uncertainty,
            apriori: o.apriori,
        }
    }
}

impl BinomialOpinion {
    /// Create an opinion, validating ranges and the mass invariant.
    pub fn new(
        belief: f64,
        disbelief: f64,
        uncertainty: f64,
        apriori: f64,
    ) -> Result<Self, OpinionError> {
        for (name, value) in [
            ("belief", belief),
            ("disbelief", disbelief),
            ("uncertainty", uncertainty),
            ("apriori", apriori),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OpinionError::ComponentOutOfRange { name, value });
            }
        }

        let mass = belief + disbelief + uncertainty;
        if (mass - 1.0).abs() > OPINION_TOLERANCE {
            return Err(OpinionError::InvalidMass(mass));
        }

        Ok(Self {
            belief,
            disbelief,
            uncertainty,
            apriori,
        })
    }

    /// Absolute belief in the proposition.
    ///
    /// The base rate is 1 so that this opinion is the neutral element of
    /// [`BinomialOpinion::multiply`].
    pub fn certain_true() -> Self {
        Self {
            belief: 1.0,
            disbelief: 0.0,
            uncertainty: 0.0,
            apriori: 1.0,
        }
    }

    /// Absolute disbelief in the proposition.
    pub fn certain_false() -> Self {
        Self {
            belief: 0.0,
            disbelief: 1.0,
            uncertainty: 0.0,
            apriori: 0.0,
        }
    }

    /// Total ignorance with the given base rate.
    pub fn vacuous(apriori: f64) -> Self {
        Self {
            belief: 0.0,
            disbelief: 0.0,
            uncertainty: 1.0,
            apriori: apriori.clamp(0.0, 1.0),
        }
    }

    /// Map positive/negative evidence counts to an opinion.
    ///
    /// Uses the Beta mapping `b = r/(r+s+W)`, `d = s/(r+s+W)`, `u = W/(r+s+W)`
    /// with `W = 2`.
    pub fn from_evidence(positive: f64, negative: f64, apriori: f64) -> Result<Self, OpinionError> {
        if !positive.is_finite() || !negative.is_finite() || positive < 0.0 || negative < 0.0 {
            return Err(OpinionError::InvalidEvidence { positive, negative });
        }
        let total = positive + negative + NON_INFORMATIVE_WEIGHT;
        Self::new(
            positive / total,
            negative / total,
            NON_INFORMATIVE_WEIGHT / total,
            apriori,
        )
    }

    pub fn belief(&self) -> f64 {
        self.belief
    }

    pub fn disbelief(&self) -> f64 {
        self.disbelief
    }

    pub fn uncertainty(&self) -> f64 {
        self.uncertainty
    }

    pub fn apriori(&self) -> f64 {
        self.apriori
    }

    /// Projected probability `P = b + a·u`.
    pub fn projected_probability(&self) -> f64 {
        self.belief + self.apriori * self.uncertainty
    }

    /// Whether the opinion carries no uncertainty.
    pub fn is_dogmatic(&self) -> bool {
        self.uncertainty <= OPINION_TOLERANCE
    }

    /// Binomial multiplication (AND of two propositions).
    ///
    /// When both base rates are 1 the general formula degenerates to `0/0`;
    /// the left operand's base rate is then taken as exact, which keeps
    /// [`BinomialOpinion::certain_true`] a two-sided identity.
    pub fn multiply(&self, other: &Self) -> Self {
        let (b1, d1, u1, a1) = self.parts();
        let (b2, d2, u2, a2) = other.parts();

        let disbelief = d1 + d2 - d1 * d2;
        let divisor = 1.0 - a1 * a2;

        let (belief, uncertainty) = if divisor > BASE_RATE_EPS {
            (
                b1 * b2 + ((1.0 - a1) * a2 * b1 * u2 + a1 * (1.0 - a2) * u1 * b2) / divisor,
                u1 * u2 + ((1.0 - a2) * b1 * u2 + (1.0 - a1) * u1 * b2) / divisor,
            )
        } else {
            (b2 * (b1 + u1), u2 * (b1 + u1))
        };

        Self::renormalized(belief, disbelief, uncertainty, a1 * a2)
    }

    fn parts(&self) -> (f64, f64, f64, f64) {
        (self.belief, self.disbelief, self.uncertainty, self.apriori)
    }

    /// Build an opinion from possibly slightly-off components produced by
    /// floating point arithmetic.
    pub(crate) fn renormalized(belief: f64, disbelief: f64, uncertainty: f64, apriori: f64) -> Self {
        let belief = belief.max(0.0);
        let disbelief = disbelief.max(0.0);
        let uncertainty = uncertainty.max(0.0);
        let mass = belief + disbelief + uncertainty;
        if mass <= 0.0 || !mass.is_finite() {
            return Self::vacuous(apriori);
        }
        Self {
            belief: belief / mass,
            disbelief: disbelief / mass,
            uncertainty: uncertainty / mass,
            apriori: apriori.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for BinomialOpinion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(b={:.4}, d={:.4}, u={:.4}, a={:.4})",
            self.belief, self.disbelief, self.uncertainty, self.apriori
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_opinion_error_maps_to_model_category() {
        let err: tb_common::Error = BinomialOpinion::from_evidence(-1.0, 0.0, 0.5)
            .unwrap_err()
            .into();
        assert_eq!(err.code(), 21);
        assert_eq!(err.category(), tb_common::ErrorCategory::Model);
    }

    #[test]
    fn test_new_rejects_bad_mass() {
        assert_eq!(
            BinomialOpinion::new(0.5, 0.5, 0.5, 0.5),
            Err(OpinionError::InvalidMass(1.5))
        );
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            BinomialOpinion::new(1.2, -0.2, 0.0, 0.5),
            Err(OpinionError::ComponentOutOfRange { name: "belief", .. })
        ));
        assert!(matches!(
            BinomialOpinion::new(0.2, 0.2, 0.6, 1.5),
            Err(OpinionError::ComponentOutOfRange { name: "apriori", .. })
        ));
    }

    #[test]
    fn test_from_evidence() {
        let o = BinomialOpinion::from_evidence(8.0, 0.0, 0.5).unwrap();
        assert!(approx(o.belief(), 0.8));
        assert!(approx(o.uncertainty(), 0.2));
        assert!(approx(o.disbelief(), 0.0));

        let none = BinomialOpinion::from_evidence(0.0, 0.0, 0.3).unwrap();
        assert_eq!(none, BinomialOpinion::vacuous(0.3));

        assert!(BinomialOpinion::from_evidence(-1.0, 0.0, 0.5).is_err());
        assert!(BinomialOpinion::from_evidence(f64::NAN, 0.0, 0.5).is_err());
    }

    #[test]
    fn test_projected_probability() {
        let o = BinomialOpinion::new(0.2, 0.3, 0.5, 0.4).unwrap();
        assert!(approx(o.projected_probability(), 0.4));
    }

    #[test]
    fn test_certain_true_is_identity() {
        let x = BinomialOpinion::new(0.3, 0.2, 0.5, 0.6).unwrap();
        let t = BinomialOpinion::certain_true();
        for product in [t.multiply(&x), x.multiply(&t)] {
            assert!(approx(product.belief(), x.belief()));
            assert!(approx(product.disbelief(), x.disbelief()));
            assert!(approx(product.uncertainty(), x.uncertainty()));
            assert!(approx(product.apriori(), x.apriori()));
        }
    }

    #[test]
    fn test_certain_false_absorbs() {
        let x = BinomialOpinion::new(0.6, 0.1, 0.3, 0.5).unwrap();
        let product = x.multiply(&BinomialOpinion::certain_false());
        assert!(approx(product.disbelief(), 1.0));
        assert!(approx(product.belief(), 0.0));
        assert!(approx(product.uncertainty(), 0.0));
    }

    #[test]
    fn test_multiply_preserves_mass_with_unit_base_rates() {
        let x = BinomialOpinion::new(0.5, 0.0, 0.5, 1.0).unwrap();
        let y = BinomialOpinion::new(0.25, 0.25, 0.5, 1.0).unwrap();
        let p = x.multiply(&y);
        assert!(approx(p.belief() + p.disbelief() + p.uncertainty(), 1.0));
        assert!(approx(p.disbelief(), 0.25));
    }

    #[test]
    fn test_serde_validates() {
        let ok: BinomialOpinion =
            serde_json::from_str(r#"{"belief":0.5,"disbelief":0.5,"uncertainty":0.0,"apriori":0.5}"#)
                .unwrap();
        assert!(approx(ok.belief(), 0.5));
        let bad = serde_json::from_str::<BinomialOpinion>(
            r#"{"belief":0.9,"disbelief":0.9,"uncertainty":0.0,"apriori":0.5}"#,
        );
        assert!(bad.is_err());
    }
}
