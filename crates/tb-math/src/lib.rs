//! Trailblaze math utilities.

pub mod math;

pub use math::fusion::{averaged_opinion, weighted_fusion};
pub use math::opinion::{BinomialOpinion, OpinionError, OPINION_TOLERANCE};
pub use math::similarity::cosine_similarity;
