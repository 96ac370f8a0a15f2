//! Finite-state abstraction of the application under test.

pub mod equivalence;
pub mod model;

pub use equivalence::{policy_from_params, CosineSimilarity, ExactMatch, FeatureVector, StateEquivalence};
pub use model::{FsmError, State, StateModel, Transition};
