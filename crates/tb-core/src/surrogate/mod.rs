//! Surrogate model: in-memory replay of previously observed behavior.

mod model;

pub use model::{Mode, SurrogateModel, SurrogateStats, SurrogateTransition};
