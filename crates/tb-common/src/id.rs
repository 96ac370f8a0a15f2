//! Handle types for model and search entities.
//!
//! Both handles are plain indices assigned monotonically by their owner
//! (the state model for states, the chromosome arena for chromosomes).
//! They are never reused within one owner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an abstract state in the state model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl From<usize> for StateId {
    fn from(id: usize) -> Self {
        StateId(id)
    }
}

/// Stable index of a chromosome inside a chromosome arena.
///
/// Two chromosomes with equal phenotypes have distinct ids, so fitness
/// caches keyed by this handle behave like identity-keyed caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChromosomeId(pub usize);

impl ChromosomeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChromosomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
