//! Bounded per-objective archive (MIO/MOSA style).
//!
//! Keeps the single best individual seen so far for every objective,
//! preferring shorter ones among equally fit.

use super::chromosome::{ChromosomeArena, Phenotype};
use super::comparator::fitness_then_length;
use std::cmp::Ordering;
use tb_common::ChromosomeId;

#[derive(Debug, Clone)]
pub struct Archive {
    best: Vec<Option<ChromosomeId>>,
}

impl Archive {
    pub fn new(objectives: usize) -> Self {
        Self {
            best: vec![None; objectives],
        }
    }

    /// Offer an evaluated individual. Returns true if it replaced an entry.
    pub fn offer<T: Phenotype>(&mut self, arena: &ChromosomeArena<T>, id: ChromosomeId) -> bool {
        if !arena.is_evaluated(id) {
            return false;
        }
        let mut improved = false;
        for (objective, slot) in self.best.iter_mut().enumerate() {
            let better = match *slot {
                None => true,
                Some(current) => {
                    fitness_then_length(arena.get(id), arena.get(current), objective)
                        == Ordering::Greater
                }
            };
            if better {
                *slot = Some(id);
                improved = true;
            }
        }
        improved
    }

    pub fn best(&self, objective: usize) -> Option<ChromosomeId> {
        self.best.get(objective).copied().flatten()
    }

    /// Distinct archived individuals, in objective order.
    pub fn solutions(&self) -> Vec<ChromosomeId> {
        let mut out: Vec<ChromosomeId> = Vec::new();
        for id in self.best.iter().flatten() {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.solutions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.iter().all(Option::is_none)
    }
}
