//! Chromosome arena.
//!
//! Chromosomes are identity-keyed: two individuals with equal phenotypes are
//! still distinct and cache their fitness independently. Identity is the
//! arena index ([`ChromosomeId`]); slots are never reused within a search.

use super::fitness::{orient, FitnessFunction};
use serde::Serialize;
use tb_common::ChromosomeId;

/// Minimal capability a phenotype needs to take part in search.
pub trait Phenotype {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Phenotype for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// How a chromosome came to be.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lineage {
    pub parents: Vec<ChromosomeId>,
    pub crossed: bool,
    pub mutated: bool,
}

impl Lineage {
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn is_initial(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Evaluated objectives of one chromosome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    /// Raw fitness, one per objective.
    pub raw: Vec<f64>,
    /// Normalized fitness with minimizing objectives negated, so larger is always better.
    pub oriented: Vec<f64>,
    pub length: usize,
}

/// A phenotype plus its cached evaluation and multi-objective bookkeeping.
#[derive(Debug, Clone)]
pub struct Chromosome<T> {
    id: ChromosomeId,
    value: T,
    lineage: Lineage,
    score: Option<Score>,
    pub(crate) rank: Option<usize>,
    pub(crate) crowding: f64,
}

impl<T> Chromosome<T> {
    pub fn id(&self) -> ChromosomeId {
        self.id
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    /// Non-domination rank (0 is the Pareto front), once assigned.
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }

    pub fn crowding_distance(&self) -> f64 {
        self.crowding
    }
}

/// Owner of every chromosome created during one search.
#[derive(Debug, Clone)]
pub struct ChromosomeArena<T> {
    slots: Vec<Chromosome<T>>,
}

impl<T> Default for ChromosomeArena<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Phenotype> ChromosomeArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, value: T, lineage: Lineage) -> ChromosomeId {
        let id = ChromosomeId(self.slots.len());
        self.slots.push(Chromosome {
            id,
            value,
            lineage,
            score: None,
            rank: None,
            crowding: 0.0,
        });
        id
    }

    /// Allocate a new individual carrying an existing one's phenotype and evaluation.
    pub fn duplicate(&mut self, source: ChromosomeId) -> ChromosomeId
    where
        T: Clone,
    {
        let original = &self.slots[source.index()];
        let value = original.value.clone();
        let score = original.score.clone();
        let id = self.alloc(
            value,
            Lineage {
                parents: vec![source],
                crossed: false,
                mutated: false,
            },
        );
        self.slots[id.index()].score = score;
        id
    }

    pub fn get(&self, id: ChromosomeId) -> &Chromosome<T> {
        &self.slots[id.index()]
    }

    pub fn value(&self, id: ChromosomeId) -> &T {
        &self.slots[id.index()].value
    }

    pub(crate) fn value_mut(&mut self, id: ChromosomeId) -> &mut T {
        &mut self.slots[id.index()].value
    }

    pub fn score(&self, id: ChromosomeId) -> Option<&Score> {
        self.slots[id.index()].score.as_ref()
    }

    pub fn is_evaluated(&self, id: ChromosomeId) -> bool {
        self.slots[id.index()].score.is_some()
    }

    /// Evaluate all objectives unless already cached. Returns true on a fresh evaluation.
    pub fn evaluate<X>(
        &mut self,
        id: ChromosomeId,
        objectives: &[Box<dyn FitnessFunction<T, X>>],
        ctx: &mut X,
    ) -> bool {
        let slot = &mut self.slots[id.index()];
        if slot.score.is_some() {
            return false;
        }
        let mut raw = Vec::with_capacity(objectives.len());
        let mut oriented = Vec::with_capacity(objectives.len());
        for objective in objectives {
            let value = objective.fitness(&mut slot.value, ctx);
            raw.push(value);
            oriented.push(orient(objective.normalize(value), objective.direction()));
        }
        slot.score = Some(Score {
            raw,
            oriented,
            length: slot.value.len(),
        });
        true
    }

    /// Set a precomputed evaluation.
    pub fn set_score(&mut self, id: ChromosomeId, score: Score) {
        self.slots[id.index()].score = Some(score);
    }

    pub(crate) fn set_rank(&mut self, id: ChromosomeId, rank: usize, crowding: f64) {
        let slot = &mut self.slots[id.index()];
        slot.rank = Some(rank);
        slot.crowding = crowding;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chromosome<T>> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fitness::Direction;

    struct Sum;

    impl FitnessFunction<Vec<u32>, u32> for Sum {
        fn name(&self) -> &str {
            "sum"
        }

        fn fitness(&self, value: &mut Vec<u32>, calls: &mut u32) -> f64 {
            *calls += 1;
            value.iter().sum::<u32>() as f64
        }

        fn direction(&self) -> Direction {
            Direction::Minimize
        }
    }

    #[test]
    fn test_equal_phenotypes_are_distinct_individuals() {
        let mut arena = ChromosomeArena::new();
        let a = arena.alloc(vec![1, 2], Lineage::initial());
        let b = arena.alloc(vec![1, 2], Lineage::initial());
        assert_ne!(a, b);

        let objectives: Vec<Box<dyn FitnessFunction<Vec<u32>, u32>>> = vec![Box::new(Sum)];
        let mut calls = 0;
        assert!(arena.evaluate(a, &objectives, &mut calls));
        assert!(!arena.evaluate(a, &objectives, &mut calls));
        assert!(!arena.is_evaluated(b));
        assert!(arena.evaluate(b, &objectives, &mut calls));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_minimizing_objective_is_negated() {
        let mut arena = ChromosomeArena::new();
        let a = arena.alloc(vec![3], Lineage::initial());
        let objectives: Vec<Box<dyn FitnessFunction<Vec<u32>, u32>>> = vec![Box::new(Sum)];
        arena.evaluate(a, &objectives, &mut 0);
        let score = arena.score(a).unwrap();
        assert_eq!(score.raw, vec![3.0]);
        assert!(score.oriented[0] < 0.0);
        assert_eq!(score.length, 1);
    }

    #[test]
    fn test_duplicate_keeps_score_and_records_parent() {
        let mut arena = ChromosomeArena::new();
        let a = arena.alloc(vec![5], Lineage::initial());
        let objectives: Vec<Box<dyn FitnessFunction<Vec<u32>, u32>>> = vec![Box::new(Sum)];
        arena.evaluate(a, &objectives, &mut 0);
        let b = arena.duplicate(a);
        assert_ne!(a, b);
        assert_eq!(arena.score(a), arena.score(b));
        assert_eq!(arena.get(b).lineage().parents, vec![a]);
    }
}
