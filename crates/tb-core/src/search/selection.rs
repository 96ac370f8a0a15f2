//! Parent selection.

use super::chromosome::{ChromosomeArena, Phenotype};
use super::comparator::{crowding, fitness_then_length};
use super::survivor::assign_fronts;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Ordering;
use tb_common::ChromosomeId;

/// Picks one parent from an evaluated, non-empty population.
pub trait SelectionFunction<T> {
    /// Hook run once per generation before any parent is selected.
    fn prepare(&mut self, _arena: &mut ChromosomeArena<T>, _population: &[ChromosomeId]) {}

    fn select(
        &mut self,
        arena: &ChromosomeArena<T>,
        population: &[ChromosomeId],
        rng: &mut StdRng,
    ) -> ChromosomeId;
}

fn random_member(population: &[ChromosomeId], rng: &mut StdRng) -> ChromosomeId {
    population[rng.random_range(0..population.len())]
}

/// Best of `size` uniformly drawn individuals by fitness, then length.
#[derive(Debug, Clone, Copy)]
pub struct Tournament {
    pub size: usize,
    pub objective: usize,
}

impl Tournament {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            objective: 0,
        }
    }
}

impl<T: Phenotype> SelectionFunction<T> for Tournament {
    fn select(
        &mut self,
        arena: &ChromosomeArena<T>,
        population: &[ChromosomeId],
        rng: &mut StdRng,
    ) -> ChromosomeId {
        let mut best = random_member(population, rng);
        for _ in 1..self.size {
            let challenger = random_member(population, rng);
            if fitness_then_length(arena.get(challenger), arena.get(best), self.objective)
                == Ordering::Greater
            {
                best = challenger;
            }
        }
        best
    }
}

/// Roulette wheel over one objective, shifted so the worst individual still has a small chance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitnessProportionate {
    pub objective: usize,
}

impl<T: Phenotype> SelectionFunction<T> for FitnessProportionate {
    fn select(
        &mut self,
        arena: &ChromosomeArena<T>,
        population: &[ChromosomeId],
        rng: &mut StdRng,
    ) -> ChromosomeId {
        let fitness: Vec<f64> = population
            .iter()
            .map(|&id| {
                arena
                    .score(id)
                    .and_then(|s| s.oriented.get(self.objective).copied())
                    .unwrap_or(0.0)
            })
            .collect();
        let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let weights: Vec<f64> = fitness.iter().map(|f| f - min + 1e-6).collect();
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return random_member(population, rng);
        }

        let mut spin = rng.random_range(0.0..total);
        for (id, weight) in population.iter().zip(&weights) {
            if spin < *weight {
                return *id;
            }
            spin -= weight;
        }
        population[population.len() - 1]
    }
}

/// Uniform choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelection;

impl<T> SelectionFunction<T> for RandomSelection {
    fn select(
        &mut self,
        _arena: &ChromosomeArena<T>,
        population: &[ChromosomeId],
        rng: &mut StdRng,
    ) -> ChromosomeId {
        random_member(population, rng)
    }
}

/// NSGA-II binary tournament: lower rank wins, then larger crowding distance.
#[derive(Debug, Clone, Copy)]
pub struct CrowdedTournament {
    pub size: usize,
}

impl Default for CrowdedTournament {
    fn default() -> Self {
        Self { size: 2 }
    }
}

impl<T: Phenotype> SelectionFunction<T> for CrowdedTournament {
    fn prepare(&mut self, arena: &mut ChromosomeArena<T>, population: &[ChromosomeId]) {
        assign_fronts(arena, population);
    }

    fn select(
        &mut self,
        arena: &ChromosomeArena<T>,
        population: &[ChromosomeId],
        rng: &mut StdRng,
    ) -> ChromosomeId {
        let mut best = random_member(population, rng);
        for _ in 1..self.size.max(1) {
            let challenger = random_member(population, rng);
            let (c, b) = (arena.get(challenger), arena.get(best));
            let rank_c = c.rank().unwrap_or(usize::MAX);
            let rank_b = b.rank().unwrap_or(usize::MAX);
            let wins = match rank_c.cmp(&rank_b) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => crowding(c, b) == Ordering::Greater,
            };
            if wins {
                best = challenger;
            }
        }
        best
    }
}
