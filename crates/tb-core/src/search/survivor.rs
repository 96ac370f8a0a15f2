//! Survivor selection: shrink the intermediate population back to size.

use super::chromosome::{ChromosomeArena, Phenotype};
use super::comparator::{crowding, dominates, fitness_then_length, Ranked};
use std::cmp::Ordering;
use tb_common::ChromosomeId;

/// Reduces `candidates` (oldest first) to at most `size` survivors.
pub trait SurvivorSelection<T> {
    /// Whether candidates must be evaluated before `survive` is called.
    fn needs_scores(&self) -> bool {
        true
    }

    fn survive(
        &mut self,
        arena: &mut ChromosomeArena<T>,
        candidates: Vec<ChromosomeId>,
        size: usize,
    ) -> Vec<ChromosomeId>;
}

/// Keep the most recently added individuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostRecent;

impl<T> SurvivorSelection<T> for MostRecent {
    fn needs_scores(&self) -> bool {
        false
    }

    fn survive(
        &mut self,
        _arena: &mut ChromosomeArena<T>,
        mut candidates: Vec<ChromosomeId>,
        size: usize,
    ) -> Vec<ChromosomeId> {
        let excess = candidates.len().saturating_sub(size);
        candidates.drain(..excess);
        candidates
    }
}

/// Keep the best individuals on one objective, shorter first on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct Elitist {
    pub objective: usize,
}

impl<T: Phenotype> SurvivorSelection<T> for Elitist {
    fn survive(
        &mut self,
        arena: &mut ChromosomeArena<T>,
        mut candidates: Vec<ChromosomeId>,
        size: usize,
    ) -> Vec<ChromosomeId> {
        candidates.sort_by(|&a, &b| fitness_then_length(arena.get(b), arena.get(a), self.objective));
        candidates.truncate(size);
        candidates
    }
}

/// NSGA-II: fill by non-domination front, break the last front by crowding distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonDominated;

impl<T: Phenotype> SurvivorSelection<T> for NonDominated {
    fn survive(
        &mut self,
        arena: &mut ChromosomeArena<T>,
        candidates: Vec<ChromosomeId>,
        size: usize,
    ) -> Vec<ChromosomeId> {
        let mut survivors = Vec::with_capacity(size);
        for mut front in assign_fronts(arena, &candidates) {
            let room = size - survivors.len();
            if room == 0 {
                break;
            }
            if front.len() > room {
                front.sort_by(|&a, &b| crowding(arena.get(b), arena.get(a)));
                front.truncate(room);
            }
            survivors.extend(front);
        }
        survivors
    }
}

/// Fast non-dominated sort.
///
/// Stores each individual's front index and crowding distance in the arena
/// and returns the fronts, best first.
pub fn assign_fronts<T: Phenotype>(
    arena: &mut ChromosomeArena<T>,
    ids: &[ChromosomeId],
) -> Vec<Vec<ChromosomeId>> {
    let n = ids.len();
    let mut dominated_count = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            match dominates(arena.get(ids[i]), arena.get(ids[j])) {
                Ordering::Greater => {
                    dominated[i].push(j);
                    dominated_count[j] += 1;
                }
                Ordering::Less => {
                    dominated[j].push(i);
                    dominated_count[i] += 1;
                }
                Ordering::Equal => {}
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| dominated_count[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominated[i] {
                dominated_count[j] -= 1;
                if dominated_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current.iter().map(|&i| ids[i]).collect::<Vec<_>>());
        current = next;
    }

    for (rank, front) in fronts.iter().enumerate() {
        let distances = crowding_distances(arena, front);
        for (&id, distance) in front.iter().zip(distances) {
            arena.set_rank(id, rank, distance);
        }
    }
    fronts
}

/// Crowding distance of each member of one front; boundary points get infinity.
fn crowding_distances<T: Phenotype>(arena: &ChromosomeArena<T>, front: &[ChromosomeId]) -> Vec<f64> {
    let n = front.len();
    let mut distances = vec![0.0; n];
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let objectives = front
        .iter()
        .map(|&id| arena.get(id).objectives().len())
        .min()
        .unwrap_or(0);

    for m in 0..objectives {
        let value = |i: usize| arena.get(front[i]).objectives()[m];
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| value(a).total_cmp(&value(b)));
        let (lo, hi) = (value(order[0]), value(order[n - 1]));
        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;
        let span = hi - lo;
        if span <= 0.0 {
            continue;
        }
        for k in 1..(n - 1) {
            distances[order[k]] += (value(order[k + 1]) - value(order[k - 1])) / span;
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::chromosome::{Lineage, Score};

    fn population(points: &[(&[f64], usize)]) -> (ChromosomeArena<Vec<u8>>, Vec<ChromosomeId>) {
        let mut arena = ChromosomeArena::new();
        let ids = points
            .iter()
            .map(|&(objectives, len)| {
                let id = arena.alloc(vec![0; len], Lineage::initial());
                arena.set_score(
                    id,
                    Score {
                        raw: objectives.to_vec(),
                        oriented: objectives.to_vec(),
                        length: len,
                    },
                );
                id
            })
            .collect();
        (arena, ids)
    }

    #[test]
    fn test_most_recent_keeps_tail() {
        let (mut arena, ids) = population(&[(&[0.0], 1), (&[0.0], 1), (&[0.0], 1)]);
        let kept = MostRecent.survive(&mut arena, ids.clone(), 2);
        assert_eq!(kept, vec![ids[1], ids[2]]);
        let all = MostRecent.survive(&mut arena, ids.clone(), 10);
        assert_eq!(all, ids);
    }

    #[test]
    fn test_elitist_keeps_best_and_shortest() {
        let (mut arena, ids) = population(&[(&[0.2], 1), (&[0.9], 8), (&[0.9], 3), (&[0.5], 1)]);
        let kept = Elitist::default().survive(&mut arena, ids.clone(), 2);
        assert_eq!(kept, vec![ids[2], ids[1]]);
    }

    #[test]
    fn test_fronts() {
        let (mut arena, ids) = population(&[
            (&[1.0, 0.0], 1),
            (&[0.0, 1.0], 1),
            (&[0.5, 0.5], 1),
            (&[0.2, 0.2], 1),
            (&[0.0, 0.0], 1),
        ]);
        let fronts = assign_fronts(&mut arena, &ids);
        assert_eq!(fronts.len(), 3);
        assert_eq!(fronts[0].len(), 3);
        assert_eq!(fronts[1], vec![ids[3]]);
        assert_eq!(fronts[2], vec![ids[4]]);
        assert_eq!(arena.get(ids[4]).rank(), Some(2));
        // The middle of the first front is the only finite crowding distance.
        assert!(arena.get(ids[0]).crowding_distance().is_infinite());
        assert!(arena.get(ids[2]).crowding_distance().is_finite());
    }

    #[test]
    fn test_non_dominated_truncates_last_front_by_crowding() {
        let (mut arena, ids) = population(&[
            (&[1.0, 0.0], 1),
            (&[0.0, 1.0], 1),
            (&[0.5, 0.5], 1),
            (&[0.0, 0.0], 1),
        ]);
        let kept = NonDominated.survive(&mut arena, ids.clone(), 2);
        assert_eq!(kept.len(), 2);
        assert!(kept.contains(&ids[0]));
        assert!(kept.contains(&ids[1]));

        let kept = NonDominated.survive(&mut arena, ids.clone(), 4);
        assert_eq!(kept.len(), 4);
    }
}
