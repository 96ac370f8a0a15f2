//! Multi-objective comparators shared by every search strategy.
//!
//! They only look at a [`Ranked`] view (oriented objectives, length and a
//! diversity score), so the same functions serve the plain GA, NSGA-II
//! survivor selection and the per-objective archive.
//!
//! All comparators return [`Ordering::Greater`] when the first argument is
//! the better one.

use super::chromosome::Chromosome;
use std::cmp::Ordering;

/// What the comparators need to know about an individual.
pub trait Ranked {
    /// Normalized objectives, larger is better.
    fn objectives(&self) -> &[f64];
    fn length(&self) -> usize;
    fn crowding_distance(&self) -> f64;
}

impl<T> Ranked for Chromosome<T> {
    fn objectives(&self) -> &[f64] {
        self.score().map(|s| s.oriented.as_slice()).unwrap_or(&[])
    }

    fn length(&self) -> usize {
        self.score().map(|s| s.length).unwrap_or(0)
    }

    fn crowding_distance(&self) -> f64 {
        self.crowding
    }
}

/// Pareto dominance.
///
/// `Greater` if `a` is never worse and strictly better at least once,
/// `Less` for the converse, `Equal` when neither dominates (trade-off or tie).
pub fn dominance(a: &[f64], b: &[f64]) -> Ordering {
    let (a_better, b_better) = a
        .iter()
        .zip(b)
        .fold((false, false), |(a_better, b_better), (x, y)| {
            (a_better || x > y, b_better || y > x)
        });
    match (a_better, b_better) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Dominance between two ranked individuals.
pub fn dominates<R: Ranked + ?Sized>(a: &R, b: &R) -> Ordering {
    dominance(a.objectives(), b.objectives())
}

/// More diverse first.
pub fn crowding<R: Ranked + ?Sized>(a: &R, b: &R) -> Ordering {
    a.crowding_distance().total_cmp(&b.crowding_distance())
}

/// Fitness on one objective, then shorter length.
pub fn fitness_then_length<R: Ranked + ?Sized>(a: &R, b: &R, objective: usize) -> Ordering {
    let fa = a.objectives().get(objective).copied().unwrap_or(f64::NEG_INFINITY);
    let fb = b.objectives().get(objective).copied().unwrap_or(f64::NEG_INFINITY);
    fa.total_cmp(&fb).then_with(|| b.length().cmp(&a.length()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Point {
        objectives: Vec<f64>,
        length: usize,
        crowding: f64,
    }

    impl Ranked for Point {
        fn objectives(&self) -> &[f64] {
            &self.objectives
        }

        fn length(&self) -> usize {
            self.length
        }

        fn crowding_distance(&self) -> f64 {
            self.crowding
        }
    }

    fn point(objectives: &[f64], length: usize) -> Point {
        Point {
            objectives: objectives.to_vec(),
            length,
            crowding: 0.0,
        }
    }

    #[test]
    fn test_dominance_cases() {
        assert_eq!(dominance(&[1.0, 1.0], &[0.0, 1.0]), Ordering::Greater);
        assert_eq!(dominance(&[0.0, 1.0], &[1.0, 1.0]), Ordering::Less);
        assert_eq!(dominance(&[1.0, 0.0], &[0.0, 1.0]), Ordering::Equal);
        assert_eq!(dominance(&[0.5, 0.5], &[0.5, 0.5]), Ordering::Equal);
    }

    #[test]
    fn test_fitness_then_length_prefers_shorter_on_tie() {
        let short = point(&[0.8], 3);
        let long = point(&[0.8], 9);
        let better = point(&[0.9], 20);
        assert_eq!(fitness_then_length(&short, &long, 0), Ordering::Greater);
        assert_eq!(fitness_then_length(&better, &short, 0), Ordering::Greater);
        assert_eq!(fitness_then_length(&short, &short, 0), Ordering::Equal);
    }

    #[test]
    fn test_crowding_prefers_diverse() {
        let mut a = point(&[0.0], 1);
        let mut b = point(&[0.0], 1);
        a.crowding = f64::INFINITY;
        b.crowding = 2.0;
        assert_eq!(crowding(&a, &b), Ordering::Greater);
        assert_eq!(crowding(&b, &a), Ordering::Less);
    }

    fn objectives() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1.0f64..1.0, 3)
    }

    proptest! {
        #[test]
        fn dominance_is_irreflexive(a in objectives()) {
            prop_assert_eq!(dominance(&a, &a), Ordering::Equal);
        }

        #[test]
        fn dominance_is_antisymmetric(a in objectives(), b in objectives()) {
            prop_assert_eq!(dominance(&a, &b), dominance(&b, &a).reverse());
        }

        #[test]
        fn fitness_then_length_is_antisymmetric(
            fa in -1.0f64..1.0, fb in -1.0f64..1.0, la in 0usize..10, lb in 0usize..10
        ) {
            let a = point(&[fa], la);
            let b = point(&[fb], lb);
            prop_assert_eq!(fitness_then_length(&a, &b, 0), fitness_then_length(&b, &a, 0).reverse());
        }
    }
}
