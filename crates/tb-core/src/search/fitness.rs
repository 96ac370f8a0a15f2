//! Fitness functions.

use serde::Serialize;

/// Whether larger or smaller raw fitness is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Maximize,
    Minimize,
}

/// One objective of the search.
///
/// `fitness` receives the phenotype mutably so that phenotypes which must be
/// executed before they can be scored (test cases) can record their
/// execution once and share it with every other objective.
pub trait FitnessFunction<T, X> {
    fn name(&self) -> &str;

    fn fitness(&self, value: &mut T, ctx: &mut X) -> f64;

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn is_maximizing(&self) -> bool {
        self.direction() == Direction::Maximize
    }

    /// Map raw fitness into `[0, 1]`, preserving order.
    ///
    /// The default suits non-negative unbounded fitness; objectives with a
    /// known range should override it.
    fn normalize(&self, raw: f64) -> f64 {
        if raw <= 0.0 {
            0.0
        } else {
            raw / (raw + 1.0)
        }
    }
}

/// Flip minimizing objectives so that larger is always better.
pub fn orient(normalized: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Maximize => normalized,
        Direction::Minimize => -normalized,
    }
}
