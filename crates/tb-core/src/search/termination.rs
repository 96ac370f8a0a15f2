//! Termination conditions, checked between generations or energy cycles.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Progress counters of a running search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchProgress {
    /// Completed generations or energy cycles.
    pub iterations: u64,
    /// Fresh fitness evaluations (each one may execute the target).
    pub evaluations: u64,
    #[serde(skip)]
    pub started: Instant,
}

impl SearchProgress {
    pub fn start() -> Self {
        Self {
            iterations: 0,
            evaluations: 0,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for SearchProgress {
    fn default() -> Self {
        Self::start()
    }
}

pub trait TerminationCondition {
    fn should_stop(&self, progress: &SearchProgress) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct IterationLimit(pub u64);

impl TerminationCondition for IterationLimit {
    fn should_stop(&self, progress: &SearchProgress) -> bool {
        progress.iterations >= self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationBudget(pub u64);

impl TerminationCondition for EvaluationBudget {
    fn should_stop(&self, progress: &SearchProgress) -> bool {
        progress.evaluations >= self.0
    }
}

/// Wall-clock budget measured from the start of the search.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(pub Duration);

impl TerminationCondition for Deadline {
    fn should_stop(&self, progress: &SearchProgress) -> bool {
        progress.elapsed() >= self.0
    }
}

/// Stops as soon as any inner condition does. An empty set never stops.
#[derive(Default)]
pub struct AnyOf(pub Vec<Box<dyn TerminationCondition>>);

impl AnyOf {
    /// Combine the optional iteration and wall-clock limits of a config section.
    pub fn from_limits(max_iterations: Option<u64>, max_seconds: Option<u64>) -> Self {
        let mut conditions: Vec<Box<dyn TerminationCondition>> = Vec::new();
        if let Some(limit) = max_iterations {
            conditions.push(Box::new(IterationLimit(limit)));
        }
        if let Some(seconds) = max_seconds {
            conditions.push(Box::new(Deadline(Duration::from_secs(seconds))));
        }
        Self(conditions)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TerminationCondition for AnyOf {
    fn should_stop(&self, progress: &SearchProgress) -> bool {
        self.0.iter().any(|c| c.should_stop(progress))
    }
}
