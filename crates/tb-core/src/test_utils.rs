//! Test utilities for tb-core.
//!
//! This module provides test infrastructure including:
//! - A scripted fake application implementing [`Target`]
//! - A fixed behavior model for novelty tests
//! - Common assertions

use crate::fsm::{FeatureVector, Transition};
use crate::novelty::BehaviorModel;
use crate::target::{Execution, Target, TargetError, TraceSet};
use std::collections::BTreeSet;
use tb_math::BinomialOpinion;

// ============================================================================
// Macros
// ============================================================================

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that two floating point numbers are approximately equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        $crate::assert_approx_eq!($a, $b, 1e-9_f64)
    };
    ($a:expr, $b:expr, $epsilon:expr) => {{
        let a: f64 = $a;
        let b: f64 = $b;
        let eps: f64 = $epsilon;
        let diff = (a - b).abs();
        if diff > eps {
            panic!(
                "assertion failed: `(left ~= right)` (left: `{}`, right: `{}`, diff: `{}`, epsilon: `{}`)",
                a, b, diff, eps
            );
        }
    }};
}

// ============================================================================
// Fake application
// ============================================================================

/// Screen of the fake application.
///
/// The clock text changes on every observation, so exact matching never
/// merges two observations while the feature vector ignores it.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub index: usize,
    pub screens: usize,
    pub clock: u64,
}

impl FeatureVector for Screen {
    fn features(&self) -> Vec<f64> {
        let mut features = vec![0.0; self.screens];
        if let Some(slot) = features.get_mut(self.index) {
            *slot = 1.0;
        }
        features
    }
}

/// Deterministic chain of screens.
///
/// Screen `i` offers `NEXT` (to `i + 1`, except on the last screen), `HOME`
/// (back to screen 0) and `STAY`. Every executed action hits the coverage
/// goal `screen * 10 + action`.
#[derive(Debug, Clone)]
pub struct FakeApp {
    screens: usize,
    current: usize,
    clock: u64,
    crash: Option<(usize, u8)>,
    pending: BTreeSet<u64>,
    executions: u64,
    restarts: u64,
}

impl FakeApp {
    pub const NEXT: u8 = 0;
    pub const HOME: u8 = 1;
    pub const STAY: u8 = 2;

    pub fn chain(screens: usize) -> Self {
        Self {
            screens: screens.max(1),
            current: 0,
            clock: 0,
            crash: None,
            pending: BTreeSet::new(),
            executions: 0,
            restarts: 0,
        }
    }

    /// Crash whenever `action` is executed on `screen`.
    pub fn with_crash(mut self, screen: usize, action: u8) -> Self {
        self.crash = Some((screen, action));
        self
    }

    pub fn executions(&self) -> u64 {
        self.executions
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn current_screen(&self) -> usize {
        self.current
    }

    fn observe(&mut self) -> Screen {
        self.clock += 1;
        Screen {
            index: self.current,
            screens: self.screens,
            clock: self.clock,
        }
    }
}

impl Target for FakeApp {
    type Action = u8;
    type Observation = Screen;
    type Outcome = String;

    fn execute(&mut self, action: &u8) -> Result<Execution<Screen, String>, TargetError> {
        if self.crash == Some((self.current, *action)) {
            return Err(TargetError::Crashed(format!(
                "action {} on screen {}",
                action, self.current
            )));
        }
        self.executions += 1;
        let source = self.current;
        self.pending.insert(source as u64 * 10 + u64::from(*action));
        self.current = match *action {
            Self::NEXT if source + 1 < self.screens => source + 1,
            Self::HOME => 0,
            _ => source,
        };
        let traces: TraceSet = [format!("screen{}:action{}", source, action)].into();
        Ok(Execution {
            observation: self.observe(),
            outcome: format!("screen{}", self.current),
            traces,
        })
    }

    fn restart(&mut self) -> Result<Screen, TargetError> {
        self.restarts += 1;
        self.current = 0;
        Ok(self.observe())
    }

    fn available_actions(&self) -> Vec<u8> {
        if self.current + 1 < self.screens {
            vec![Self::NEXT, Self::HOME, Self::STAY]
        } else {
            vec![Self::HOME, Self::STAY]
        }
    }

    fn take_coverage(&mut self) -> BTreeSet<u64> {
        std::mem::take(&mut self.pending)
    }
}

// ============================================================================
// Behavior model
// ============================================================================

/// Moving forward is always novel; every other transition is mostly familiar.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeBehaviorModel;

impl BehaviorModel<u8> for FakeBehaviorModel {
    fn coarsen(&self, trace: &[Transition<u8>]) -> Vec<BinomialOpinion> {
        trace
            .iter()
            .map(|t| {
                if t.target > t.source {
                    BinomialOpinion::certain_false()
                } else {
                    BinomialOpinion::new(0.9, 0.0, 0.1, 0.5)
                        .unwrap_or_else(|_| BinomialOpinion::vacuous(0.5))
                }
            })
            .collect()
    }
}
