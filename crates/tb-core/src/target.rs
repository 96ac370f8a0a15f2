//! Contract with the application under test.
//!
//! Everything behind this trait (device control, UI hierarchy parsing,
//! coverage instrumentation) lives outside the core. Calls are blocking and
//! strictly sequential: only one action is ever outstanding.

use crate::fsm::FeatureVector;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

/// Trace signature emitted by the application while executing one action
/// (log lines, instrumentation markers, ...).
pub type TraceSet = BTreeSet<String>;

/// Failures of the application under test.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target unreachable: {0}")]
    Unreachable(String),

    #[error("target crashed: {0}")]
    Crashed(String),
}

impl From<TargetError> for tb_common::Error {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::Unreachable(msg) => tb_common::Error::TargetUnreachable(msg),
            TargetError::Crashed(msg) => tb_common::Error::TargetCrashed(msg),
        }
    }
}

/// Result of executing one action for real.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution<O, R> {
    pub observation: O,
    pub outcome: R,
    pub traces: TraceSet,
}

/// The application under test.
pub trait Target {
    type Action: Clone + Eq + Hash + Debug + 'static;
    /// Screens are compared exactly or through their feature vector,
    /// depending on the configured equivalence policy.
    type Observation: PartialEq + FeatureVector + 'static;
    type Outcome: Clone;

    /// Execute one action and observe the resulting screen.
    fn execute(
        &mut self,
        action: &Self::Action,
    ) -> Result<Execution<Self::Observation, Self::Outcome>, TargetError>;

    /// Restart the application and observe its start screen.
    fn restart(&mut self) -> Result<Self::Observation, TargetError>;

    /// Actions applicable on the current screen.
    fn available_actions(&self) -> Vec<Self::Action>;

    /// Coverage goals hit since the previous call.
    fn take_coverage(&mut self) -> BTreeSet<u64>;
}
