//! Action-sequence test cases.

use crate::fsm::Transition;
use crate::search::Phenotype;
use crate::target::{TargetError, TraceSet};
use std::collections::BTreeSet;
use tb_common::StateId;

/// What happened when a test case was run, for real or in the surrogate.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord<A> {
    /// States in visiting order, starting with the launch state.
    pub visited: Vec<StateId>,
    pub transitions: Vec<Transition<A>>,
    /// Trace signature of every transition.
    pub traces: Vec<TraceSet>,
    /// Coverage goals hit, live or as cached by the surrogate for predicted steps.
    pub coverage: BTreeSet<u64>,
    /// Failure that stopped the test case early.
    pub failure: Option<TargetError>,
    /// Whether every action was answered by the surrogate.
    pub predicted: bool,
}

impl<A> Default for ExecutionRecord<A> {
    fn default() -> Self {
        Self {
            visited: Vec::new(),
            transitions: Vec::new(),
            traces: Vec::new(),
            coverage: BTreeSet::new(),
            failure: None,
            predicted: false,
        }
    }
}

impl<A> ExecutionRecord<A> {
    pub(crate) fn push(&mut self, transition: Transition<A>, traces: TraceSet) {
        self.visited.push(transition.target);
        self.transitions.push(transition);
        self.traces.push(traces);
    }

    /// Forget the recorded steps, keeping coverage and failure.
    pub(crate) fn restart(&mut self, start: StateId) {
        self.visited = vec![start];
        self.transitions.clear();
        self.traces.clear();
    }

    pub fn crashed(&self) -> bool {
        matches!(self.failure, Some(TargetError::Crashed(_)))
    }

    pub fn distinct_states(&self) -> BTreeSet<StateId> {
        self.visited.iter().copied().collect()
    }

    pub fn final_state(&self) -> Option<StateId> {
        self.visited.last().copied()
    }
}

/// An ordered action sequence plus the record of its last execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase<A> {
    actions: Vec<A>,
    record: Option<ExecutionRecord<A>>,
}

impl<A> TestCase<A> {
    pub fn new(actions: Vec<A>) -> Self {
        Self {
            actions,
            record: None,
        }
    }

    pub(crate) fn executed(actions: Vec<A>, record: ExecutionRecord<A>) -> Self {
        Self {
            actions,
            record: Some(record),
        }
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn record(&self) -> Option<&ExecutionRecord<A>> {
        self.record.as_ref()
    }

    pub fn is_executed(&self) -> bool {
        self.record.is_some()
    }

    /// The cached record, produced by `run` on first use.
    pub(crate) fn record_or_run(
        &mut self,
        run: impl FnOnce(&[A]) -> ExecutionRecord<A>,
    ) -> &ExecutionRecord<A> {
        let actions = &self.actions;
        self.record.get_or_insert_with(|| run(actions))
    }
}

impl<A> Phenotype for TestCase<A> {
    fn len(&self) -> usize {
        self.actions.len()
    }
}
