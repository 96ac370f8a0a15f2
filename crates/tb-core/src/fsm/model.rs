//! Incremental finite-state abstraction of observed behavior.
//!
//! States are allocated lazily by [`StateModel::get_state`] and become part
//! of the model once a transition touches them. The model keeps a cursor on
//! the state the application is believed to be in; it moves with every
//! committed transition and with [`StateModel::go_to_state`].

use super::equivalence::StateEquivalence;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use tb_common::StateId;
use thiserror::Error;

/// Error types for state model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsmError {
    #[error("state {0} was never registered in the state model")]
    UnknownState(StateId),
}

impl From<FsmError> for tb_common::Error {
    fn from(err: FsmError) -> Self {
        match err {
            FsmError::UnknownState(id) => tb_common::Error::UnknownState {
                state: id.to_string(),
            },
        }
    }
}

/// An abstract state together with the observation that created it.
#[derive(Debug, Clone)]
pub struct State<O> {
    id: StateId,
    observation: O,
}

impl<O> State<O> {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn observation(&self) -> &O {
        &self.observation
    }
}

/// A labeled edge between two abstract states.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transition<A> {
    pub source: StateId,
    pub action: A,
    pub target: StateId,
}

impl<A> Transition<A> {
    pub fn new(source: StateId, action: A, target: StateId) -> Self {
        Self {
            source,
            action,
            target,
        }
    }
}

impl<A: fmt::Debug> fmt::Display for Transition<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{:?}--> {}", self.source, self.action, self.target)
    }
}

/// The state abstraction shared by the surrogate layer and the search engines.
pub struct StateModel<O, A> {
    equivalence: Box<dyn StateEquivalence<O>>,
    states: Vec<State<O>>,
    registered: BTreeSet<StateId>,
    transitions: Vec<Transition<A>>,
    known: HashSet<Transition<A>>,
    outgoing: HashMap<StateId, Vec<usize>>,
    root: StateId,
    current: StateId,
    reached_new_state: bool,
}

impl<O, A> StateModel<O, A>
where
    A: Clone + Eq + Hash,
{
    /// Create a model whose root state is the given observation.
    pub fn new(initial: O, equivalence: Box<dyn StateEquivalence<O>>) -> Self {
        let root = StateId(0);
        let mut registered = BTreeSet::new();
        registered.insert(root);
        Self {
            equivalence,
            states: vec![State {
                id: root,
                observation: initial,
            }],
            registered,
            transitions: Vec::new(),
            known: HashSet::new(),
            outgoing: HashMap::new(),
            root,
            current: root,
            reached_new_state: false,
        }
    }

    /// Map an observation to its abstract state, allocating one on a miss.
    ///
    /// Known states are scanned in allocation order and the first equivalent
    /// one wins, so repeated queries are stable.
    pub fn get_state(&mut self, observation: O) -> StateId {
        if let Some(state) = self
            .states
            .iter()
            .find(|s| self.equivalence.equivalent(&s.observation, &observation))
        {
            return state.id;
        }
        let id = StateId(self.states.len());
        tracing::trace!(state = %id, "allocated state for novel observation");
        self.states.push(State { id, observation });
        id
    }

    /// Commit a transition. Returns whether the transition was new.
    ///
    /// Sets the reached-new-state flag if either endpoint was not yet part of
    /// the model, and moves the cursor to the target.
    pub fn add_transition(&mut self, transition: Transition<A>) -> bool {
        debug_assert!(transition.source.index() < self.states.len());
        debug_assert!(transition.target.index() < self.states.len());

        let source_new = self.registered.insert(transition.source);
        let target_new = self.registered.insert(transition.target);
        if source_new || target_new {
            self.reached_new_state = true;
        }
        self.current = transition.target;

        if self.known.contains(&transition) {
            return false;
        }
        let idx = self.transitions.len();
        self.outgoing.entry(transition.source).or_default().push(idx);
        self.known.insert(transition.clone());
        self.transitions.push(transition);
        true
    }

    /// Move the cursor to a registered state.
    pub fn go_to_state(&mut self, state: StateId) -> Result<(), FsmError> {
        if !self.registered.contains(&state) {
            return Err(FsmError::UnknownState(state));
        }
        self.current = state;
        Ok(())
    }

    /// Position the cursor on the state matching an observation taken after
    /// a restart, registering it if it was never seen before.
    pub fn restart_at(&mut self, observation: O) -> StateId {
        let state = self.get_state(observation);
        if self.registered.insert(state) {
            self.reached_new_state = true;
        }
        self.current = state;
        state
    }

    /// Outgoing transitions of a state, optionally restricted to one action.
    pub fn outgoing_transitions(&self, state: StateId, action: Option<&A>) -> Vec<&Transition<A>> {
        self.outgoing
            .get(&state)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.transitions[i])
                    .filter(|t| action.map_or(true, |a| &t.action == a))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Breadth-first shortest path. `from == to` yields the empty path.
    pub fn shortest_path(&self, from: StateId, to: StateId) -> Option<Vec<&Transition<A>>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut via: HashMap<StateId, usize> = HashMap::new();
        let mut visited: HashSet<StateId> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(state) = queue.pop_front() {
            for &idx in self.outgoing.get(&state).into_iter().flatten() {
                let next = self.transitions[idx].target;
                if !visited.insert(next) {
                    continue;
                }
                via.insert(next, idx);
                if next == to {
                    return Some(self.unwind_path(&via, from, to));
                }
                queue.push_back(next);
            }
        }
        None
    }

    fn unwind_path(&self, via: &HashMap<StateId, usize>, from: StateId, to: StateId) -> Vec<&Transition<A>> {
        let mut path = Vec::new();
        let mut state = to;
        while state != from {
            let t = &self.transitions[via[&state]];
            path.push(t);
            state = t.source;
        }
        path.reverse();
        path
    }

    /// `(source, action)` pairs observed to lead to more than one target.
    pub fn nondeterministic_points(&self) -> Vec<(StateId, &A)> {
        let mut targets: HashMap<(StateId, &A), BTreeSet<StateId>> = HashMap::new();
        for t in &self.transitions {
            targets
                .entry((t.source, &t.action))
                .or_default()
                .insert(t.target);
        }
        let mut points: Vec<(StateId, &A)> = targets
            .into_iter()
            .filter(|(_, ts)| ts.len() > 1)
            .map(|(key, _)| key)
            .collect();
        points.sort_by_key(|(s, _)| *s);
        points
    }

    pub fn is_deterministic(&self) -> bool {
        self.nondeterministic_points().is_empty()
    }

    /// Unregister states no longer reachable from the root and drop their
    /// outgoing transitions. Returns the number of pruned states.
    ///
    /// State ids are never reused; a pruned state re-enters the model when a
    /// later transition touches it.
    pub fn prune_unreachable(&mut self) -> usize {
        let mut reachable = BTreeSet::new();
        let mut queue = VecDeque::from([self.root]);
        reachable.insert(self.root);
        while let Some(state) = queue.pop_front() {
            for t in self.outgoing_transitions(state, None) {
                if reachable.insert(t.target) {
                    queue.push_back(t.target);
                }
            }
        }

        let pruned = self.registered.difference(&reachable).count();
        if pruned == 0 {
            return 0;
        }

        self.registered = reachable;
        let kept: Vec<Transition<A>> = self
            .transitions
            .drain(..)
            .filter(|t| self.registered.contains(&t.source))
            .collect();
        self.known = kept.iter().cloned().collect();
        self.outgoing.clear();
        for (idx, t) in kept.iter().enumerate() {
            self.outgoing.entry(t.source).or_default().push(idx);
        }
        self.transitions = kept;
        if !self.registered.contains(&self.current) {
            self.current = self.root;
        }

        tracing::debug!(pruned, remaining = self.registered.len(), "pruned unreachable states");
        pruned
    }

    pub fn state(&self, id: StateId) -> Option<&State<O>> {
        self.states.get(id.index())
    }

    pub fn is_registered(&self, id: StateId) -> bool {
        self.registered.contains(&id)
    }

    /// Registered states in id order.
    pub fn registered_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.registered.iter().copied()
    }

    pub fn transitions(&self) -> &[Transition<A>] {
        &self.transitions
    }

    pub fn num_states(&self) -> usize {
        self.registered.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn reached_new_state(&self) -> bool {
        self.reached_new_state
    }

    pub fn clear_new_state_flag(&mut self) {
        self.reached_new_state = false;
    }
}
