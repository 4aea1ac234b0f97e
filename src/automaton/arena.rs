//! Arena-based state allocation for cyclic NFA structures.
//!
//! States reference each other by `StateId`, a plain index, so the loops that
//! `*`, `+` and the language operators create need no shared ownership.
//!
//! ```text
//! a*   start ──ε──> s ──a──> t ──ε──> last
//!        │          ^        │         ^
//!        │          └───ε────┘         │
//!        └─────────────ε───────────────┘
//! ```
//!
//! Every traversal in here uses an explicit work-list: automata built from
//! large repeat counts are deep enough to overflow the call stack.

use smallvec::SmallVec;

use super::action::{action_key, ActionRef};
use super::char_trans::Transition;
use super::state_set::StateSet;

/// A state identifier - just an index into an arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct StateId(u32);

impl StateId {
    /// Sentinel for "no state".
    pub const NONE: StateId = StateId(u32::MAX);

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        StateId(index as u32)
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Highest number of reporting subgroups one action may carry.
pub const MAX_SUBGROUPS: usize = 128;

/// Membership of a state in a capturing subgraph.
///
/// A marker is created with exactly one role; markers of different NFA states
/// end up OR-ed together in a DFA state, which is why the roles are flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubgraphMarker {
    pub id: u8,
    pub start: bool,
    pub inner: bool,
    pub stop: bool,
}

impl SubgraphMarker {
    pub fn start(id: u8) -> Self {
        Self {
            id,
            start: true,
            inner: false,
            stop: false,
        }
    }

    pub fn inner(id: u8) -> Self {
        Self {
            id,
            start: false,
            inner: true,
            stop: false,
        }
    }

    /// The exit of a subgraph is also inside it.
    pub fn stop(id: u8) -> Self {
        Self {
            id,
            start: false,
            inner: true,
            stop: true,
        }
    }

    fn absorb(&mut self, other: &SubgraphMarker) {
        self.start |= other.start;
        self.inner |= other.inner;
        self.stop |= other.stop;
    }
}

pub(crate) type Markers = SmallVec<[SubgraphMarker; 4]>;

/// Insert into a list sorted by id, merging roles on equal ids.
pub(crate) fn insert_marker(markers: &mut Markers, marker: SubgraphMarker) {
    match markers.binary_search_by_key(&marker.id, |m| m.id) {
        Ok(pos) => markers[pos].absorb(&marker),
        Err(pos) => markers.insert(pos, marker),
    }
}

/// Subgraph markers of one state, scoped by the action they belong to.
///
/// Markers set before an action is attached are "unbound" (`None`) and get
/// bound by `Nfa::add_action`.
#[derive(Clone, Default, Debug)]
pub(crate) struct SubInfo {
    entries: SmallVec<[(Option<ActionRef>, Markers); 1]>,
}

impl SubInfo {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(&mut self, action: Option<&ActionRef>) -> &mut Markers {
        let key = action.map(action_key);
        let pos = self
            .entries
            .iter()
            .position(|(a, _)| a.as_ref().map(action_key) == key);
        let pos = match pos {
            Some(pos) => pos,
            None => {
                self.entries.push((action.cloned(), Markers::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn add(&mut self, action: Option<&ActionRef>, marker: SubgraphMarker) {
        insert_marker(self.slot(action), marker);
    }

    /// Bind all unbound markers to `action`.
    pub fn bind(&mut self, action: &ActionRef) {
        let Some(pos) = self.entries.iter().position(|(a, _)| a.is_none()) else {
            return;
        };
        let (_, unbound) = self.entries.remove(pos);
        let slot = self.slot(Some(action));
        for m in unbound {
            insert_marker(slot, m);
        }
    }

    /// Renumber unbound markers so they follow another automaton's ids.
    pub fn shift_unbound(&mut self, offset: u8) {
        if offset == 0 {
            return;
        }
        for (action, markers) in self.entries.iter_mut() {
            if action.is_none() {
                for m in markers.iter_mut() {
                    m.id += offset;
                }
            }
        }
    }

    /// Union with another state's markers; unbound markers are skipped.
    pub fn merge_bound(&mut self, other: &SubInfo) {
        for (action, markers) in &other.entries {
            let Some(action) = action else { continue };
            let slot = self.slot(Some(action));
            for m in markers {
                insert_marker(slot, *m);
            }
        }
    }

    pub fn markers(&self, key: usize) -> Option<&Markers> {
        self.entries
            .iter()
            .find(|(a, _)| a.as_ref().map(action_key) == Some(key))
            .map(|(_, m)| m)
    }
}

/// A state of a non-deterministic automaton under construction.
#[derive(Clone, Default, Debug)]
pub(crate) struct NfaState {
    /// Sorted, non-overlapping character transitions
    pub trans: Vec<Transition>,
    /// Epsilon transitions
    pub eps: Vec<StateId>,
    pub action: Option<ActionRef>,
    pub sub: SubInfo,
}

impl NfaState {
    /// A state the compiler must keep in a closure: anything but a pure epsilon hop.
    #[inline]
    pub fn is_important(&self) -> bool {
        !self.trans.is_empty() || self.action.is_some() || !self.sub.is_empty()
    }

    /// True if nothing is attached to this state at all.
    #[inline]
    pub fn is_bare(&self) -> bool {
        self.trans.is_empty() && self.eps.is_empty() && self.action.is_none() && self.sub.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = StateId> + '_ {
        self.trans.iter().map(|t| t.to).chain(self.eps.iter().copied())
    }
}

/// Arena for allocating NFA states.
#[derive(Clone, Default)]
pub(crate) struct StateArena {
    states: Vec<NfaState>,
}

impl std::fmt::Debug for StateArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateArena")
            .field("states_count", &self.states.len())
            .finish()
    }
}

impl StateArena {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Allocate a new empty state, returning its ID.
    pub fn alloc(&mut self) -> StateId {
        let id = StateId::from_index(self.states.len());
        self.states.push(NfaState::default());
        id
    }

    pub fn alloc_with(&mut self, state: NfaState) -> StateId {
        let id = StateId::from_index(self.states.len());
        self.states.push(state);
        id
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// All states reachable from `roots`, in discovery order.
    pub fn reachable(&self, roots: &[StateId]) -> Vec<StateId> {
        let mut seen = StateSet::new(self.states.len());
        let mut order = Vec::new();
        let mut stack: Vec<StateId> = Vec::new();
        for &root in roots {
            if seen.insert(root) {
                order.push(root);
                stack.push(root);
            }
        }
        while let Some(id) = stack.pop() {
            for next in self[id].targets() {
                if seen.insert(next) {
                    order.push(next);
                    stack.push(next);
                }
            }
        }
        order
    }

    /// Of the given states, those from which `target` can be reached.
    pub fn co_reachable(&self, states: &[StateId], target: StateId) -> StateSet {
        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
        for &id in states {
            for next in self[id].targets() {
                reverse[next.index()].push(id);
            }
        }
        let mut alive = StateSet::new(self.states.len());
        let mut stack = vec![target];
        alive.insert(target);
        while let Some(id) = stack.pop() {
            for &prev in &reverse[id.index()] {
                if alive.insert(prev) {
                    stack.push(prev);
                }
            }
        }
        alive
    }
}

impl std::ops::Index<StateId> for StateArena {
    type Output = NfaState;

    #[inline]
    fn index(&self, id: StateId) -> &Self::Output {
        &self.states[id.index()]
    }
}

impl std::ops::IndexMut<StateId> for StateArena {
    #[inline]
    fn index_mut(&mut self, id: StateId) -> &mut Self::Output {
        &mut self.states[id.index()]
    }
}
