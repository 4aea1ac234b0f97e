//! Subset construction: NFA arena to DFA state graph.
//!
//! DFA states are identified by the sorted set of *important* NFA states in
//! an epsilon closure; pure epsilon hops never distinguish two DFA states.
//! The work-list is processed in creation order, so state 0 is the start.
//!
//! Actions meeting in one DFA state are resolved with `Action::merge_with`.
//! Conflicts do not stop the construction: every clash is collected, and the
//! whole list is reported once the graph is complete, each with the shortest
//! input leading to it.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::action::{action_key, Accept, ActionRef, Merge};
use super::arena::{StateArena, StateId};
use super::char_trans::{push_transition, CharTrans, Transition};
use super::dfa::DfaState;
use super::intervals::{char_range, Intervals};
use super::nfa::Config;
use super::state_set::StateSet;
use crate::Error;

/// How actions on NFA states turn into DFA state actions.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ActionMode {
    /// Keep the real actions, resolving overlaps with `merge_with`.
    Resolve,
    /// Only record acceptance; `last` counts as accepting even without an action.
    Recognize { last: StateId },
}

/// Two actions that could not be merged, with an input reaching both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clash {
    pub actions: (String, String),
    /// Shortest input, as a sequence of characters and character ranges
    pub path: String,
}

impl fmt::Display for Clash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} both match \"{}\"",
            self.actions.0, self.actions.1, self.path
        )
    }
}

pub(crate) fn describe_clashes(clashes: &[Clash]) -> String {
    let mut msg = format!("ambiguous automaton, {} unresolved action clash(es)", clashes.len());
    for clash in clashes {
        msg.push_str("\n  ");
        msg.push_str(&clash.to_string());
    }
    msg
}

struct PendingClash {
    state: usize,
    first: ActionRef,
    second: ActionRef,
}

/// Epsilon closure with reusable scratch space.
struct Closure<'a> {
    arena: &'a StateArena,
    accept: StateId,
    seen: StateSet,
    stack: Vec<StateId>,
}

impl<'a> Closure<'a> {
    fn new(arena: &'a StateArena, accept: StateId) -> Self {
        Self {
            arena,
            accept,
            seen: StateSet::new(arena.len()),
            stack: Vec::with_capacity(16),
        }
    }

    /// Sorted important states reachable from `seeds` over epsilon edges.
    fn of(&mut self, seeds: &[StateId]) -> Vec<StateId> {
        self.seen.clear();
        self.stack.clear();
        for &seed in seeds {
            if self.seen.insert(seed) {
                self.stack.push(seed);
            }
        }
        while let Some(id) = self.stack.pop() {
            for &next in &self.arena[id].eps {
                if self.seen.insert(next) {
                    self.stack.push(next);
                }
            }
        }
        let mut set: Vec<StateId> = self
            .seen
            .iter()
            .filter(|&id| id == self.accept || self.arena[id].is_important())
            .collect();
        set.sort_unstable();
        set
    }
}

/// Run the subset construction from `start`.
///
/// If no DFA state ends up with an action, the single-state automaton that
/// matches nothing is returned instead of the graph.
pub(crate) fn compile(
    arena: &StateArena,
    start: StateId,
    mode: ActionMode,
    config: &Config,
) -> Result<Vec<DfaState>, Error> {
    let accept = match mode {
        ActionMode::Recognize { last } => last,
        ActionMode::Resolve => StateId::NONE,
    };
    let accepted: ActionRef = Arc::new(Accept);
    let mut closure = Closure::new(arena, accept);
    let mut known: FxHashMap<Vec<StateId>, StateId> = FxHashMap::default();
    let mut sets: Vec<Vec<StateId>> = Vec::new();
    let mut states: Vec<DfaState> = Vec::new();
    let mut clashes: Vec<PendingClash> = Vec::new();

    let first = closure.of(&[start]);
    known.insert(first.clone(), StateId::from_index(0));
    sets.push(first);

    let mut next = 0;
    while next < sets.len() {
        let members = std::mem::take(&mut sets[next]);
        let mut state = DfaState::default();

        match mode {
            ActionMode::Resolve => {
                state.action = resolve_actions(arena, &members, next, &mut clashes);
                for &m in &members {
                    state.sub.merge_bound(&arena[m].sub);
                }
            }
            ActionMode::Recognize { last } => {
                if members
                    .iter()
                    .any(|&m| m == last || arena[m].action.is_some())
                {
                    state.action = Some(accepted.clone());
                }
            }
        }

        let mut targets: Intervals<SmallVec<[StateId; 4]>> = Intervals::new();
        for &m in &members {
            for t in &arena[m].trans {
                targets.update(t.lo as u32, t.hi as u32, |slot| {
                    let dests = slot.get_or_insert_with(SmallVec::new);
                    if !dests.contains(&t.to) {
                        dests.push(t.to);
                    }
                });
            }
        }

        let mut trans = Vec::new();
        for (lo, hi, dests) in targets.runs() {
            let Some(dests) = dests else { continue };
            let Some((lo, hi)) = char_range(lo, hi) else { continue };
            let set = closure.of(dests);
            if set.is_empty() {
                continue;
            }
            let to = match known.get(&set) {
                Some(&id) => id,
                None => {
                    let id = StateId::from_index(sets.len());
                    known.insert(set.clone(), id);
                    sets.push(set);
                    id
                }
            };
            push_transition(&mut trans, Transition::new(lo, hi, to));
        }
        trace!(
            "dfa state {} from {} nfa states, {} transitions",
            next,
            members.len(),
            trans.len()
        );
        state.trans = CharTrans::build(trans, config.memory_for_speed);
        states.push(state);
        next += 1;
    }

    if !clashes.is_empty() {
        return Err(Error::Ambiguous(report_clashes(&states, clashes)));
    }

    if states.iter().all(|s| s.action.is_none()) {
        debug!(
            "no accepting state among {} dfa states, using the empty automaton",
            states.len()
        );
        return Ok(vec![DfaState::default()]);
    }

    if log::log_enabled!(log::Level::Debug) {
        let mut kinds: FxHashMap<&'static str, usize> = FxHashMap::default();
        for s in &states {
            *kinds.entry(s.trans.kind()).or_default() += 1;
        }
        debug!(
            "compiled {} nfa states into {} dfa states, tables {:?}",
            arena.len(),
            states.len(),
            kinds
        );
    }
    Ok(states)
}

/// Fold the distinct actions of a state set into one.
fn resolve_actions(
    arena: &StateArena,
    members: &[StateId],
    state: usize,
    clashes: &mut Vec<PendingClash>,
) -> Option<ActionRef> {
    let mut distinct: SmallVec<[ActionRef; 2]> = SmallVec::new();
    for &m in members {
        if let Some(a) = &arena[m].action {
            if !distinct.iter().any(|d| action_key(d) == action_key(a)) {
                distinct.push(a.clone());
            }
        }
    }

    // highest priority first, so a dominating action wins regardless of insertion order
    distinct.sort_by_key(|a| std::cmp::Reverse(a.priority()));
    let mut iter = distinct.into_iter();
    let mut acc = iter.next()?;
    for other in iter {
        match acc.merge_with(other.as_ref()) {
            Merge::KeepSelf => {}
            Merge::KeepOther => acc = other,
            Merge::Combined(merged) => acc = merged,
            Merge::Clash => clashes.push(PendingClash {
                state,
                first: acc.clone(),
                second: other,
            }),
        }
    }
    Some(acc)
}

/// One clash per action pair, each with the shortest path to a state where it occurs.
fn report_clashes(states: &[DfaState], pending: Vec<PendingClash>) -> Vec<Clash> {
    // breadth-first search gives shortest paths and depths
    let mut parent: Vec<Option<(usize, Transition)>> = vec![None; states.len()];
    let mut depth: Vec<usize> = vec![usize::MAX; states.len()];
    let mut queue = std::collections::VecDeque::new();
    depth[0] = 0;
    queue.push_back(0usize);
    while let Some(d) = queue.pop_front() {
        for t in states[d].trans.transitions() {
            let to = t.to.index();
            if depth[to] == usize::MAX {
                depth[to] = depth[d] + 1;
                parent[to] = Some((d, t));
                queue.push_back(to);
            }
        }
    }

    let mut best: FxHashMap<(usize, usize), PendingClash> = FxHashMap::default();
    let mut order: Vec<(usize, usize)> = Vec::new();
    for clash in pending {
        let (a, b) = (action_key(&clash.first), action_key(&clash.second));
        let pair = (a.min(b), a.max(b));
        match best.get(&pair) {
            Some(seen) if depth[seen.state] <= depth[clash.state] => {}
            Some(_) => {
                best.insert(pair, clash);
            }
            None => {
                order.push(pair);
                best.insert(pair, clash);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|pair| best.remove(&pair))
        .map(|clash| {
            let mut steps = Vec::new();
            let mut at = clash.state;
            while let Some((from, t)) = parent[at] {
                steps.push(t.to_string());
                at = from;
            }
            steps.reverse();
            Clash {
                actions: (format!("{:?}", clash.first), format!("{:?}", clash.second)),
                path: steps.concat(),
            }
        })
        .collect()
}
