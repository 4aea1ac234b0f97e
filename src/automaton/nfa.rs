//! NFA construction and the automaton algebra.
//!
//! An `Nfa` owns an arena of states plus a `(start, last)` pair. Every
//! operator keeps two things true:
//!
//! - `start` has no incoming edge
//! - `last` has no outgoing edge until an action makes it accepting
//!
//! Operators taking a second automaton take it by value; its states are
//! moved into this arena. Boundary states that carry nothing but epsilon
//! edges are spliced into their neighbour instead of costing an extra hop.
//!
//! The language operators (`invert`, `not`, `shortest`, `all_prefixes`)
//! compile the automaton, transform the DFA graph and convert it back. They
//! work on the recognized language only: actions and subgraph markers of the
//! operand do not survive them.

use std::fmt::Write as _;

use log::trace;

use super::action::ActionRef;
use super::arena::{NfaState, StateArena, StateId, SubgraphMarker, MAX_SUBGROUPS};
use super::char_trans::Transition;
use super::compiler::{self, ActionMode};
use super::dfa::{Dfa, DfaState, FailPolicy};
use super::intervals::{Intervals, MAX_CODE};
use crate::regexp::{self, NfaStack};
use crate::Error;

/// Construction settings, carried by every `Nfa` and inherited by its results.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// How much more memory a dense transition table may take than the
    /// sparse one before the sparse one is preferred.
    pub memory_for_speed: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_for_speed: 1.0,
        }
    }
}

/// A non-deterministic automaton under construction.
#[derive(Clone, Debug)]
pub struct Nfa {
    arena: StateArena,
    start: StateId,
    last: StateId,
    /// Next free id for unbound subgraph markers
    next_sub_id: u8,
    config: Config,
}

impl Default for Nfa {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl Nfa {
    /// The empty automaton, which matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        let mut arena = StateArena::new();
        let start = arena.alloc();
        let last = arena.alloc();
        Self {
            arena,
            start,
            last,
            next_sub_id: 0,
            config,
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn from_regex(re: &str) -> Result<Self, Error> {
        Self::from_regex_with(re, Config::default())
    }

    pub fn from_regex_with(re: &str, config: Config) -> Result<Self, Error> {
        let mut view = NfaStack::new(config);
        regexp::parse(re, &mut view)?;
        view.finish()
    }

    /// Parse `re` and attach `action` to it.
    pub fn with_action(re: &str, action: ActionRef) -> Result<Self, Error> {
        Ok(Self::from_regex(re)?.add_action(action))
    }

    /// One character out of `ranges`, or out of their complement if `invert`.
    pub fn char_set(ranges: &[(char, char)], invert: bool) -> Self {
        Self::char_set_with(ranges, invert, Config::default())
    }

    pub fn char_set_with(ranges: &[(char, char)], invert: bool, config: Config) -> Self {
        let mut nfa = Self::with_config(config);
        let mut iv = Intervals::new();
        for &(lo, hi) in ranges {
            iv.overwrite(lo as u32, hi as u32, nfa.last);
        }
        if invert {
            let mut inverse = Intervals::new();
            for (lo, hi, value) in iv.runs() {
                if value.is_none() {
                    inverse.overwrite(lo, hi, nfa.last);
                }
            }
            iv = inverse;
        }
        let start = nfa.start;
        nfa.arena[start].trans = iv.to_transitions();
        nfa
    }

    /// Any single character.
    pub fn any() -> Self {
        Self::any_with(Config::default())
    }

    pub fn any_with(config: Config) -> Self {
        let mut nfa = Self::with_config(config);
        let (start, last) = (nfa.start, nfa.last);
        nfa.arena[start]
            .trans
            .push(Transition::new('\0', char::MAX, last));
        nfa
    }

    /// Exactly the string `s`.
    pub fn literal(s: &str) -> Self {
        Self::literal_with(s, Config::default())
    }

    pub fn literal_with(s: &str, config: Config) -> Self {
        let mut nfa = Self::with_config(config);
        let mut chars = s.chars().peekable();
        let mut at = nfa.start;
        if chars.peek().is_none() {
            nfa.arena[at].eps.push(nfa.last);
            return nfa;
        }
        while let Some(c) = chars.next() {
            let to = if chars.peek().is_some() {
                nfa.arena.alloc()
            } else {
                nfa.last
            };
            nfa.arena[at].trans.push(Transition::new(c, c, to));
            at = to;
        }
        nfa
    }

    /// Number of states reachable from the start.
    pub fn state_count(&self) -> usize {
        self.arena.reachable(&[self.start]).len()
    }

    /// Deep copy restricted to the reachable states; actions are shared.
    pub fn copy(&self) -> Nfa {
        let mut nfa = Nfa {
            arena: StateArena::new(),
            start: StateId::NONE,
            last: StateId::NONE,
            next_sub_id: self.next_sub_id,
            config: self.config,
        };
        let (start, last) = nfa.absorb(self.clone(), 0);
        nfa.start = start;
        nfa.last = last;
        nfa
    }

    /// Move the states of `other` into this arena, returning its new boundary.
    fn absorb(&mut self, mut other: Nfa, id_offset: u8) -> (StateId, StateId) {
        let order = other.arena.reachable(&[other.start, other.last]);
        let mut map = vec![StateId::NONE; other.arena.len()];
        for &old in &order {
            map[old.index()] = self.arena.alloc();
        }
        for &old in &order {
            let mut state = std::mem::take(&mut other.arena[old]);
            for t in &mut state.trans {
                t.to = map[t.to.index()];
            }
            for e in &mut state.eps {
                *e = map[e.index()];
            }
            state.sub.shift_unbound(id_offset);
            self.arena[map[old.index()]] = state;
        }
        (map[other.start.index()], map[other.last.index()])
    }

    /// `absorb`, numbering `other`'s unbound subgraphs after ours.
    fn import(&mut self, other: Nfa) -> Result<(StateId, StateId), Error> {
        let offset = self.next_sub_id;
        let total = offset as usize + other.next_sub_id as usize;
        if total > MAX_SUBGROUPS {
            return Err(Error::TooManySubgroups);
        }
        let boundary = self.absorb(other, offset);
        self.next_sub_id = total as u8;
        Ok(boundary)
    }

    /// Connect `from` to `to`; `to` must have no incoming edges.
    fn join(&mut self, from: StateId, to: StateId) {
        if !self.arena[to].is_important() {
            let eps = std::mem::take(&mut self.arena[to].eps);
            self.arena[from].eps.extend(eps);
        } else if self.arena[from].is_bare() {
            let state = std::mem::take(&mut self.arena[to]);
            self.arena[from] = state;
        } else {
            self.arena[from].eps.push(to);
        }
    }

    /// A boundary state other paths may be routed through without picking
    /// up an action or a subgraph.
    fn is_neutral(&self, id: StateId) -> bool {
        let state = &self.arena[id];
        state.action.is_none() && state.sub.is_empty()
    }

    /// This automaton followed by `other`.
    pub fn seq(mut self, other: Nfa) -> Result<Nfa, Error> {
        let (start, last) = self.import(other)?;
        self.join(self.last, start);
        self.last = last;
        Ok(self)
    }

    /// Either this automaton or `other`.
    pub fn or(mut self, other: Nfa) -> Result<Nfa, Error> {
        let (ostart, olast) = self.import(other)?;

        if self.is_neutral(self.start) {
            self.join(self.start, ostart);
        } else {
            let start = self.arena.alloc();
            self.arena[start].eps.extend([self.start, ostart]);
            self.start = start;
        }

        // keep a last state that is not accepting so no action leaks onto
        // the other branch
        if self.is_neutral(self.last) {
            self.arena[olast].eps.push(self.last);
        } else if self.is_neutral(olast) {
            let last = self.last;
            self.arena[last].eps.push(olast);
            self.last = olast;
        } else {
            let last = self.arena.alloc();
            let old = self.last;
            self.arena[old].eps.push(last);
            self.arena[olast].eps.push(last);
            self.last = last;
        }
        Ok(self)
    }

    /// Wrap in fresh boundary states; `skip` adds the empty path.
    fn loop_back(mut self, skip: bool) -> Nfa {
        let start = self.arena.alloc();
        let last = self.arena.alloc();
        let (inner_start, inner_last) = (self.start, self.last);
        self.arena[start].eps.push(inner_start);
        if skip {
            self.arena[start].eps.push(last);
        }
        self.arena[inner_last].eps.extend([inner_start, last]);
        self.start = start;
        self.last = last;
        self
    }

    /// Zero or more repetitions.
    pub fn star(self) -> Nfa {
        self.loop_back(true)
    }

    /// One or more repetitions.
    pub fn plus(self) -> Nfa {
        self.loop_back(false)
    }

    /// Zero or one occurrence.
    pub fn optional(mut self) -> Nfa {
        let (start, last) = (self.start, self.last);
        self.arena[start].eps.push(last);
        self
    }

    /// Strings that do not contain a match anywhere.
    pub fn not(self) -> Result<Nfa, Error> {
        let config = self.config;
        Nfa::any_with(config)
            .star()
            .seq(self)?
            .seq(Nfa::any_with(config).star())?
            .optional()
            .invert()
    }

    /// The complement: strings this automaton does not match.
    pub fn invert(self) -> Result<Nfa, Error> {
        let mut graph = self.recognize()?;
        graph.complete_with_sink();
        graph.flip();
        graph.prune_dead();
        trace!("inverted automaton has {} states", graph.len());
        Ok(graph.into_nfa(self.config, true))
    }

    /// Stop at the first accepting state: input past a match no longer counts.
    pub fn shortest(self) -> Result<Nfa, Error> {
        let mut graph = self.recognize()?;
        graph.strip_accepting();
        graph.prune_dead();
        trace!("shortest-match automaton has {} states", graph.len());
        Ok(graph.into_nfa(self.config, true))
    }

    /// Every non-empty prefix of a matching string.
    pub fn all_prefixes(self) -> Result<Nfa, Error> {
        let mut graph = self.recognize()?;
        graph.prune_dead();
        graph.accept_reachable();
        trace!("prefix automaton has {} states", graph.len());
        Ok(graph.into_nfa(self.config, false))
    }

    /// Arm `fallback` on every non-empty proper prefix of a match that is
    /// not itself a match, so a filter never stalls on the tail of the input.
    pub fn complete_to_skip(self, fallback: ActionRef) -> Result<Nfa, Error> {
        // prefixes ∩ ¬self, as ¬(¬prefixes ∪ self)
        let not_prefixes = self.copy().all_prefixes()?.invert()?;
        let skip = not_prefixes
            .or(self.copy())?
            .invert()?
            .add_action(fallback);
        self.or(skip)
    }

    /// Mark everything between start and last as a reporting subgroup.
    pub fn mark_as_sub(mut self) -> Result<Nfa, Error> {
        if self.next_sub_id as usize >= MAX_SUBGROUPS {
            return Err(Error::TooManySubgroups);
        }
        let id = self.next_sub_id;
        self.next_sub_id += 1;

        let forward = self.arena.reachable(&[self.start]);
        let inside = self.arena.co_reachable(&forward, self.last);
        for &s in &forward {
            if !inside.contains(s) {
                continue;
            }
            let marker = if s == self.start {
                SubgraphMarker::start(id)
            } else if s == self.last {
                SubgraphMarker::stop(id)
            } else {
                SubgraphMarker::inner(id)
            };
            self.arena[s].sub.add(None, marker);
        }
        Ok(self)
    }

    /// Make the last state accepting with `action` and bind pending subgroups to it.
    pub fn add_action(mut self, action: ActionRef) -> Nfa {
        let last = self.last;
        self.arena[last].action = Some(action.clone());
        for id in self.arena.reachable(&[self.start]) {
            self.arena[id].sub.bind(&action);
        }
        self.next_sub_id = 0;
        self
    }

    /// `self | re` with `action` attached to `re`.
    pub fn or_regex(self, re: &str, action: ActionRef) -> Result<Nfa, Error> {
        let other = Nfa::from_regex_with(re, self.config)?.add_action(action);
        self.or(other)
    }

    /// `self` followed by `re`.
    pub fn seq_regex(self, re: &str) -> Result<Nfa, Error> {
        let other = Nfa::from_regex_with(re, self.config)?;
        self.seq(other)
    }

    pub fn compile(&self, fail_policy: FailPolicy) -> Result<Dfa, Error> {
        self.compile_with(fail_policy, None)
    }

    /// Compile to a `Dfa`; `eof_action` is stored for the runner to call at
    /// end of input.
    pub fn compile_with(
        &self,
        fail_policy: FailPolicy,
        eof_action: Option<ActionRef>,
    ) -> Result<Dfa, Error> {
        let states = compiler::compile(&self.arena, self.start, ActionMode::Resolve, &self.config)?;
        Ok(Dfa::from_states(states, fail_policy, eof_action))
    }

    fn recognize(&self) -> Result<Graph, Error> {
        let states = compiler::compile(
            &self.arena,
            self.start,
            ActionMode::Recognize { last: self.last },
            &self.config,
        )?;
        Ok(Graph::from_states(states))
    }

    /// Graphviz rendering, for debugging.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph nfa {\n  rankdir=LR;\n");
        for id in self.arena.reachable(&[self.start]) {
            let state: &NfaState = &self.arena[id];
            let shape = if state.action.is_some() {
                "doublecircle"
            } else if id == self.start || id == self.last {
                "box"
            } else {
                "circle"
            };
            let _ = writeln!(dot, "  n{} [shape={}];", id.index(), shape);
            for t in &state.trans {
                let _ = writeln!(
                    dot,
                    "  n{} -> n{} [label=\"{}\"];",
                    id.index(),
                    t.to.index(),
                    t.to_string().escape_default()
                );
            }
            for e in &state.eps {
                let _ = writeln!(dot, "  n{} -> n{} [style=dashed];", id.index(), e.index());
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Transitions and acceptance of a compiled automaton, for the language operators.
struct Graph {
    trans: Vec<Vec<Transition>>,
    accepting: Vec<bool>,
}

impl Graph {
    fn from_states(states: Vec<DfaState>) -> Self {
        let accepting = states.iter().map(|s| s.action.is_some()).collect();
        let trans = states.iter().map(|s| s.trans.transitions()).collect();
        Self { trans, accepting }
    }

    fn len(&self) -> usize {
        self.trans.len()
    }

    /// Send every undefined transition to a new, non-accepting sink.
    fn complete_with_sink(&mut self) {
        let sink = StateId::from_index(self.trans.len());
        for trans in &mut self.trans {
            let mut iv = Intervals::from_transitions(trans);
            iv.fill_unset(sink);
            *trans = iv.to_transitions();
        }
        let mut all = Intervals::new();
        all.overwrite(0, MAX_CODE, sink);
        self.trans.push(all.to_transitions());
        self.accepting.push(false);
    }

    fn flip(&mut self) {
        for a in &mut self.accepting {
            *a = !*a;
        }
    }

    fn strip_accepting(&mut self) {
        for (trans, &accepting) in self.trans.iter_mut().zip(&self.accepting) {
            if accepting {
                trans.clear();
            }
        }
    }

    /// Drop edges into states from which no accepting state is reachable.
    fn prune_dead(&mut self) {
        let n = self.trans.len();
        let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (from, trans) in self.trans.iter().enumerate() {
            for t in trans {
                reverse[t.to.index()].push(from);
            }
        }
        let mut alive = self.accepting.clone();
        let mut stack: Vec<usize> = (0..n).filter(|&i| alive[i]).collect();
        while let Some(i) = stack.pop() {
            for &prev in &reverse[i] {
                if !alive[prev] {
                    alive[prev] = true;
                    stack.push(prev);
                }
            }
        }
        for trans in &mut self.trans {
            trans.retain(|t| alive[t.to.index()]);
        }
    }

    /// Make every state reachable from the start accepting.
    fn accept_reachable(&mut self) {
        let mut seen = vec![false; self.trans.len()];
        let mut stack = vec![0usize];
        seen[0] = true;
        while let Some(i) = stack.pop() {
            self.accepting[i] = true;
            for t in &self.trans[i] {
                if !seen[t.to.index()] {
                    seen[t.to.index()] = true;
                    stack.push(t.to.index());
                }
            }
        }
    }

    /// Rebuild an `Nfa`; with `allow_empty` false the empty string is not accepted.
    fn into_nfa(self, config: Config, allow_empty: bool) -> Nfa {
        let mut arena = StateArena::new();
        for trans in &self.trans {
            arena.alloc_with(NfaState {
                trans: trans.clone(),
                ..NfaState::default()
            });
        }
        let start = arena.alloc();
        let last = arena.alloc();
        for (i, &accepting) in self.accepting.iter().enumerate() {
            if accepting {
                arena[StateId::from_index(i)].eps.push(last);
            }
        }
        let entry = StateId::from_index(0);
        if allow_empty {
            arena[start].eps.push(entry);
        } else {
            arena[start].trans = self.trans[0].clone();
        }
        Nfa {
            arena,
            start,
            last,
            next_sub_id: 0,
            config,
        }
    }
}
