//! Compiled automata and the longest-match loop.
//!
//! A `Dfa` is immutable once built. Matching reads one character per
//! transition, remembers the last accepting position, and hands everything
//! read beyond it back to the character source.

use std::fmt::Write as _;

use smallvec::SmallVec;

use super::action::{action_key, ActionRef};
use super::arena::{insert_marker, Markers, StateId, SubInfo};
use super::char_trans::CharTrans;
use super::source::{CharSource, StrSource};
use super::submatch::SubmatchData;
use crate::Error;

/// What the streaming runner should do with input no pattern matches.
///
/// The engine only stores this value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailPolicy {
    /// Copy the unmatched character to the output.
    #[default]
    Copy,
    /// Discard the unmatched character.
    Drop,
    /// Report an error.
    Raise,
}

/// A state of a compiled automaton.
#[derive(Clone, Default, Debug)]
pub(crate) struct DfaState {
    pub trans: CharTrans,
    pub action: Option<ActionRef>,
    pub sub: SubInfo,
}

/// Result of one `Dfa::match_next` call.
#[derive(Clone, Debug)]
pub enum MatchResult {
    /// The longest match ended in a state carrying this action.
    Matched(ActionRef),
    /// No accepting state was crossed; nothing was consumed.
    NoMatch,
    /// The source was already exhausted.
    Eof,
}

impl MatchResult {
    pub fn action(&self) -> Option<&ActionRef> {
        match self {
            MatchResult::Matched(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, MatchResult::Eof)
    }
}

/// A deterministic automaton ready for matching.
///
/// `Dfa` is `Send + Sync` and can be shared read-only between threads as
/// long as the attached actions tolerate it.
#[derive(Clone, Debug)]
pub struct Dfa {
    states: Vec<DfaState>,
    start: StateId,
    eof_action: Option<ActionRef>,
    fail_policy: FailPolicy,
    has_submarkers: bool,
}

impl Dfa {
    pub(crate) fn from_states(
        states: Vec<DfaState>,
        fail_policy: FailPolicy,
        eof_action: Option<ActionRef>,
    ) -> Self {
        let has_submarkers = states.iter().any(|s| !s.sub.is_empty());
        Self {
            states,
            start: StateId::from_index(0),
            eof_action,
            fail_policy,
            has_submarkers,
        }
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn fail_policy(&self) -> FailPolicy {
        self.fail_policy
    }

    /// Action the runner should invoke once the input is exhausted.
    pub fn eof_action(&self) -> Option<&ActionRef> {
        self.eof_action.as_ref()
    }

    /// True if the start state accepts, i.e. the empty string is matched.
    pub fn matches_empty(&self) -> bool {
        self.states[self.start.index()].action.is_some()
    }

    /// True if nothing can ever be matched.
    pub fn is_empty(&self) -> bool {
        self.states.iter().all(|s| s.action.is_none())
    }

    pub(crate) fn states(&self) -> &[DfaState] {
        &self.states
    }

    /// True if any reporting subgroup survived compilation.
    pub fn has_submarkers(&self) -> bool {
        self.has_submarkers
    }

    /// Markers recorded for `action` (and the actions it was merged from) on `state`.
    pub(crate) fn markers_for(&self, state: StateId, action: &ActionRef) -> Markers {
        let sub = &self.states[state.index()].sub;
        let mut out = sub.markers(action_key(action)).cloned().unwrap_or_default();
        for part in action.constituents() {
            if let Some(markers) = sub.markers(action_key(part)) {
                for m in markers {
                    insert_marker(&mut out, *m);
                }
            }
        }
        out
    }

    /// Find the longest match at the current position of `src`.
    ///
    /// Characters read are appended to `out`; on return `out` holds exactly
    /// the matched text after its previous length, and everything read
    /// beyond it has been pushed back into `src`.
    pub fn match_next<S: CharSource + ?Sized>(
        &self,
        src: &mut S,
        out: &mut String,
        submatches: Option<&mut SubmatchData>,
    ) -> Result<MatchResult, Error> {
        self.match_limited(src, out, submatches, usize::MAX)
    }

    /// Like `match_next`, but consume at most `max_len` characters.
    pub fn match_limited<S: CharSource + ?Sized>(
        &self,
        src: &mut S,
        out: &mut String,
        mut submatches: Option<&mut SubmatchData>,
        max_len: usize,
    ) -> Result<MatchResult, Error> {
        let start_len = out.len();
        let mut state = self.start;
        let mut last_action = self.states[state.index()].action.clone();
        let mut last_len = start_len;
        let mut last_pos = 0;
        let mut consumed = 0;
        let mut hit_eof = false;

        let track = self.has_submarkers;
        if let Some(sd) = submatches.as_deref_mut() {
            sd.reset();
            if track {
                sd.record(state, start_len);
            }
        }

        while consumed < max_len {
            let Some(ch) = src.read()? else {
                hit_eof = true;
                break;
            };
            out.push(ch);
            let Some(next) = self.states[state.index()].trans.get(ch) else {
                break;
            };
            state = next;
            consumed += 1;
            if track {
                if let Some(sd) = submatches.as_deref_mut() {
                    sd.record(state, out.len());
                }
            }
            if let Some(action) = &self.states[state.index()].action {
                last_action = Some(action.clone());
                last_len = out.len();
                last_pos = consumed;
            }
        }

        if consumed == 0 && hit_eof {
            return Ok(MatchResult::Eof);
        }
        if out.len() > last_len {
            src.push_back(out, last_len);
        }

        match last_action {
            Some(action) => {
                if let Some(sd) = submatches {
                    if track {
                        sd.analyze(self, &action, last_pos + 1);
                    }
                }
                Ok(MatchResult::Matched(action))
            }
            None => Ok(MatchResult::NoMatch),
        }
    }

    /// Longest match at the start of `text`: the action and the matched length in bytes.
    pub fn find_prefix(&self, text: &str) -> Option<(ActionRef, usize)> {
        if text.is_empty() {
            return self.states[self.start.index()]
                .action
                .clone()
                .map(|a| (a, 0));
        }
        let mut src = StrSource::from(text);
        let mut out = String::new();
        match self.match_next(&mut src, &mut out, None) {
            Ok(MatchResult::Matched(action)) => Some((action, out.len())),
            _ => None,
        }
    }

    /// The action for `text` if the whole of it is matched.
    pub fn matches(&self, text: &str) -> Option<ActionRef> {
        match self.find_prefix(text) {
            Some((action, len)) if len == text.len() => Some(action),
            _ => None,
        }
    }

    /// Graphviz rendering, for debugging.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph dfa {\n  rankdir=LR;\n");
        for (i, s) in self.states.iter().enumerate() {
            let shape = if s.action.is_some() {
                "doublecircle"
            } else {
                "circle"
            };
            let _ = writeln!(dot, "  s{} [shape={}, label=\"{}\"];", i, shape, i);
            let mut edges: SmallVec<[(usize, String); 4]> = SmallVec::new();
            for t in s.trans.transitions() {
                match edges.iter_mut().find(|(to, _)| *to == t.to.index()) {
                    Some((_, label)) => label.push_str(&t.to_string()),
                    None => edges.push((t.to.index(), t.to_string())),
                }
            }
            for (to, label) in edges {
                let _ = writeln!(
                    dot,
                    "  s{} -> s{} [label=\"{}\"];",
                    i,
                    to,
                    label.escape_default()
                );
            }
        }
        dot.push_str("}\n");
        dot
    }
}
