//! Automaton construction, compilation and matching.
//!
//! The pipeline, leaves first:
//!
//! - `intervals` and `char_trans`: character-range maps, staged and compiled
//! - `arena`: NFA states, epsilon edges and subgraph markers
//! - `nfa`: the `Nfa` builder and its operator algebra
//! - `compiler`: subset construction with action merging and clash reports
//! - `dfa`: the compiled automaton and the longest-match loop
//! - `submatch`: reporting-subgroup spans of a match
//! - `action` and `source`: what the matcher hands to, and reads from, its caller

mod action;
mod arena;
mod char_trans;
mod compiler;
mod dfa;
mod intervals;
mod nfa;
mod source;
mod state_set;
mod submatch;

pub use action::{
    action_key, merge_by_priority, Action, ActionError, ActionRef, Context, CopyMatch, DropMatch,
    Embed, Merge, Replace, Tag,
};
pub use arena::{StateId, MAX_SUBGROUPS};
pub use char_trans::{CharTrans, Transition};
pub use compiler::Clash;
pub(crate) use compiler::describe_clashes;
pub use dfa::{Dfa, FailPolicy, MatchResult};
pub use intervals::Intervals;
pub use nfa::{Config, Nfa};
pub use source::{CharSource, IterSource, StrSource};
pub use submatch::{Span, SubmatchData, Submatches};
