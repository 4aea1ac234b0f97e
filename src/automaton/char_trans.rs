//! Immutable character-to-state transition tables.
//!
//! A `CharTrans` maps sorted, non-overlapping character ranges to target
//! states. Four representations trade memory for lookup speed:
//!
//! - `Single`: one character
//! - `Range`: one range
//! - `Sparse`: binary search over the ranges
//! - `Dense`: direct index from the first to the last covered character
//!
//! `CharTrans::build` picks between sparse and dense by comparing estimated
//! footprints, with the dense one discounted by the caller's
//! memory-for-speed factor.

use std::fmt;

use super::arena::StateId;
use super::intervals::char_range;

/// A character range `lo..=hi` leading to `to`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
    pub lo: char,
    pub hi: char,
    pub to: StateId,
}

impl Transition {
    pub fn new(lo: char, hi: char, to: StateId) -> Self {
        Self { lo, hi, to }
    }

    #[inline]
    pub fn contains(&self, ch: char) -> bool {
        self.lo <= ch && ch <= self.hi
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo.escape_debug())
        } else {
            write!(f, "[{}-{}]", self.lo.escape_debug(), self.hi.escape_debug())
        }
    }
}

/// Append `t` to a sorted list, extending the last entry when `t` continues it.
pub(crate) fn push_transition(list: &mut Vec<Transition>, t: Transition) {
    if let Some(last) = list.last_mut() {
        if last.to == t.to && is_adjacent(last.hi, t.lo) {
            last.hi = t.hi;
            return;
        }
    }
    list.push(t);
}

/// True if no `char` lies strictly between `hi` and `lo`.
fn is_adjacent(hi: char, lo: char) -> bool {
    let next = hi as u32 + 1;
    next == lo as u32 || (next == 0xD800 && lo == '\u{E000}')
}

/// Transition table of a compiled state.
#[derive(Clone, Debug, Default)]
pub enum CharTrans {
    #[default]
    Empty,
    Single {
        ch: char,
        to: StateId,
    },
    Range(Transition),
    Sparse(Box<[Transition]>),
    Dense {
        first: u32,
        /// `StateId::NONE` where there is no transition
        table: Box<[StateId]>,
    },
}

impl CharTrans {
    /// Build the table for a sorted, non-overlapping transition list.
    ///
    /// A `memory_for_speed` above 1.0 accepts proportionally larger dense
    /// tables; below 1.0 favours the sparse form.
    pub fn build(trans: Vec<Transition>, memory_for_speed: f32) -> Self {
        match trans.as_slice() {
            [] => CharTrans::Empty,
            [t] if t.lo == t.hi => CharTrans::Single { ch: t.lo, to: t.to },
            [t] => CharTrans::Range(*t),
            [first, .., last] => {
                let span = (last.hi as u32 - first.lo as u32) as usize + 1;
                let dense_bytes = span * std::mem::size_of::<StateId>();
                let sparse_bytes = trans.len() * std::mem::size_of::<Transition>();
                if (dense_bytes as f64) <= (sparse_bytes as f64) * f64::from(memory_for_speed) {
                    let base = first.lo as u32;
                    let mut table = vec![StateId::NONE; span];
                    for t in &trans {
                        for code in t.lo as u32..=t.hi as u32 {
                            table[(code - base) as usize] = t.to;
                        }
                    }
                    CharTrans::Dense {
                        first: base,
                        table: table.into_boxed_slice(),
                    }
                } else {
                    CharTrans::Sparse(trans.into_boxed_slice())
                }
            }
        }
    }

    /// Target state for `ch`, if any.
    #[inline]
    pub fn get(&self, ch: char) -> Option<StateId> {
        match self {
            CharTrans::Empty => None,
            CharTrans::Single { ch: c, to } => (*c == ch).then_some(*to),
            CharTrans::Range(t) => t.contains(ch).then_some(t.to),
            CharTrans::Sparse(trans) => trans
                .binary_search_by(|t| {
                    if t.hi < ch {
                        std::cmp::Ordering::Less
                    } else if t.lo > ch {
                        std::cmp::Ordering::Greater
                    } else {
                        std::cmp::Ordering::Equal
                    }
                })
                .ok()
                .map(|i| trans[i].to),
            CharTrans::Dense { first, table } => {
                let idx = (ch as u32).checked_sub(*first)? as usize;
                table.get(idx).copied().filter(|id| !id.is_none())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CharTrans::Empty)
    }

    /// The table as a sorted range list.
    pub fn transitions(&self) -> Vec<Transition> {
        match self {
            CharTrans::Empty => Vec::new(),
            CharTrans::Single { ch, to } => vec![Transition::new(*ch, *ch, *to)],
            CharTrans::Range(t) => vec![*t],
            CharTrans::Sparse(trans) => trans.to_vec(),
            CharTrans::Dense { first, table } => {
                let mut out = Vec::new();
                let mut run_start = 0usize;
                for i in 1..=table.len() {
                    if i < table.len() && table[i] == table[run_start] {
                        continue;
                    }
                    let to = table[run_start];
                    let lo = first + run_start as u32;
                    let hi = first + i as u32 - 1;
                    if !to.is_none() {
                        if let Some((lo, hi)) = char_range(lo, hi) {
                            push_transition(&mut out, Transition::new(lo, hi, to));
                        }
                    }
                    run_start = i;
                }
                out
            }
        }
    }

    /// Short name of the representation, for logs and dot output.
    pub fn kind(&self) -> &'static str {
        match self {
            CharTrans::Empty => "empty",
            CharTrans::Single { .. } => "single",
            CharTrans::Range(_) => "range",
            CharTrans::Sparse(_) => "sparse",
            CharTrans::Dense { .. } => "dense",
        }
    }
}
