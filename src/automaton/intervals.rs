//! Staging partition of the character space.
//!
//! `Intervals` splits `0..=0x10FFFF` into maximal runs, each mapped to a value
//! or left unset. Transitions are written into it range by range, overlapping
//! writes split the runs they touch, and the finished partition is flattened
//! into the sorted, non-overlapping list a `CharTrans` is built from.
//!
//! Bounds are plain `u32` so that `hi + 1` never has to be a valid `char`;
//! the surrogate gap is squeezed out only when runs are turned back into
//! `char` ranges.

use super::arena::StateId;
use super::char_trans::{push_transition, Transition};

/// Largest scalar value.
pub const MAX_CODE: u32 = char::MAX as u32;

const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END: u32 = 0xDFFF;

/// Clamp a code-point run to the `char` range it covers, if any.
pub fn char_range(lo: u32, hi: u32) -> Option<(char, char)> {
    let lo = if (SURROGATE_START..=SURROGATE_END).contains(&lo) {
        SURROGATE_END + 1
    } else {
        lo
    };
    let hi = if (SURROGATE_START..=SURROGATE_END).contains(&hi) {
        SURROGATE_START - 1
    } else {
        hi
    };
    if lo > hi {
        return None;
    }
    Some((char::from_u32(lo)?, char::from_u32(hi)?))
}

/// Total partition of the character space into runs carrying an optional value.
#[derive(Clone, Debug)]
pub struct Intervals<V> {
    /// First code point of each run; `starts[0] == 0`, strictly increasing
    starts: Vec<u32>,
    values: Vec<Option<V>>,
}

impl<V: Clone> Default for Intervals<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Intervals<V> {
    /// One unset run covering everything.
    pub fn new() -> Self {
        Self {
            starts: vec![0],
            values: vec![None],
        }
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Make `at` the first code point of a run and return that run's index.
    fn split(&mut self, at: u32) -> usize {
        if at > MAX_CODE {
            return self.starts.len();
        }
        match self.starts.binary_search(&at) {
            Ok(pos) => pos,
            Err(pos) => {
                // `pos > 0` because starts[0] == 0 <= at
                let value = self.values[pos - 1].clone();
                self.starts.insert(pos, at);
                self.values.insert(pos, value);
                pos
            }
        }
    }

    /// Apply `f` to the value slot of every run inside `lo..=hi`.
    pub fn update(&mut self, lo: u32, hi: u32, mut f: impl FnMut(&mut Option<V>)) {
        if lo > hi {
            return;
        }
        let first = self.split(lo);
        let end = self.split(hi.saturating_add(1));
        for slot in &mut self.values[first..end] {
            f(slot);
        }
    }

    pub fn overwrite(&mut self, lo: u32, hi: u32, value: V) {
        self.update(lo, hi, |slot| *slot = Some(value.clone()));
    }

    /// Give every unset run the value `value`.
    pub fn fill_unset(&mut self, value: V) {
        for slot in self.values.iter_mut().filter(|v| v.is_none()) {
            *slot = Some(value.clone());
        }
    }

    /// Value at a single code point.
    pub fn get(&self, code: u32) -> Option<&V> {
        let pos = match self.starts.binary_search(&code) {
            Ok(pos) => pos,
            Err(pos) => pos - 1,
        };
        self.values[pos].as_ref()
    }

    /// Runs as `(lo, hi, value)`, unset ones included.
    pub fn runs(&self) -> impl Iterator<Item = (u32, u32, Option<&V>)> + '_ {
        self.starts.iter().enumerate().map(move |(i, &lo)| {
            let hi = self.starts.get(i + 1).map_or(MAX_CODE, |next| next - 1);
            (lo, hi, self.values[i].as_ref())
        })
    }
}

impl Intervals<StateId> {
    /// Flatten into transitions, dropping unset runs.
    pub fn to_transitions(&self) -> Vec<Transition> {
        let mut out = Vec::new();
        for (lo, hi, value) in self.runs() {
            let Some(&to) = value else { continue };
            if let Some((lo, hi)) = char_range(lo, hi) {
                push_transition(&mut out, Transition { lo, hi, to });
            }
        }
        out
    }

    /// Stage an existing transition list.
    pub fn from_transitions(trans: &[Transition]) -> Self {
        let mut iv = Self::new();
        for t in trans {
            iv.overwrite(t.lo as u32, t.hi as u32, t.to);
        }
        iv
    }
}
