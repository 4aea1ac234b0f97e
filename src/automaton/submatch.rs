//! Reconstruction of reporting-subgroup spans after a match.
//!
//! While matching, `SubmatchData` records the DFA state reached at every
//! position. Afterwards the subgraph markers of the winning action are
//! merge-walked, position by position, against the spans still open:
//!
//! - a marker for an open span with the inner role extends it to the current
//!   position, and the stop role additionally finalizes it
//! - a start marker for an open span flushes it if finalized and reopens it here
//! - an open span without a marker has ended and is flushed if finalized
//! - a start marker with no open span opens one
//!
//! A subgroup inside a repetition can therefore yield several spans, reported
//! left to right.

use super::action::ActionRef;
use super::arena::StateId;
use super::dfa::Dfa;

/// One reported subgroup occurrence, as byte offsets into the output buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Subgroup number, counting from 0 in the order groups were marked
    pub id: u8,
}

/// Subgroup spans of the last match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submatches {
    spans: Vec<Span>,
}

impl Submatches {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Span> {
        self.spans.get(i).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().copied()
    }

    /// All spans of subgroup `id`.
    pub fn by_id(&self, id: u8) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().copied().filter(move |s| s.id == id)
    }

    /// Text of the `i`-th span within `out`.
    pub fn text<'a>(&self, out: &'a str, i: usize) -> Option<&'a str> {
        let span = self.spans.get(i)?;
        out.get(span.start..span.end)
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenSpan {
    id: u8,
    start: usize,
    end: usize,
    finalized: bool,
}

/// Scratch space for one match at a time.
///
/// Reuse one instance across matches; never share it between concurrent ones.
#[derive(Debug, Default)]
pub struct SubmatchData {
    states: Vec<StateId>,
    offsets: Vec<usize>,
    open: Vec<OpenSpan>,
    results: Submatches,
}

impl SubmatchData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans of the most recent successful match.
    pub fn submatches(&self) -> &Submatches {
        &self.results
    }

    pub(crate) fn reset(&mut self) {
        self.states.clear();
        self.offsets.clear();
        self.open.clear();
        self.results.spans.clear();
    }

    #[inline]
    pub(crate) fn record(&mut self, state: StateId, offset: usize) {
        self.states.push(state);
        self.offsets.push(offset);
    }

    /// Rebuild the spans for `action` from the first `positions` records.
    pub(crate) fn analyze(&mut self, dfa: &Dfa, action: &ActionRef, positions: usize) {
        self.states.truncate(positions);
        self.offsets.truncate(positions);
        self.results.spans.clear();
        self.open.clear();

        if self
            .states
            .iter()
            .all(|s| dfa.states()[s.index()].sub.is_empty())
        {
            return;
        }

        let mut next_open: Vec<OpenSpan> = Vec::new();
        for (pos, &state) in self.states.iter().enumerate() {
            let offset = self.offsets[pos];
            let markers = dfa.markers_for(state, action);
            next_open.clear();

            let (mut i, mut j) = (0, 0);
            while i < self.open.len() || j < markers.len() {
                let open = self.open.get(i);
                let marker = markers.get(j);
                match (open, marker) {
                    (Some(span), Some(m)) if span.id == m.id => {
                        let mut span = *span;
                        if m.inner {
                            span.end = offset;
                            span.finalized |= m.stop;
                        }
                        if m.start {
                            if span.finalized {
                                flush(&mut self.results, &span);
                            }
                            span = OpenSpan {
                                id: m.id,
                                start: offset,
                                end: offset,
                                finalized: false,
                            };
                        }
                        next_open.push(span);
                        i += 1;
                        j += 1;
                    }
                    (Some(span), m) if m.map_or(true, |m| span.id < m.id) => {
                        if span.finalized {
                            flush(&mut self.results, span);
                        }
                        i += 1;
                    }
                    (_, Some(m)) => {
                        if m.start {
                            next_open.push(OpenSpan {
                                id: m.id,
                                start: offset,
                                end: offset,
                                finalized: m.stop,
                            });
                        }
                        j += 1;
                    }
                    _ => break,
                }
            }
            std::mem::swap(&mut self.open, &mut next_open);
        }

        for span in &self.open {
            if span.finalized {
                flush(&mut self.results, span);
            }
        }
        self.open.clear();
    }
}

fn flush(results: &mut Submatches, span: &OpenSpan) {
    results.spans.push(Span {
        start: span.start,
        end: span.end,
        id: span.id,
    });
}
