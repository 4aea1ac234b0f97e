//! lexfa: a regex-to-DFA compiler and longest-match engine for text filters.
//!
//! Patterns are parsed into NFAs, combined with an operator algebra
//! (alternation, sequence, complement, prefix closure and more), compiled by
//! subset construction and run over a character source one longest match at
//! a time. Each pattern carries an [`Action`]; overlapping patterns are
//! resolved at compile time, and every unresolved overlap is reported at once.
//!
//! ```
//! use std::sync::Arc;
//! use lexfa::{FailPolicy, MatchResult, Nfa, StrSource, Tag};
//!
//! let word = Arc::new(Tag::new("word"));
//! let number = Arc::new(Tag::new("number"));
//! let dfa = Nfa::with_action("[a-z]+", word)
//!     .unwrap()
//!     .or_regex("[0-9]+", number)
//!     .unwrap()
//!     .compile(FailPolicy::Copy)
//!     .unwrap();
//!
//! let mut src = StrSource::from("abc42");
//! let mut out = String::new();
//! let result = dfa.match_next(&mut src, &mut out, None).unwrap();
//! assert!(matches!(result, MatchResult::Matched(_)));
//! assert_eq!(out, "abc");
//! ```

pub mod automaton;
pub mod regexp;

use automaton::describe_clashes;

pub use automaton::{
    Action, ActionError, ActionRef, CharSource, Clash, Config, Context, CopyMatch, Dfa, DropMatch,
    Embed, FailPolicy, IterSource, MatchResult, Merge, Nfa, Replace, Span, StrSource,
    SubmatchData, Submatches, Tag, MAX_SUBGROUPS,
};
pub use regexp::{ParseError, ParseErrorKind};

/// Errors from building, compiling or running an automaton.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid pattern: {0}")]
    Parse(#[from] ParseError),

    /// Every pair of actions that could not be merged.
    #[error("{}", describe_clashes(.0))]
    Ambiguous(Vec<Clash>),

    #[error("more than {} reporting subgroups for one action", MAX_SUBGROUPS)]
    TooManySubgroups,

    /// An operation was applied to a builder in the wrong state.
    #[error("builder misuse: {0}")]
    Misuse(&'static str),

    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),
}
