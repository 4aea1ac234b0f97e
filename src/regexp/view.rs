//! Receivers for the parser's build calls.

use std::fmt::Write as _;

use crate::automaton::{Config, Nfa};
use crate::Error;

/// Stack machine the parser drives.
///
/// `push_*` add an operand. Unary operators replace the top operand, binary
/// ones pop the right operand, then the left one, and push the result.
pub trait NfaParserView {
    fn push_char_set(&mut self, ranges: &[(char, char)], invert: bool) -> Result<(), Error>;
    fn push_dot(&mut self) -> Result<(), Error>;
    fn push_string(&mut self, s: &str) -> Result<(), Error>;
    /// Exchange the two topmost operands.
    fn swap(&mut self) -> Result<(), Error>;
    /// Push a copy of the top operand.
    fn dup(&mut self) -> Result<(), Error>;
    fn or(&mut self) -> Result<(), Error>;
    fn seq(&mut self) -> Result<(), Error>;
    fn star(&mut self) -> Result<(), Error>;
    fn plus(&mut self) -> Result<(), Error>;
    fn optional(&mut self) -> Result<(), Error>;
    fn not(&mut self) -> Result<(), Error>;
    fn invert(&mut self) -> Result<(), Error>;
    fn shortest(&mut self) -> Result<(), Error>;
    fn all_prefixes(&mut self) -> Result<(), Error>;
    fn mark_as_sub(&mut self) -> Result<(), Error>;
}

/// Builds automata.
#[derive(Debug, Default)]
pub struct NfaStack {
    stack: Vec<Nfa>,
    config: Config,
}

impl NfaStack {
    pub fn new(config: Config) -> Self {
        Self {
            stack: Vec::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// The single automaton left after parsing one pattern.
    pub fn finish(mut self) -> Result<Nfa, Error> {
        if self.stack.len() != 1 {
            return Err(Error::Misuse("builder stack must hold exactly one automaton"));
        }
        self.pop()
    }

    fn pop(&mut self) -> Result<Nfa, Error> {
        self.stack
            .pop()
            .ok_or(Error::Misuse("builder stack underflow"))
    }

    fn unary(&mut self, op: impl FnOnce(Nfa) -> Result<Nfa, Error>) -> Result<(), Error> {
        let top = self.pop()?;
        self.stack.push(op(top)?);
        Ok(())
    }

    fn binary(&mut self, op: impl FnOnce(Nfa, Nfa) -> Result<Nfa, Error>) -> Result<(), Error> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.stack.push(op(left, right)?);
        Ok(())
    }
}

impl NfaParserView for NfaStack {
    fn push_char_set(&mut self, ranges: &[(char, char)], invert: bool) -> Result<(), Error> {
        self.stack
            .push(Nfa::char_set_with(ranges, invert, self.config));
        Ok(())
    }

    fn push_dot(&mut self) -> Result<(), Error> {
        self.stack.push(Nfa::any_with(self.config));
        Ok(())
    }

    fn push_string(&mut self, s: &str) -> Result<(), Error> {
        self.stack.push(Nfa::literal_with(s, self.config));
        Ok(())
    }

    fn swap(&mut self) -> Result<(), Error> {
        let n = self.stack.len();
        if n < 2 {
            return Err(Error::Misuse("builder stack underflow"));
        }
        self.stack.swap(n - 1, n - 2);
        Ok(())
    }

    fn dup(&mut self) -> Result<(), Error> {
        let top = self
            .stack
            .last()
            .ok_or(Error::Misuse("builder stack underflow"))?
            .copy();
        self.stack.push(top);
        Ok(())
    }

    fn or(&mut self) -> Result<(), Error> {
        self.binary(Nfa::or)
    }

    fn seq(&mut self) -> Result<(), Error> {
        self.binary(Nfa::seq)
    }

    fn star(&mut self) -> Result<(), Error> {
        self.unary(|n| Ok(n.star()))
    }

    fn plus(&mut self) -> Result<(), Error> {
        self.unary(|n| Ok(n.plus()))
    }

    fn optional(&mut self) -> Result<(), Error> {
        self.unary(|n| Ok(n.optional()))
    }

    fn not(&mut self) -> Result<(), Error> {
        self.unary(Nfa::not)
    }

    fn invert(&mut self) -> Result<(), Error> {
        self.unary(Nfa::invert)
    }

    fn shortest(&mut self) -> Result<(), Error> {
        self.unary(Nfa::shortest)
    }

    fn all_prefixes(&mut self) -> Result<(), Error> {
        self.unary(Nfa::all_prefixes)
    }

    fn mark_as_sub(&mut self) -> Result<(), Error> {
        self.unary(Nfa::mark_as_sub)
    }
}

/// Renders the build calls as postfix text, one space-separated token per call.
///
/// Operands are `"literal"`, `[class]`, `[^class]` and `ANY`; operators use
/// their pattern symbol (`* + ? ! ~ ^ @`) or a name (`seq`, `or`, `sub`,
/// `dup`, `swap`).
#[derive(Debug, Default)]
pub struct PostfixView {
    out: String,
}

impl PostfixView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn token(&mut self, token: &str) -> Result<(), Error> {
        if !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(token);
        Ok(())
    }
}

impl NfaParserView for PostfixView {
    fn push_char_set(&mut self, ranges: &[(char, char)], invert: bool) -> Result<(), Error> {
        let mut set = String::from(if invert { "[^" } else { "[" });
        for &(lo, hi) in ranges {
            if lo == hi {
                set.push(lo);
            } else {
                let _ = write!(set, "{}-{}", lo, hi);
            }
        }
        set.push(']');
        self.token(&set)
    }

    fn push_dot(&mut self) -> Result<(), Error> {
        self.token("ANY")
    }

    fn push_string(&mut self, s: &str) -> Result<(), Error> {
        self.token(&format!("{:?}", s))
    }

    fn swap(&mut self) -> Result<(), Error> {
        self.token("swap")
    }

    fn dup(&mut self) -> Result<(), Error> {
        self.token("dup")
    }

    fn or(&mut self) -> Result<(), Error> {
        self.token("or")
    }

    fn seq(&mut self) -> Result<(), Error> {
        self.token("seq")
    }

    fn star(&mut self) -> Result<(), Error> {
        self.token("*")
    }

    fn plus(&mut self) -> Result<(), Error> {
        self.token("+")
    }

    fn optional(&mut self) -> Result<(), Error> {
        self.token("?")
    }

    fn not(&mut self) -> Result<(), Error> {
        self.token("^")
    }

    fn invert(&mut self) -> Result<(), Error> {
        self.token("~")
    }

    fn shortest(&mut self) -> Result<(), Error> {
        self.token("!")
    }

    fn all_prefixes(&mut self) -> Result<(), Error> {
        self.token("@")
    }

    fn mark_as_sub(&mut self) -> Result<(), Error> {
        self.token("sub")
    }
}
