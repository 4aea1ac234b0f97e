//! Recursive-descent parser for the pattern dialect.
//!
//! The parser never builds a tree. It walks the pattern once and issues
//! stack-machine calls on a [`NfaParserView`]:
//!
//! - `alternation := sequence ('|' sequence)*`
//! - `sequence := (atom postfix*)+`
//! - `atom := literal run | '(' alternation ')' | '(!' alternation ')' | class | '.' | escape`
//! - `postfix := '?' | '*' | '+' | '!' | '~' | '^' | '@' | '{m}' | '{m,}' | '{m,n}'`
//!
//! `!` keeps only the shortest match, `~` is the set complement, `^` means
//! "does not contain" and `@` matches every non-empty prefix.

use thiserror::Error;

use super::view::NfaParserView;

/// Characters with a meaning outside of bracket classes.
const SPECIALS: &[char] = &[
    '|', '(', ')', '[', '{', '.', '\\', '?', '*', '+', '!', '~', '^', '@',
];

/// Characters that start a postfix operator.
const POSTFIX: &[char] = &['?', '*', '+', '!', '~', '^', '@', '{'];

/// Characters of pattern text shown on each side of an error.
const CONTEXT_RADIUS: usize = 10;

/// Why a pattern was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected end of pattern")]
    UnexpectedEof,
    #[error("unmatched ')'")]
    UnmatchedClose,
    #[error("unmatched '('")]
    UnmatchedOpen,
    #[error("'\\' at end of pattern")]
    EscapeAtEof,
    #[error("malformed hex escape")]
    BadHexEscape,
    #[error("bad character range")]
    BadRange,
    #[error("trailing characters")]
    TrailingChars,
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("missing '}}'")]
    MissingBrace,
    #[error("bad repeat count")]
    BadRepeat,
    #[error("too many reporting groups")]
    TooManyGroups,
}

/// A rejected pattern, with the 1-based column of the offending character.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at column {column} in `{context}`")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub column: usize,
    /// Pattern text around the column
    pub context: String,
}

/// Parse `re` and issue the build calls on `view`.
///
/// On success the view holds exactly one more operand than before.
pub fn parse<V: NfaParserView + ?Sized>(re: &str, view: &mut V) -> Result<(), crate::Error> {
    let mut parser = ReParser {
        chars: re.chars().collect(),
        pos: 0,
        depth: 0,
        view,
    };
    parser.alternation()?;
    if parser.peek().is_some() {
        return Err(parser.error(ParseErrorKind::TrailingChars));
    }
    Ok(())
}

struct ReParser<'v, V: ?Sized> {
    chars: Vec<char>,
    pos: usize,
    /// Open groups
    depth: usize,
    view: &'v mut V,
}

impl<V: NfaParserView + ?Sized> ReParser<'_, V> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind) -> crate::Error {
        self.error_at(kind, self.pos)
    }

    fn error_at(&self, kind: ParseErrorKind, pos: usize) -> crate::Error {
        let from = pos.saturating_sub(CONTEXT_RADIUS);
        let to = (pos + CONTEXT_RADIUS).min(self.chars.len());
        ParseError {
            kind,
            column: pos + 1,
            context: self.chars[from..to].iter().collect(),
        }
        .into()
    }

    /// Forward one build call, reporting subgroup overflow at the current column.
    fn emit(
        &mut self,
        op: impl FnOnce(&mut V) -> Result<(), crate::Error>,
    ) -> Result<(), crate::Error> {
        op(&mut *self.view).map_err(|e| match e {
            crate::Error::TooManySubgroups => self.error(ParseErrorKind::TooManyGroups),
            e => e,
        })
    }

    fn alternation(&mut self) -> Result<(), crate::Error> {
        self.sequence()?;
        while self.peek() == Some('|') {
            self.pos += 1;
            self.sequence()?;
            self.emit(|v| v.or())?;
        }
        Ok(())
    }

    /// Count one more operand of the current sequence, joining it to the previous one.
    fn append(&mut self, items: &mut usize) -> Result<(), crate::Error> {
        *items += 1;
        if *items > 1 {
            self.emit(|v| v.seq())?;
        }
        Ok(())
    }

    fn sequence(&mut self) -> Result<(), crate::Error> {
        let mut items = 0;
        while let Some(c) = self.peek() {
            match c {
                '|' => break,
                ')' if self.depth == 0 && items == 0 => {
                    return Err(self.error(ParseErrorKind::UnmatchedClose));
                }
                // at the top level the caller reports what follows as trailing
                ')' => break,
                c if POSTFIX.contains(&c) => {
                    return Err(self.error(ParseErrorKind::UnexpectedChar));
                }
                c if SPECIALS.contains(&c) => {
                    self.atom()?;
                    self.postfix()?;
                    self.append(&mut items)?;
                }
                _ => {
                    let run = self.literal_run();
                    let binds = self.peek().is_some_and(|c| POSTFIX.contains(&c));
                    // a postfix operator applies to the last character only
                    let split = if binds { run.len() - 1 } else { run.len() };
                    if split > 0 {
                        let head: String = run[..split].iter().collect();
                        self.emit(|v| v.push_string(&head))?;
                        if binds {
                            self.append(&mut items)?;
                        }
                    }
                    if binds {
                        let last = run[split].to_string();
                        self.emit(|v| v.push_string(&last))?;
                        self.postfix()?;
                    }
                    self.append(&mut items)?;
                }
            }
        }
        if items == 0 {
            let kind = match self.peek() {
                None => ParseErrorKind::UnexpectedEof,
                _ => ParseErrorKind::UnexpectedChar,
            };
            return Err(self.error(kind));
        }
        Ok(())
    }

    /// Consume plain characters up to the next special one.
    fn literal_run(&mut self) -> Vec<char> {
        let start = self.pos;
        while self.peek().is_some_and(|c| !SPECIALS.contains(&c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].to_vec()
    }

    fn atom(&mut self) -> Result<(), crate::Error> {
        let at = self.pos;
        match self.bump() {
            Some('(') => self.group(at),
            Some('[') => self.class(at),
            Some('.') => self.emit(|v| v.push_dot()),
            Some('\\') => {
                let c = self.escape()?.to_string();
                self.emit(|v| v.push_string(&c))
            }
            _ => Err(self.error_at(ParseErrorKind::UnexpectedChar, at)),
        }
    }

    fn group(&mut self, open: usize) -> Result<(), crate::Error> {
        let report = self.peek() == Some('!');
        if report {
            self.pos += 1;
        }
        self.depth += 1;
        self.alternation()?;
        self.depth -= 1;
        if self.bump() != Some(')') {
            return Err(self.error_at(ParseErrorKind::UnmatchedOpen, open));
        }
        if report {
            self.emit(|v| v.mark_as_sub())?;
        }
        Ok(())
    }

    /// The character after a backslash, which has been consumed.
    fn escape(&mut self) -> Result<char, crate::Error> {
        let at = self.pos - 1;
        match self.bump() {
            None => Err(self.error_at(ParseErrorKind::EscapeAtEof, at)),
            Some('x') => self.hex(2, at),
            Some('u') => self.hex(4, at),
            Some(c) => Ok(c),
        }
    }

    fn hex(&mut self, digits: usize, at: usize) -> Result<char, crate::Error> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_at(ParseErrorKind::BadHexEscape, at))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error_at(ParseErrorKind::BadHexEscape, at))
    }

    /// Bracket class; the `[` has been consumed.
    ///
    /// `]` and `-` are literal in first position (after an optional `^`).
    fn class(&mut self, open: usize) -> Result<(), crate::Error> {
        let invert = self.peek() == Some('^');
        if invert {
            self.pos += 1;
        }
        let mut ranges = Vec::new();
        let mut first = true;
        loop {
            let at = self.pos;
            let Some(c) = self.bump() else {
                return Err(self.error_at(ParseErrorKind::UnexpectedEof, open));
            };
            if !first && c == ']' {
                break;
            }
            if !first && c == '-' {
                return Err(self.error_at(ParseErrorKind::BadRange, at));
            }
            first = false;
            let lo = if c == '\\' { self.escape()? } else { c };
            if self.peek() != Some('-') {
                ranges.push((lo, lo));
                continue;
            }
            self.pos += 1;
            let hi = match self.bump() {
                None => return Err(self.error_at(ParseErrorKind::UnexpectedEof, open)),
                Some(']') => return Err(self.error_at(ParseErrorKind::BadRange, at)),
                Some('\\') => self.escape()?,
                Some(c) => c,
            };
            if hi < lo {
                return Err(self.error_at(ParseErrorKind::BadRange, at));
            }
            ranges.push((lo, hi));
        }
        self.emit(|v| v.push_char_set(&ranges, invert))
    }

    fn postfix(&mut self) -> Result<(), crate::Error> {
        loop {
            let at = self.pos;
            match self.peek() {
                Some('{') => {
                    self.pos += 1;
                    self.repeat(at)?;
                }
                Some(op @ ('?' | '*' | '+' | '!' | '~' | '^' | '@')) => {
                    self.pos += 1;
                    self.emit(|v| match op {
                        '?' => v.optional(),
                        '*' => v.star(),
                        '+' => v.plus(),
                        '!' => v.shortest(),
                        '~' => v.invert(),
                        '^' => v.not(),
                        _ => v.all_prefixes(),
                    })?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut n: u32 = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            n = n.checked_mul(10)?.checked_add(d)?;
            self.pos += 1;
        }
        (self.pos > start).then_some(n)
    }

    /// `{m}`, `{m,}` or `{m,n}`; the `{` at `open` has been consumed.
    fn repeat(&mut self, open: usize) -> Result<(), crate::Error> {
        let min = self
            .number()
            .ok_or_else(|| self.error(ParseErrorKind::BadRepeat))?;
        let max = if self.peek() == Some(',') {
            self.pos += 1;
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                Some(
                    self.number()
                        .ok_or_else(|| self.error(ParseErrorKind::BadRepeat))?,
                )
            } else {
                None
            }
        } else {
            Some(min)
        };
        if self.bump() != Some('}') {
            return Err(self.error_at(ParseErrorKind::MissingBrace, open));
        }
        match max {
            Some(max) if max == 0 || max < min => {
                Err(self.error_at(ParseErrorKind::BadRepeat, open))
            }
            Some(max) => self.bounded(min, max),
            None => self.unbounded(min),
        }
    }

    /// `max` copies, the ones after the first `min` nested optionals:
    /// `x{2,4}` is `x x (x x?)?`.
    fn bounded(&mut self, min: u32, max: u32) -> Result<(), crate::Error> {
        for _ in 1..max {
            self.emit(|v| v.dup())?;
        }
        let optional = max - min;
        if optional > 0 {
            self.emit(|v| v.optional())?;
            for _ in 1..optional {
                self.emit(|v| {
                    v.seq()?;
                    v.optional()
                })?;
            }
        }
        let joins = if optional > 0 { min } else { min - 1 };
        for _ in 0..joins {
            self.emit(|v| v.seq())?;
        }
        Ok(())
    }

    /// `min` copies followed by a starred one.
    fn unbounded(&mut self, min: u32) -> Result<(), crate::Error> {
        for _ in 0..min {
            self.emit(|v| v.dup())?;
        }
        self.emit(|v| v.star())?;
        for _ in 0..min {
            self.emit(|v| v.seq())?;
        }
        Ok(())
    }
}
