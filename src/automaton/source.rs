//! Pull-based character input with push-back.

use std::io;

/// Where the matcher reads from.
///
/// `push_back` moves `buf[from..]` back into the source so that the following
/// `read` calls replay exactly those characters, in order, before anything
/// new.
pub trait CharSource {
    /// The next character, or `None` at end of input.
    fn read(&mut self) -> io::Result<Option<char>>;

    fn push_back(&mut self, buf: &mut String, from: usize);
}

/// Character source over any `char` iterator.
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    inner: I,
    /// Pushed-back characters, last one to be replayed first
    replay: Vec<char>,
}

impl<I: Iterator<Item = char>> IterSource<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            replay: Vec::new(),
        }
    }

    /// Characters currently waiting to be replayed.
    pub fn pending(&self) -> usize {
        self.replay.len()
    }
}

impl<I: Iterator<Item = char>> CharSource for IterSource<I> {
    #[inline]
    fn read(&mut self) -> io::Result<Option<char>> {
        if let Some(c) = self.replay.pop() {
            return Ok(Some(c));
        }
        Ok(self.inner.next())
    }

    fn push_back(&mut self, buf: &mut String, from: usize) {
        self.replay.extend(buf[from..].chars().rev());
        buf.truncate(from);
    }
}

/// Source reading a string slice.
pub type StrSource<'a> = IterSource<std::str::Chars<'a>>;

impl<'a> From<&'a str> for StrSource<'a> {
    fn from(s: &'a str) -> Self {
        IterSource::new(s.chars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(src: &mut impl CharSource) -> String {
        let mut s = String::new();
        while let Some(c) = src.read().unwrap() {
            s.push(c);
        }
        s
    }

    #[test]
    fn test_push_back_replays_in_order() {
        let mut src = StrSource::from("abcdef");
        let mut buf = String::from(">");
        for _ in 0..4 {
            buf.push(src.read().unwrap().unwrap());
        }
        assert_eq!(buf, ">abcd");
        src.push_back(&mut buf, 2);
        assert_eq!(buf, ">a");
        assert_eq!(src.pending(), 3);
        assert_eq!(read_all(&mut src), "bcdef");
    }

    #[test]
    fn test_nested_push_back() {
        let mut src = StrSource::from("xyz");
        let mut buf = String::new();
        buf.push(src.read().unwrap().unwrap());
        buf.push(src.read().unwrap().unwrap());
        src.push_back(&mut buf, 1);
        buf.push(src.read().unwrap().unwrap());
        assert_eq!(buf, "xy");
        src.push_back(&mut buf, 0);
        assert_eq!(read_all(&mut src), "xyz");
    }
}
