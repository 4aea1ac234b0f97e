//! Pattern parsing.
//!
//! The dialect covers alternation, grouping, reporting groups `(!...)`,
//! bracket classes, `.`, `\` escapes (`\xHH`, `\uHHHH`, and `\c` for a
//! literal `c`) and the postfix operators `? * + {m,n}` plus the automaton
//! operators `!` (shortest), `~` (complement), `^` (not containing) and `@`
//! (all prefixes).
//!
//! Parsing is decoupled from building through [`NfaParserView`]: `NfaStack`
//! builds automata, `PostfixView` renders the call sequence as text.

mod parser;
mod view;

pub use parser::{parse, ParseError, ParseErrorKind};
pub use view::{NfaParserView, NfaStack, PostfixView};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn postfix(re: &str) -> String {
        let mut view = PostfixView::new();
        parse(re, &mut view).unwrap();
        view.into_string()
    }

    fn error(re: &str) -> ParseError {
        match parse(re, &mut PostfixView::new()) {
            Err(Error::Parse(e)) => e,
            other => panic!("expected a parse error for {:?}, got {:?}", re, other),
        }
    }

    fn kind(re: &str) -> ParseErrorKind {
        error(re).kind
    }

    #[test]
    fn test_literal_run_is_one_string() {
        assert_eq!(postfix("abc"), r#""abc""#);
    }

    #[test]
    fn test_postfix_binds_to_last_char() {
        assert_eq!(postfix("abc*"), r#""ab" "c" * seq"#);
        assert_eq!(postfix("a+"), r#""a" +"#);
        assert_eq!(postfix("ab?c"), r#""a" "b" ? seq "c" seq"#);
    }

    #[test]
    fn test_alternation_and_groups() {
        assert_eq!(postfix("a|bc"), r#""a" "bc" or"#);
        assert_eq!(postfix("(a|b)c"), r#""a" "b" or "c" seq"#);
        assert_eq!(postfix("x|y|z"), r#""x" "y" or "z" or"#);
    }

    #[test]
    fn test_reporting_group() {
        assert_eq!(postfix("(!a+)b"), r#""a" + sub "b" seq"#);
        assert_eq!(postfix("(!a)(!b)"), r#""a" sub "b" sub seq"#);
    }

    #[test]
    fn test_dot_and_automaton_operators() {
        assert_eq!(postfix(".*"), "ANY *");
        assert_eq!(postfix("a!"), r#""a" !"#);
        assert_eq!(postfix("(ab)~"), r#""ab" ~"#);
        assert_eq!(postfix("(ab)^"), r#""ab" ^"#);
        assert_eq!(postfix("(ab)@"), r#""ab" @"#);
        assert_eq!(postfix("a*!"), r#""a" * !"#);
    }

    #[test]
    fn test_classes() {
        assert_eq!(postfix("[a-z0]"), "[a-z0]");
        assert_eq!(postfix("[^x]"), "[^x]");
        assert_eq!(postfix("[]a]"), "[]a]");
        assert_eq!(postfix("[^]a]"), "[^]a]");
        assert_eq!(postfix("[-a]"), "[-a]");
        assert_eq!(postfix("[^-a-c]"), "[^-a-c]");
        assert_eq!(postfix(r"[\]\x41]"), "[]A]");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(postfix(r"\x41é"), r#""A" "é" seq"#);
        assert_eq!(postfix(r"\*\\"), r#""*" "\\" seq"#);
        assert_eq!(postfix(r"a\.b"), r#""a" "." seq "b" seq"#);
    }

    #[test]
    fn test_repeat_expansion() {
        assert_eq!(postfix("x{3}"), r#""x" dup dup seq seq"#);
        assert_eq!(postfix("x{2,4}"), r#""x" dup dup dup ? seq ? seq seq"#);
        assert_eq!(postfix("x{0,2}"), r#""x" dup ? seq ?"#);
        assert_eq!(postfix("x{2,}"), r#""x" dup dup * seq seq"#);
        assert_eq!(postfix("x{0,}"), r#""x" *"#);
        assert_eq!(postfix("x{1,1}"), r#""x""#);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(kind(""), ParseErrorKind::UnexpectedEof);
        assert_eq!(kind("a|"), ParseErrorKind::UnexpectedEof);
        assert_eq!(kind(")"), ParseErrorKind::UnmatchedClose);
        assert_eq!(kind("a|)"), ParseErrorKind::UnmatchedClose);
        assert_eq!(kind("ab)c"), ParseErrorKind::TrailingChars);
        assert_eq!(kind("(a))"), ParseErrorKind::TrailingChars);
        assert_eq!(kind("(ab"), ParseErrorKind::UnmatchedOpen);
        assert_eq!(kind("ab\\"), ParseErrorKind::EscapeAtEof);
        assert_eq!(kind(r"\xZZ"), ParseErrorKind::BadHexEscape);
        assert_eq!(kind(r"\x4"), ParseErrorKind::BadHexEscape);
        assert_eq!(kind(r"\uD800"), ParseErrorKind::BadHexEscape);
        assert_eq!(kind("[x-a]"), ParseErrorKind::BadRange);
        assert_eq!(kind("[a-]"), ParseErrorKind::BadRange);
        assert_eq!(kind("[ab-c"), ParseErrorKind::UnexpectedEof);
        assert_eq!(kind("[a-c-e]"), ParseErrorKind::BadRange);
        assert_eq!(kind("*a"), ParseErrorKind::UnexpectedChar);
        assert_eq!(kind("(|a)"), ParseErrorKind::UnexpectedChar);
        assert_eq!(kind("a{2"), ParseErrorKind::MissingBrace);
        assert_eq!(kind("a{2,3x"), ParseErrorKind::MissingBrace);
        assert_eq!(kind("a{0}"), ParseErrorKind::BadRepeat);
        assert_eq!(kind("a{3,2}"), ParseErrorKind::BadRepeat);
        assert_eq!(kind("a{,2}"), ParseErrorKind::BadRepeat);
    }

    #[test]
    fn test_error_column_and_context() {
        let e = error("abc[z-a]def");
        assert_eq!(e.kind, ParseErrorKind::BadRange);
        assert_eq!(e.column, 5);
        assert_eq!(e.context, "abc[z-a]def");
        assert!(e.to_string().contains("column 5"));

        let e = error("a{2");
        assert_eq!(e.kind.to_string(), "missing '}'");
    }

    #[test]
    fn test_trailing_close_points_at_the_paren() {
        let e = error("ab|cd)e");
        assert_eq!(e.kind, ParseErrorKind::TrailingChars);
        assert_eq!(e.column, 6);
    }

    #[test]
    fn test_group_limit_through_builder() {
        let mut stack = NfaStack::default();
        parse(&"(!a)".repeat(128), &mut stack).unwrap();
        assert_eq!(stack.len(), 1);

        let mut stack = NfaStack::default();
        match parse(&"(!a)".repeat(129), &mut stack) {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooManyGroups),
            other => panic!("expected TooManyGroups, got {:?}", other),
        }
    }

    #[test]
    fn test_stack_misuse() {
        let mut stack = NfaStack::default();
        assert!(matches!(stack.seq(), Err(Error::Misuse(_))));
        stack.push_string("a").unwrap();
        assert!(matches!(stack.swap(), Err(Error::Misuse(_))));
        stack.push_string("b").unwrap();
        stack.swap().unwrap();
        stack.seq().unwrap();
        let dfa = stack
            .finish()
            .unwrap()
            .add_action(std::sync::Arc::new(crate::Tag::new("ba")))
            .compile(crate::FailPolicy::Copy)
            .unwrap();
        assert!(dfa.matches("ba").is_some());
        assert!(dfa.matches("ab").is_none());
    }
}
