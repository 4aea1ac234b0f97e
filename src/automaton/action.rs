//! Terminal actions attached to accepting states.
//!
//! An action is opaque to the engine except for its priority and its answer
//! to `merge_with`, which the compiler consults when several actions reach
//! the same DFA state. Actions are shared as `ActionRef` and compared by
//! pointer identity.

use std::fmt;
use std::sync::Arc;

use super::submatch::Submatches;

/// Error returned by a failing action; passed through untouched.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Shared handle to an action.
pub type ActionRef = Arc<dyn Action>;

/// Identity of an action, stable for the lifetime of its `Arc`.
#[inline]
pub fn action_key(action: &ActionRef) -> usize {
    Arc::as_ptr(action) as *const () as usize
}

/// Outcome of resolving two actions that recognize the same input.
#[derive(Clone, Debug)]
pub enum Merge {
    /// The receiver prevails.
    KeepSelf,
    /// The argument prevails.
    KeepOther,
    /// Both are replaced by a new action.
    Combined(ActionRef),
    /// The two cannot be reconciled.
    Clash,
}

/// Priority-only resolution: the higher priority wins, equal priorities clash.
pub fn merge_by_priority(mine: i32, theirs: i32) -> Merge {
    match mine.cmp(&theirs) {
        std::cmp::Ordering::Greater => Merge::KeepSelf,
        std::cmp::Ordering::Less => Merge::KeepOther,
        std::cmp::Ordering::Equal => Merge::Clash,
    }
}

/// What the streaming runner hands to an action besides the output buffer.
#[derive(Default)]
pub struct Context<'a> {
    pub submatches: Option<&'a Submatches>,
}

impl<'a> Context<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submatches(submatches: &'a Submatches) -> Self {
        Self {
            submatches: Some(submatches),
        }
    }
}

/// Callback run on a match.
///
/// Implementations must be `Send + Sync` so a compiled `Dfa` can be shared
/// between threads; whether `invoke` itself is safe to run concurrently is
/// up to the implementation.
pub trait Action: fmt::Debug + Send + Sync {
    /// Process the match, which is `out[start..]`.
    fn invoke(
        &self,
        out: &mut String,
        start: usize,
        ctx: &mut Context<'_>,
    ) -> Result<(), ActionError>;

    fn priority(&self) -> i32 {
        0
    }

    fn merge_with(&self, other: &dyn Action) -> Merge {
        merge_by_priority(self.priority(), other.priority())
    }

    /// Actions a `Merge::Combined` result stands for.
    fn constituents(&self) -> &[ActionRef] {
        &[]
    }
}

/// Leaves the match in the output.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyMatch;

impl Action for CopyMatch {
    fn invoke(
        &self,
        _out: &mut String,
        _start: usize,
        _ctx: &mut Context<'_>,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Removes the match from the output.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropMatch;

impl Action for DropMatch {
    fn invoke(
        &self,
        out: &mut String,
        start: usize,
        _ctx: &mut Context<'_>,
    ) -> Result<(), ActionError> {
        out.truncate(start);
        Ok(())
    }
}

/// Replaces the match with a fixed text.
#[derive(Debug, Clone)]
pub struct Replace {
    text: String,
    priority: i32,
}

impl Replace {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Action for Replace {
    fn invoke(
        &self,
        out: &mut String,
        start: usize,
        _ctx: &mut Context<'_>,
    ) -> Result<(), ActionError> {
        out.truncate(start);
        out.push_str(&self.text);
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Wraps the match between a prefix and a suffix.
#[derive(Debug, Clone)]
pub struct Embed {
    pre: String,
    post: String,
    priority: i32,
}

impl Embed {
    pub fn new(pre: impl Into<String>, post: impl Into<String>) -> Self {
        Self {
            pre: pre.into(),
            post: post.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Action for Embed {
    fn invoke(
        &self,
        out: &mut String,
        start: usize,
        _ctx: &mut Context<'_>,
    ) -> Result<(), ActionError> {
        out.insert_str(start, &self.pre);
        out.push_str(&self.post);
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Named marker action for classifying input; leaves the output alone.
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
    priority: i32,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Action for Tag {
    fn invoke(
        &self,
        _out: &mut String,
        _start: usize,
        _ctx: &mut Context<'_>,
    ) -> Result<(), ActionError> {
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Stand-in action for "accepting" while the language operators compile.
#[derive(Debug)]
pub(crate) struct Accept;

impl Action for Accept {
    fn invoke(
        &self,
        _out: &mut String,
        _start: usize,
        _ctx: &mut Context<'_>,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_by_priority() {
        assert!(matches!(merge_by_priority(2, 1), Merge::KeepSelf));
        assert!(matches!(merge_by_priority(1, 2), Merge::KeepOther));
        assert!(matches!(merge_by_priority(1, 1), Merge::Clash));
    }

    #[test]
    fn test_stock_actions_edit_output() {
        let mut ctx = Context::new();

        let mut out = String::from("xxabc");
        DropMatch.invoke(&mut out, 2, &mut ctx).unwrap();
        assert_eq!(out, "xx");

        let mut out = String::from("xxabc");
        Replace::new("<>").invoke(&mut out, 2, &mut ctx).unwrap();
        assert_eq!(out, "xx<>");

        let mut out = String::from("xxabc");
        Embed::new("[", "]").invoke(&mut out, 2, &mut ctx).unwrap();
        assert_eq!(out, "xx[abc]");

        let mut out = String::from("xxabc");
        CopyMatch.invoke(&mut out, 2, &mut ctx).unwrap();
        assert_eq!(out, "xxabc");
    }

    #[test]
    fn test_action_identity() {
        let a: ActionRef = Arc::new(Tag::new("a"));
        let b: ActionRef = Arc::new(Tag::new("a"));
        assert_eq!(action_key(&a), action_key(&a.clone()));
        assert_ne!(action_key(&a), action_key(&b));
    }
}
