use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::editing::{BlockSelection, Document};
use crate::error::CommandError;
use crate::models::BlockId;

/// Limits for coalescing adjacent commands into one undo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Combined tokens a merged text command may touch, exclusive.
    pub limit: usize,
    /// Whether text containing whitespace may join a merge.
    pub across_whitespace: bool,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            limit: 10,
            across_whitespace: false,
        }
    }
}

impl MergePolicy {
    /// Whether `text` may take part in a merge under this policy.
    pub(crate) fn accepts(&self, text: &str) -> bool {
        self.across_whitespace || !text.chars().any(char::is_whitespace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Executed,
    Undone,
}

/// Side effect reported to history subscribers after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub block: BlockId,
    pub kind: ChangeKind,
    pub label: &'static str,
}

/// A reversible mutation of a [`Document`].
///
/// The command's fields split into the payload it was built with and a buffer
/// that `execute` fills with exactly what `undo` needs. Commands are driven by
/// [`History`](crate::editing::History), which calls, in order, `execute`,
/// `on_execute`, `notify_execute` and then `try_merge` on the previous
/// command.
pub trait Command: Any + fmt::Debug {
    /// Short human-readable name, shown in undo menus and logs.
    fn label(&self) -> &'static str;

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError>;

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError>;

    /// Re-applies an undone command. Re-executing from the payload is
    /// correct for commands whose `execute` is deterministic.
    fn redo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        self.execute(doc)
    }

    /// Absorbs `candidate`, which has just executed, into `self` so both undo
    /// as one step. Returns `false` to keep them separate. Never mutates the
    /// candidate.
    fn try_merge(&mut self, _candidate: &dyn Command, _policy: &MergePolicy) -> bool {
        false
    }

    /// Whether the last `execute` left the document unchanged. History does
    /// not record such commands.
    fn is_noop(&self) -> bool {
        false
    }

    /// Whether a failed `execute` left some of its effects applied. History
    /// records such a command so those effects can still be undone.
    fn partially_applied(&self) -> bool {
        false
    }

    /// Selection update after `execute` or `redo`.
    fn on_execute(&self, _doc: &mut Document) {}

    /// Selection update after `undo`.
    fn on_undo(&self, _doc: &mut Document) {}

    fn notify_execute(&self, _out: &mut Vec<Notification>) {}

    fn notify_undo(&self, _out: &mut Vec<Notification>) {}

    fn as_any(&self) -> &dyn Any;
}

/// Selection before and after a command, recorded during `execute`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SelectionMemo {
    pub before: Option<BlockSelection>,
    pub after: Option<BlockSelection>,
}

impl SelectionMemo {
    pub fn record(doc: &Document, after: Option<BlockSelection>) -> Self {
        Self {
            before: doc.selection,
            after,
        }
    }

    /// Memo covering `self` followed by `next`.
    pub fn then(self, next: SelectionMemo) -> Self {
        Self {
            before: self.before,
            after: next.after,
        }
    }

    pub fn apply_after(&self, doc: &mut Document) {
        doc.selection = self.after;
    }

    pub fn apply_before(&self, doc: &mut Document) {
        doc.selection = self.before;
    }
}

pub(crate) fn notification(block: BlockId, kind: ChangeKind, label: &'static str) -> Notification {
    Notification { block, kind, label }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = MergePolicy::default();
        assert_eq!(policy.limit, 10);
        assert!(policy.accepts("abc"));
        assert!(!policy.accepts("a b"));
        let loose = MergePolicy {
            across_whitespace: true,
            ..policy
        };
        assert!(loose.accepts("a b"));
    }

    #[test]
    fn memo_chains_outer_selections() {
        let block = BlockId::new();
        let first = SelectionMemo {
            before: Some(BlockSelection::caret(block, 0)),
            after: Some(BlockSelection::caret(block, 1)),
        };
        let second = SelectionMemo {
            before: Some(BlockSelection::caret(block, 1)),
            after: Some(BlockSelection::caret(block, 2)),
        };
        let merged = first.then(second);
        assert_eq!(merged.before, first.before);
        assert_eq!(merged.after, second.after);
    }
}
