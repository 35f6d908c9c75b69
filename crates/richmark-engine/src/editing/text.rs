use std::any::Any;

use crate::editing::command::{SelectionMemo, notification};
use crate::editing::surgery::{self, Snapshot};
use crate::editing::{BlockSelection, ChangeKind, Command, Document, MergePolicy, Notification};
use crate::error::CommandError;
use crate::models::BlockId;
use crate::position::{Direction, Placement, Token};
use crate::selection::Interval;

#[derive(Debug, Clone)]
struct TextInsert {
    bias: usize,
    text: String,
    placement: Placement,
    snapshot: Option<Snapshot>,
}

impl TextInsert {
    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Types `text` at `bias` in one block.
///
/// Consecutive single-run inserts coalesce, so typing a word undoes as one
/// step.
#[derive(Debug, Clone)]
pub struct InsertText {
    block: BlockId,
    steps: Vec<TextInsert>,
    memo: SelectionMemo,
}

impl InsertText {
    pub fn new(block: BlockId, bias: usize, text: impl Into<String>) -> Self {
        Self::with_placement(block, bias, text, Placement::Outer)
    }

    pub fn with_placement(block: BlockId, bias: usize, text: impl Into<String>, placement: Placement) -> Self {
        Self {
            block,
            steps: vec![TextInsert {
                bias,
                text: text.into(),
                placement,
                snapshot: None,
            }],
            memo: SelectionMemo::default(),
        }
    }

    /// Replaces nothing; types at the caret of `selection`, honouring its
    /// placement.
    pub fn at_caret(selection: &BlockSelection, text: impl Into<String>) -> Self {
        Self::with_placement(
            selection.block,
            selection.interval.end,
            text,
            selection.placement,
        )
    }

    /// Bias right after the last inserted character.
    fn end(&self) -> Option<usize> {
        self.steps.last().map(|s| s.bias + s.len())
    }

    fn total_len(&self) -> usize {
        self.steps.iter().map(TextInsert::len).sum()
    }
}

impl Command for InsertText {
    fn label(&self) -> &'static str {
        "Insert text"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let before = doc.selection;
        let root = doc.root_mut(self.block)?;
        for index in 0..self.steps.len() {
            let step = &mut self.steps[index];
            match surgery::insert_text(root, step.bias, &step.text, step.placement) {
                Ok(snapshot) => step.snapshot = Some(snapshot),
                Err(err) => {
                    surgery::restore_all(root, self.steps[..index].iter().filter_map(|s| s.snapshot.as_ref()))?;
                    return Err(err);
                }
            }
        }
        let after = self.end().map(|end| BlockSelection::caret(self.block, end));
        self.memo = SelectionMemo { before, after };
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let snapshots = self
            .steps
            .iter()
            .map(|s| s.snapshot.as_ref())
            .collect::<Option<Vec<_>>>()
            .ok_or(CommandError::NotExecuted { label: "Insert text" })?;
        surgery::restore_all(doc.root_mut(self.block)?, snapshots)
    }

    fn try_merge(&mut self, candidate: &dyn Command, policy: &MergePolicy) -> bool {
        let Some(next) = candidate.as_any().downcast_ref::<InsertText>() else {
            return false;
        };
        let [step] = next.steps.as_slice() else {
            return false;
        };
        let mergeable = next.block == self.block
            && self.end() == Some(step.bias)
            && self.steps.iter().all(|s| policy.accepts(&s.text))
            && policy.accepts(&step.text)
            && self.total_len() + step.len() < policy.limit;
        if mergeable {
            self.steps.push(step.clone());
            self.memo = self.memo.then(next.memo);
        }
        mergeable
    }

    fn on_execute(&self, doc: &mut Document) {
        self.memo.apply_after(doc);
    }

    fn on_undo(&self, doc: &mut Document) {
        self.memo.apply_before(doc);
    }

    fn notify_execute(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.block, ChangeKind::Executed, self.label()));
    }

    fn notify_undo(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.block, ChangeKind::Undone, self.label()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone)]
struct TextDelete {
    interval: Interval,
    removed: Vec<Token>,
    snapshot: Option<Snapshot>,
}

impl TextDelete {
    /// Whether the removed tokens are plain characters acceptable to `policy`.
    fn plain(&self, policy: &MergePolicy) -> bool {
        self.removed.iter().all(|t| match t {
            Token::Char(c) => policy.across_whitespace || !c.is_whitespace(),
            _ => false,
        })
    }
}

/// Removes an interval of tokens from one block.
///
/// `direction` records which key produced the delete: backspace deletes
/// `Backward`, delete-forward `Forward`. Repeated deletes in one direction
/// coalesce. A delete whose interval covers only kept hints removes nothing
/// and leaves the caret where it was.
#[derive(Debug, Clone)]
pub struct DeleteText {
    block: BlockId,
    direction: Direction,
    steps: Vec<TextDelete>,
    memo: SelectionMemo,
}

impl DeleteText {
    pub fn new(block: BlockId, interval: Interval, direction: Direction) -> Self {
        Self {
            block,
            direction,
            steps: vec![TextDelete {
                interval: Interval::new(interval.start, interval.end),
                removed: Vec::new(),
                snapshot: None,
            }],
            memo: SelectionMemo::default(),
        }
    }

    /// Tokens removed so far, in document order.
    pub fn removed(&self) -> Vec<Token> {
        match self.direction {
            Direction::Forward => self.steps.iter().flat_map(|s| s.removed.clone()).collect(),
            Direction::Backward => self.steps.iter().rev().flat_map(|s| s.removed.clone()).collect(),
        }
    }

    fn total_len(&self) -> usize {
        self.steps.iter().map(|s| s.interval.len()).sum()
    }
}

impl Command for DeleteText {
    fn label(&self) -> &'static str {
        "Delete text"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let before = doc.selection;
        let root = doc.root_mut(self.block)?;
        for index in 0..self.steps.len() {
            let step = &mut self.steps[index];
            match surgery::delete_range(root, step.interval) {
                Ok((snapshot, removed)) => {
                    step.snapshot = Some(snapshot);
                    step.removed = removed;
                }
                Err(err) => {
                    surgery::restore_all(root, self.steps[..index].iter().filter_map(|s| s.snapshot.as_ref()))?;
                    return Err(err);
                }
            }
        }
        let after = if self.is_noop() {
            before
        } else {
            self.steps
                .last()
                .map(|s| BlockSelection::caret(self.block, s.interval.start))
        };
        self.memo = SelectionMemo { before, after };
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let snapshots = self
            .steps
            .iter()
            .map(|s| s.snapshot.as_ref())
            .collect::<Option<Vec<_>>>()
            .ok_or(CommandError::NotExecuted { label: "Delete text" })?;
        surgery::restore_all(doc.root_mut(self.block)?, snapshots)
    }

    fn is_noop(&self) -> bool {
        self.steps.iter().all(|s| s.removed.is_empty())
    }

    fn try_merge(&mut self, candidate: &dyn Command, policy: &MergePolicy) -> bool {
        let Some(next) = candidate.as_any().downcast_ref::<DeleteText>() else {
            return false;
        };
        let ([step], Some(last)) = (next.steps.as_slice(), self.steps.last()) else {
            return false;
        };
        let adjacent = match self.direction {
            Direction::Backward => step.interval.end == last.interval.start,
            Direction::Forward => step.interval.start == last.interval.start,
        };
        let mergeable = next.block == self.block
            && !next.is_noop()
            && next.direction == self.direction
            && adjacent
            && self.steps.iter().all(|s| s.plain(policy))
            && step.plain(policy)
            && self.total_len() + step.interval.len() < policy.limit;
        if mergeable {
            self.steps.push(step.clone());
            self.memo = self.memo.then(next.memo);
        }
        mergeable
    }

    fn on_execute(&self, doc: &mut Document) {
        self.memo.apply_after(doc);
    }

    fn on_undo(&self, doc: &mut Document) {
        self.memo.apply_before(doc);
    }

    fn notify_execute(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.block, ChangeKind::Executed, self.label()));
    }

    fn notify_undo(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.block, ChangeKind::Undone, self.label()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
