use std::any::Any;

use crate::editing::command::{SelectionMemo, notification};
use crate::editing::{BlockSelection, ChangeKind, Command, Document, MergePolicy, Notification};
use crate::error::{CommandError, PositionError};
use crate::position::token_size;

/// Moves the selection without touching content.
///
/// Consecutive selection changes merge, so a run of cursor moves undoes in
/// one step.
#[derive(Debug, Clone)]
pub struct SetSelection {
    target: Option<BlockSelection>,
    memo: Option<SelectionMemo>,
}

impl SetSelection {
    pub fn new(target: Option<BlockSelection>) -> Self {
        Self { target, memo: None }
    }
}

impl Command for SetSelection {
    fn label(&self) -> &'static str {
        "Select"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        if let Some(target) = self.target {
            let size = token_size(doc.root(target.block)?);
            let bias = target.interval.end;
            if bias > size {
                return Err(PositionError::BiasOutOfRange { bias, size }.into());
            }
        }
        self.memo = Some(SelectionMemo::record(doc, self.target));
        Ok(())
    }

    fn undo(&mut self, _doc: &mut Document) -> Result<(), CommandError> {
        match self.memo {
            Some(_) => Ok(()),
            None => Err(CommandError::NotExecuted { label: "Select" }),
        }
    }

    fn try_merge(&mut self, candidate: &dyn Command, _policy: &MergePolicy) -> bool {
        let Some(next) = candidate.as_any().downcast_ref::<SetSelection>() else {
            return false;
        };
        match (self.memo, next.memo) {
            (Some(mine), Some(theirs)) => {
                self.target = next.target;
                self.memo = Some(mine.then(theirs));
                true
            }
            _ => false,
        }
    }

    fn on_execute(&self, doc: &mut Document) {
        if let Some(memo) = &self.memo {
            memo.apply_after(doc);
        }
    }

    fn on_undo(&self, doc: &mut Document) {
        if let Some(memo) = &self.memo {
            memo.apply_before(doc);
        }
    }

    fn notify_execute(&self, out: &mut Vec<Notification>) {
        if let Some(target) = &self.target {
            out.push(notification(target.block, ChangeKind::Executed, self.label()));
        }
    }

    fn notify_undo(&self, out: &mut Vec<Notification>) {
        if let Some(before) = self.memo.and_then(|m| m.before) {
            out.push(notification(before.block, ChangeKind::Undone, self.label()));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockId, parse_markup};
    use crate::selection::Interval;

    #[test]
    fn select_then_undo_restores_previous() {
        let mut doc = Document::from_roots([parse_markup("abc", false)]).unwrap();
        let id = doc.block_ids()[0];
        doc.selection = Some(BlockSelection::caret(id, 0));

        let mut cmd = SetSelection::new(Some(BlockSelection::new(id, Interval::new(1, 3))));
        cmd.execute(&mut doc).unwrap();
        cmd.on_execute(&mut doc);
        assert_eq!(doc.selection, Some(BlockSelection::new(id, Interval::new(1, 3))));

        cmd.undo(&mut doc).unwrap();
        cmd.on_undo(&mut doc);
        assert_eq!(doc.selection, Some(BlockSelection::caret(id, 0)));
    }

    #[test]
    fn selection_beyond_block_is_refused() {
        let mut doc = Document::from_roots([parse_markup("abc", false)]).unwrap();
        let id = doc.block_ids()[0];
        let mut cmd = SetSelection::new(Some(BlockSelection::caret(id, 4)));
        assert!(cmd.execute(&mut doc).is_err());

        let mut unknown = SetSelection::new(Some(BlockSelection::caret(BlockId::new(), 0)));
        assert!(matches!(
            unknown.execute(&mut doc),
            Err(CommandError::BlockNotFound(_))
        ));
    }

    #[test]
    fn consecutive_moves_merge() {
        let mut doc = Document::from_roots([parse_markup("abc", false)]).unwrap();
        let id = doc.block_ids()[0];
        let mut first = SetSelection::new(Some(BlockSelection::caret(id, 1)));
        first.execute(&mut doc).unwrap();
        first.on_execute(&mut doc);
        let mut second = SetSelection::new(Some(BlockSelection::caret(id, 2)));
        second.execute(&mut doc).unwrap();
        second.on_execute(&mut doc);

        assert!(first.try_merge(&second, &MergePolicy::default()));
        first.on_undo(&mut doc);
        assert_eq!(doc.selection, None);
    }
}
