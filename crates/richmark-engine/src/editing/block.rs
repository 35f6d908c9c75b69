use std::any::Any;

use crate::editing::command::{SelectionMemo, notification};
use crate::editing::{BlockSelection, ChangeKind, Command, Document, Notification};
use crate::error::CommandError;
use crate::models::{Block, BlockId, Node};
use crate::position::token_size;

/// Inserts a new block after `after` (`None` inserts at the head).
///
/// The block id is fixed at construction so later commands in the same
/// composite can refer to it.
#[derive(Debug, Clone)]
pub struct InsertBlock {
    after: Option<BlockId>,
    id: BlockId,
    content: Node,
    removed: Option<(Block, Option<BlockId>)>,
    executed: bool,
    memo: SelectionMemo,
}

impl InsertBlock {
    pub fn new(after: Option<BlockId>, content: Node) -> Self {
        Self {
            after,
            id: BlockId::new(),
            content,
            removed: None,
            executed: false,
            memo: SelectionMemo::default(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }
}

impl Command for InsertBlock {
    fn label(&self) -> &'static str {
        "Insert block"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        if let Some(anchor) = self.after {
            doc.block(anchor)?;
        }
        doc.blocks
            .insert_after(self.after, self.id, self.content.clone())?;
        self.executed = true;
        self.removed = None;
        self.memo = SelectionMemo::record(doc, Some(BlockSelection::caret(self.id, 0)));
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        if !self.executed {
            return Err(CommandError::NotExecuted {
                label: "Insert block",
            });
        }
        let removed = doc
            .blocks
            .remove(self.id)
            .ok_or(CommandError::BlockNotFound(self.id))?;
        self.removed = Some(removed);
        Ok(())
    }

    /// Restores the removed block with its original order key.
    fn redo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        match self.removed.take() {
            Some((block, prev)) => {
                doc.blocks.restore(block, prev);
                Ok(())
            }
            None => self.execute(doc),
        }
    }

    fn on_execute(&self, doc: &mut Document) {
        self.memo.apply_after(doc);
    }

    fn on_undo(&self, doc: &mut Document) {
        self.memo.apply_before(doc);
    }

    fn notify_execute(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.id, ChangeKind::Executed, self.label()));
    }

    fn notify_undo(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.id, ChangeKind::Undone, self.label()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Unlinks a block, keeping it and its predecessor for undo.
#[derive(Debug, Clone)]
pub struct RemoveBlock {
    id: BlockId,
    removed: Option<(Block, Option<BlockId>)>,
    memo: SelectionMemo,
}

impl RemoveBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            removed: None,
            memo: SelectionMemo::default(),
        }
    }
}

impl Command for RemoveBlock {
    fn label(&self) -> &'static str {
        "Remove block"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let before = doc.selection;
        let (block, prev) = doc
            .blocks
            .remove(self.id)
            .ok_or(CommandError::BlockNotFound(self.id))?;
        self.removed = Some((block, prev));
        let after = match before {
            Some(sel) if sel.block == self.id => prev.map(|p| {
                let end = doc.root(p).map(token_size).unwrap_or_default();
                BlockSelection::caret(p, end)
            }),
            other => other,
        };
        self.memo = SelectionMemo { before, after };
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let (block, prev) = self.removed.take().ok_or(CommandError::NotExecuted {
            label: "Remove block",
        })?;
        doc.blocks.restore(block, prev);
        Ok(())
    }

    fn on_execute(&self, doc: &mut Document) {
        self.memo.apply_after(doc);
    }

    fn on_undo(&self, doc: &mut Document) {
        self.memo.apply_before(doc);
    }

    fn notify_execute(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.id, ChangeKind::Executed, self.label()));
    }

    fn notify_undo(&self, out: &mut Vec<Notification>) {
        out.push(notification(self.id, ChangeKind::Undone, self.label()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn texts(doc: &Document) -> Vec<String> {
        doc.blocks.iter().map(|b| b.content.logical_text()).collect()
    }

    fn para(text: &str) -> Node {
        Node::root(vec![Node::text(text)])
    }

    #[test]
    fn insert_undo_redo_keeps_order_key() {
        let mut doc = Document::from_roots([para("a"), para("c")]).unwrap();
        let a = doc.block_ids()[0];
        let mut cmd = InsertBlock::new(Some(a), para("b"));
        cmd.execute(&mut doc).unwrap();
        cmd.on_execute(&mut doc);
        let key = doc.block(cmd.id()).unwrap().order.clone();
        assert_eq!(texts(&doc), ["a", "b", "c"]);
        assert_eq!(doc.selection, Some(BlockSelection::caret(cmd.id(), 0)));

        cmd.undo(&mut doc).unwrap();
        assert_eq!(texts(&doc), ["a", "c"]);

        cmd.redo(&mut doc).unwrap();
        assert_eq!(texts(&doc), ["a", "b", "c"]);
        assert_eq!(doc.block(cmd.id()).unwrap().order, key);
    }

    #[test]
    fn insert_after_unknown_block_fails() {
        let mut doc = Document::from_roots([para("a")]).unwrap();
        let ghost = BlockId::new();
        let mut cmd = InsertBlock::new(Some(ghost), para("b"));
        assert_eq!(cmd.execute(&mut doc), Err(CommandError::BlockNotFound(ghost)));
        assert_eq!(texts(&doc), ["a"]);
    }

    #[test]
    fn remove_moves_caret_to_previous_block() {
        let mut doc = Document::from_roots([para("ab"), para("cd")]).unwrap();
        let ids = doc.block_ids();
        doc.selection = Some(BlockSelection::caret(ids[1], 1));

        let mut cmd = RemoveBlock::new(ids[1]);
        cmd.execute(&mut doc).unwrap();
        cmd.on_execute(&mut doc);
        assert_eq!(texts(&doc), ["ab"]);
        assert_eq!(doc.selection, Some(BlockSelection::caret(ids[0], 2)));

        cmd.undo(&mut doc).unwrap();
        cmd.on_undo(&mut doc);
        assert_eq!(texts(&doc), ["ab", "cd"]);
        assert_eq!(doc.selection, Some(BlockSelection::caret(ids[1], 1)));
    }
}
