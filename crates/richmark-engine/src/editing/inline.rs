use std::any::Any;

use crate::editing::command::{SelectionMemo, notification};
use crate::editing::surgery::{self, Snapshot};
use crate::editing::{BlockSelection, ChangeKind, Command, Document, Notification};
use crate::error::CommandError;
use crate::models::{BlockId, Format, Node};
use crate::position::{Placement, bias_for_logical, logical_offset, token_size};
use crate::selection::Interval;

/// Inserts an atomic object or a wrapper at a bias, splitting the text run
/// the bias falls into.
#[derive(Debug, Clone)]
pub struct InsertInline {
    block: BlockId,
    bias: usize,
    node: Node,
    snapshot: Option<Snapshot>,
    memo: SelectionMemo,
}

impl InsertInline {
    pub fn new(block: BlockId, bias: usize, node: Node) -> Self {
        Self {
            block,
            bias,
            node,
            snapshot: None,
            memo: SelectionMemo::default(),
        }
    }
}

impl Command for InsertInline {
    fn label(&self) -> &'static str {
        "Insert inline"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let before = doc.selection;
        let root = doc.root_mut(self.block)?;
        self.snapshot = Some(surgery::insert_node(root, self.bias, self.node.clone())?);
        let after = BlockSelection::caret(self.block, self.bias + token_size(&self.node));
        self.memo = SelectionMemo {
            before,
            after: Some(after),
        };
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let snapshot = self.snapshot.as_ref().ok_or(CommandError::NotExecuted {
            label: "Insert inline",
        })?;
        snapshot.restore(doc.root_mut(self.block)?)
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

/// Wraps an interval in a new formatting wrapper.
///
/// A collapsed interval creates an empty wrapper and leaves the caret inside
/// it, so the next insert types formatted text.
#[derive(Debug, Clone)]
pub struct WrapFormat {
    block: BlockId,
    interval: Interval,
    format: Format,
    hints: bool,
    snapshot: Option<Snapshot>,
    memo: SelectionMemo,
}

impl WrapFormat {
    pub fn new(block: BlockId, interval: Interval, format: Format, hints: bool) -> Self {
        Self {
            block,
            interval: Interval::new(interval.start, interval.end),
            format,
            hints,
            snapshot: None,
            memo: SelectionMemo::default(),
        }
    }
}

impl Command for WrapFormat {
    fn label(&self) -> &'static str {
        "Format"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let before = doc.selection;
        let root = doc.root_mut(self.block)?;
        let hint = usize::from(self.hints && self.format != Format::Root);
        let Interval { start, end } = self.interval;
        let after = if self.interval.is_collapsed() {
            let empty = Node::wrap(self.format.clone(), self.hints, Vec::new());
            self.snapshot = Some(surgery::insert_node(root, start, empty)?);
            BlockSelection {
                placement: Placement::Enter,
                ..BlockSelection::caret(self.block, start + hint)
            }
        } else {
            self.snapshot = Some(surgery::wrap_range(
                root,
                self.interval,
                self.format.clone(),
                self.hints,
            )?);
            BlockSelection::new(self.block, Interval::new(start + hint, end + hint))
        };
        self.memo = SelectionMemo {
            before,
            after: Some(after),
        };
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or(CommandError::NotExecuted { label: "Format" })?;
        snapshot.restore(doc.root_mut(self.block)?)
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

/// Shows or hides the markdown delimiters of every wrapper in a block.
///
/// Hints change the token count but never the logical text, so a selection
/// in this block is carried across through logical offsets.
#[derive(Debug, Clone)]
pub struct SetHints {
    block: BlockId,
    visible: bool,
    previous: Option<Vec<(Vec<usize>, bool)>>,
    memo: SelectionMemo,
}

impl SetHints {
    pub fn new(block: BlockId, visible: bool) -> Self {
        Self {
            block,
            visible,
            previous: None,
            memo: SelectionMemo::default(),
        }
    }
}

impl Command for SetHints {
    fn label(&self) -> &'static str {
        if self.visible { "Show hints" } else { "Hide hints" }
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let before = doc.selection;
        let root = doc.root_mut(self.block)?;
        let logical = before
            .filter(|s| s.block == self.block)
            .map(|s| (logical_offset(root, s.interval.start), logical_offset(root, s.interval.end)));

        self.previous = Some(surgery::set_hints(root, self.visible));

        let after = match (before, logical) {
            (Some(sel), Some((start, end))) => {
                let start = bias_for_logical(root, start).unwrap_or(0);
                let end = bias_for_logical(root, end).unwrap_or(start);
                Some(BlockSelection::new(sel.block, Interval::new(start, end)))
            }
            (other, _) => other,
        };
        self.memo = SelectionMemo { before, after };
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        let label = self.label();
        let previous = self
            .previous
            .as_ref()
            .ok_or(CommandError::NotExecuted { label })?;
        surgery::restore_hints(doc.root_mut(self.block)?, previous)
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Atomic, AtomicKind, parse_markup};

    fn doc_with(markup: &str, hints: bool) -> (Document, BlockId) {
        let doc = Document::from_roots([parse_markup(markup, hints)]).unwrap();
        let id = doc.block_ids()[0];
        (doc, id)
    }

    fn run(cmd: &mut dyn Command, doc: &mut Document) {
        cmd.execute(doc).unwrap();
        cmd.on_execute(doc);
    }

    #[test]
    fn inline_object_splits_text_and_moves_caret() {
        let (mut doc, id) = doc_with("abcd", false);
        let formula = Node::atomic(Atomic::new(AtomicKind::Formula, "x").with_footprint(2));
        let mut cmd = InsertInline::new(id, 2, formula);
        run(&mut cmd, &mut doc);
        assert_eq!(doc.root(id).unwrap().display_text(), "ab$x$cd");
        assert_eq!(doc.selection, Some(BlockSelection::caret(id, 4)));

        cmd.undo(&mut doc).unwrap();
        assert_eq!(doc.root(id).unwrap(), &parse_markup("abcd", false));
    }

    #[test]
    fn inline_inside_object_is_refused() {
        let root = Node::root(vec![Node::atomic(
            Atomic::new(AtomicKind::Kbd, "Ctrl").with_footprint(3),
        )]);
        let mut doc = Document::from_roots([root]).unwrap();
        let id = doc.block_ids()[0];
        let mut cmd = InsertInline::new(id, 1, Node::text("x"));
        assert_eq!(
            cmd.execute(&mut doc),
            Err(CommandError::InsideAtomic { path: vec![0] })
        );
    }

    #[test]
    fn empty_format_places_caret_inside() {
        let (mut doc, id) = doc_with("ab", false);
        let mut wrap = WrapFormat::new(id, Interval::collapsed(1), Format::Bold, false);
        run(&mut wrap, &mut doc);
        let selection = doc.selection.unwrap();
        assert_eq!(selection.placement, Placement::Enter);

        let mut typing = crate::editing::InsertText::at_caret(&selection, "X");
        run(&mut typing, &mut doc);
        assert_eq!(doc.root(id).unwrap(), &parse_markup("a**X**b", false));
    }

    #[test]
    fn wrap_selects_wrapped_content() {
        let (mut doc, id) = doc_with("abcd", true);
        let mut wrap = WrapFormat::new(id, Interval::new(1, 3), Format::Italic, true);
        run(&mut wrap, &mut doc);
        assert_eq!(doc.root(id).unwrap().display_text(), "a*bc*d");
        assert_eq!(doc.selection, Some(BlockSelection::new(id, Interval::new(2, 4))));

        wrap.undo(&mut doc).unwrap();
        wrap.on_undo(&mut doc);
        assert_eq!(doc.root(id).unwrap().display_text(), "abcd");
        assert_eq!(doc.selection, None);
    }

    #[test]
    fn hiding_hints_remaps_selection() {
        let (mut doc, id) = doc_with("a**bc**d", true);
        doc.selection = Some(BlockSelection::new(id, Interval::new(3, 6)));
        let mut cmd = SetHints::new(id, false);
        run(&mut cmd, &mut doc);
        assert_eq!(doc.root(id).unwrap().display_text(), "abcd");
        assert_eq!(doc.selection, Some(BlockSelection::new(id, Interval::new(2, 4))));

        cmd.undo(&mut doc).unwrap();
        cmd.on_undo(&mut doc);
        assert_eq!(doc.root(id).unwrap().display_text(), "a**bc**d");
        assert_eq!(doc.selection, Some(BlockSelection::new(id, Interval::new(3, 6))));
    }
}
