use std::fmt;

use crate::editing::{Command, Document, MergePolicy, Notification};
use crate::error::CommandError;

/// Tuning for a [`History`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Undo entries kept; the oldest are dropped beyond this.
    pub max_depth: usize,
    pub merge: MergePolicy,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_depth: 200,
            merge: MergePolicy::default(),
        }
    }
}

/// What became of a submitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// Recorded as a new undo step.
    Pushed,
    /// Absorbed into the previous undo step.
    Merged,
    /// Executed without changing the document; nothing was recorded.
    Unchanged,
}

type Listener = Box<dyn FnMut(&Notification)>;

/// Linear undo/redo over one [`Document`].
///
/// Owned explicitly by the editor; nothing here is global.
pub struct History {
    undo: Vec<Box<dyn Command>>,
    redo: Vec<Box<dyn Command>>,
    options: HistoryOptions,
    listeners: Vec<Listener>,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo", &self.undo)
            .field("redo", &self.redo)
            .field("options", &self.options)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryOptions::default())
    }
}

impl History {
    pub fn new(options: HistoryOptions) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            options,
            listeners: Vec::new(),
        }
    }

    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// Registers a listener for the notifications commands emit.
    pub fn subscribe(&mut self, listener: impl FnMut(&Notification) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&'static str> {
        self.undo.last().map(|c| c.label())
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.redo.last().map(|c| c.label())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Executes `cmd` and records it, merging into the previous step when
    /// that step accepts it.
    ///
    /// A failing command is not recorded and leaves the redo stack alone,
    /// unless it reports partial effects: then it becomes an undo step of its
    /// own before the error is returned, so earlier steps still undo cleanly.
    pub fn execute(&mut self, doc: &mut Document, mut cmd: Box<dyn Command>) -> Result<Submitted, CommandError> {
        if let Err(err) = cmd.execute(doc) {
            if cmd.partially_applied() {
                log::warn!("`{}` failed part-way, recording its applied effects: {err}", cmd.label());
                self.emit(|out| cmd.notify_execute(out));
                self.redo.clear();
                self.push(cmd);
            }
            return Err(err);
        }
        if cmd.is_noop() {
            log::debug!("`{}` changed nothing, not recorded", cmd.label());
            return Ok(Submitted::Unchanged);
        }
        cmd.on_execute(doc);
        self.emit(|out| cmd.notify_execute(out));
        self.redo.clear();

        let policy = self.options.merge;
        if let Some(top) = self.undo.last_mut() {
            if top.try_merge(cmd.as_ref(), &policy) {
                log::debug!("merged `{}` into `{}`", cmd.label(), top.label());
                return Ok(Submitted::Merged);
            }
        }

        self.push(cmd);
        Ok(Submitted::Pushed)
    }

    fn push(&mut self, cmd: Box<dyn Command>) {
        log::debug!("pushed `{}` (undo depth {})", cmd.label(), self.undo.len() + 1);
        self.undo.push(cmd);
        if self.undo.len() > self.options.max_depth {
            let excess = self.undo.len() - self.options.max_depth;
            self.undo.drain(..excess);
            log::debug!("dropped {excess} oldest undo steps");
        }
    }

    /// Reverts the latest step. `Ok(false)` when there is nothing to undo.
    ///
    /// If the command fails to undo it stays on the undo stack.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, CommandError> {
        let Some(mut cmd) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(err) = cmd.undo(doc) {
            log::debug!("undo of `{}` failed: {err}", cmd.label());
            self.undo.push(cmd);
            return Err(err);
        }
        cmd.on_undo(doc);
        self.emit(|out| cmd.notify_undo(out));
        log::debug!("undid `{}`", cmd.label());
        self.redo.push(cmd);
        Ok(true)
    }

    /// Re-applies the latest undone step. `Ok(false)` when there is nothing
    /// to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, CommandError> {
        let Some(mut cmd) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(err) = cmd.redo(doc) {
            log::debug!("redo of `{}` failed: {err}", cmd.label());
            self.redo.push(cmd);
            return Err(err);
        }
        cmd.on_execute(doc);
        self.emit(|out| cmd.notify_execute(out));
        log::debug!("redid `{}`", cmd.label());
        self.undo.push(cmd);
        Ok(true)
    }

    fn emit(&mut self, collect: impl FnOnce(&mut Vec<Notification>)) {
        if self.listeners.is_empty() {
            return;
        }
        let mut out = Vec::new();
        collect(&mut out);
        for notification in &out {
            for listener in &mut self.listeners {
                listener(notification);
            }
        }
    }
}
