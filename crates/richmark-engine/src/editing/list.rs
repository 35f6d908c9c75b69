//! # Composite Commands
//!
//! A [`ListCommand`] runs a sequence of sub-commands as one undo step. Each
//! sub-command is produced lazily from the payload, a scratch value shared
//! between steps, and the document as left by the previous steps, so later
//! steps can depend on what earlier ones did.
//!
//! ```rust
//! # use richmark_engine::editing::{Document, History, InsertInline, DeleteText, ListCommandBuilder, Step};
//! # use richmark_engine::models::{Atomic, AtomicKind, Node, parse_markup};
//! # use richmark_engine::position::Direction;
//! # use richmark_engine::selection::Interval;
//! let mut doc = Document::from_roots([parse_markup("see x+y here", false)]).unwrap();
//! let block = doc.block_ids()[0];
//!
//! let replace = ListCommandBuilder::<Interval, ()>::new("Insert formula", Interval::new(4, 7))
//!     .add_lazy_command(move |iv, _, _| Ok(Step::Run(Box::new(DeleteText::new(block, *iv, Direction::Forward)))))
//!     .add_lazy_command(move |iv, _, _| {
//!         let formula = Node::atomic(Atomic::new(AtomicKind::Formula, "x+y"));
//!         Ok(Step::Run(Box::new(InsertInline::new(block, iv.start, formula))))
//!     })
//!     .build();
//!
//! let mut history = History::default();
//! history.execute(&mut doc, Box::new(replace)).unwrap();
//! assert_eq!(doc.root(block).unwrap().display_text(), "see $x+y$ here");
//! history.undo(&mut doc).unwrap();
//! assert_eq!(doc.root(block).unwrap().display_text(), "see x+y here");
//! ```

use std::any::Any;
use std::fmt;

use crate::editing::{Command, Document, Notification};
use crate::error::CommandError;

/// What a lazy step decided to do.
#[derive(Debug)]
pub enum Step {
    /// Execute this command and continue.
    Run(Box<dyn Command>),
    /// Execute this command, then stop the chain.
    RunThenStop(Box<dyn Command>),
    /// Nothing to do for this step.
    Skip,
    /// Stop the chain here.
    Stop,
}

type LazyStep<P, S> = Box<dyn FnMut(&P, &mut S, &Document) -> Result<Step, CommandError>>;

/// Collects lazy steps for a [`ListCommand`].
///
/// `P` is the immutable payload every step sees; `S` is scratch state, reset
/// to `S::default()` at the start of each execution.
pub struct ListCommandBuilder<P, S> {
    label: &'static str,
    payload: P,
    steps: Vec<LazyStep<P, S>>,
    rollback: bool,
}

impl<P: 'static, S: Default + 'static> ListCommandBuilder<P, S> {
    pub fn new(label: &'static str, payload: P) -> Self {
        Self {
            label,
            payload,
            steps: Vec::new(),
            rollback: false,
        }
    }

    pub fn add_lazy_command(
        mut self,
        step: impl FnMut(&P, &mut S, &Document) -> Result<Step, CommandError> + 'static,
    ) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// When enabled, a failing step first undoes the sub-commands that already
    /// ran. Off by default: earlier effects stay applied.
    pub fn rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback = rollback;
        self
    }

    pub fn build(self) -> ListCommand<P, S> {
        ListCommand {
            label: self.label,
            payload: self.payload,
            steps: self.steps,
            rollback: self.rollback,
            executed: Vec::new(),
            partial: false,
        }
    }
}

/// Sub-commands executed as one undo step. Built by [`ListCommandBuilder`].
pub struct ListCommand<P, S> {
    label: &'static str,
    payload: P,
    steps: Vec<LazyStep<P, S>>,
    rollback: bool,
    executed: Vec<Box<dyn Command>>,
    /// Set when the last execution failed with sub-commands left applied.
    partial: bool,
}

impl<P, S> fmt::Debug for ListCommand<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListCommand")
            .field("label", &self.label)
            .field("steps", &self.steps.len())
            .field("rollback", &self.rollback)
            .field("executed", &self.executed)
            .field("partial", &self.partial)
            .finish()
    }
}

impl<P, S> ListCommand<P, S> {
    /// Sub-commands realized by the last execution, in order.
    pub fn executed(&self) -> &[Box<dyn Command>] {
        &self.executed
    }

    fn abort(&mut self, doc: &mut Document, index: usize, err: CommandError) -> CommandError {
        if self.rollback {
            log::debug!(
                "`{}` failed at step {index}, rolling back {} sub-commands: {err}",
                self.label,
                self.executed.len()
            );
            for mut cmd in self.executed.drain(..).rev() {
                match cmd.undo(doc) {
                    Ok(()) => cmd.on_undo(doc),
                    Err(undo_err) => {
                        log::warn!("rollback of `{}` failed: {undo_err}", cmd.label());
                    }
                }
            }
        } else if !self.executed.is_empty() {
            log::warn!(
                "`{}` failed at step {index}; {} sub-commands stay applied: {err}",
                self.label,
                self.executed.len()
            );
            self.partial = true;
        }
        err
    }

    /// Undoes `executed` newest first. On failure the sub-commands
    /// already undone are re-applied, so the composite stays fully applied.
    fn undo_all(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        for index in (0..self.executed.len()).rev() {
            if let Err(err) = self.executed[index].undo(doc) {
                for cmd in &mut self.executed[index + 1..] {
                    match cmd.redo(doc) {
                        Ok(()) => cmd.on_execute(doc),
                        Err(redo_err) => log::warn!("re-applying `{}` failed: {redo_err}", cmd.label()),
                    }
                }
                return Err(err);
            }
            self.executed[index].on_undo(doc);
        }
        Ok(())
    }

    /// Replays `executed` in order. On failure the sub-commands already
    /// replayed are undone again, so the composite stays fully undone.
    fn redo_all(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        for index in 0..self.executed.len() {
            if let Err(err) = self.executed[index].redo(doc) {
                for cmd in self.executed[..index].iter_mut().rev() {
                    match cmd.undo(doc) {
                        Ok(()) => cmd.on_undo(doc),
                        Err(undo_err) => log::warn!("reverting `{}` failed: {undo_err}", cmd.label()),
                    }
                }
                return Err(err);
            }
            self.executed[index].on_execute(doc);
        }
        Ok(())
    }
}

impl<P: 'static, S: Default + 'static> Command for ListCommand<P, S> {
    fn label(&self) -> &'static str {
        self.label
    }

    fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        self.executed.clear();
        self.partial = false;
        let mut scratch = S::default();
        let mut failure = None;

        for (index, lazy) in self.steps.iter_mut().enumerate() {
            let step = match lazy(&self.payload, &mut scratch, doc) {
                Ok(step) => step,
                Err(err) => {
                    failure = Some((index, err));
                    break;
                }
            };
            let (mut cmd, stop) = match step {
                Step::Run(cmd) => (cmd, false),
                Step::RunThenStop(cmd) => (cmd, true),
                Step::Skip => continue,
                Step::Stop => break,
            };
            if let Err(err) = cmd.execute(doc) {
                failure = Some((index, err));
                break;
            }
            cmd.on_execute(doc);
            self.executed.push(cmd);
            if stop {
                break;
            }
        }

        match failure {
            Some((index, err)) => Err(self.abort(doc, index, err)),
            None => Ok(()),
        }
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        self.undo_all(doc)
    }

    /// Replays the realized sub-commands without re-running the lazy steps.
    fn redo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        self.redo_all(doc)
    }

    fn is_noop(&self) -> bool {
        self.executed.iter().all(|cmd| cmd.is_noop())
    }

    fn partially_applied(&self) -> bool {
        self.partial
    }

    fn notify_execute(&self, out: &mut Vec<Notification>) {
        for cmd in &self.executed {
            cmd.notify_execute(out);
        }
    }

    fn notify_undo(&self, out: &mut Vec<Notification>) {
        for cmd in self.executed.iter().rev() {
            cmd.notify_undo(out);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
