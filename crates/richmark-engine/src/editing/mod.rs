/*!
 * # Editing Core Module
 *
 * Every change to a [`Document`] is a [`Command`]: a value holding the inputs
 * it was built with plus a typed buffer that `execute` fills with exactly
 * what `undo` needs. Commands are submitted to a [`History`], which executes
 * them, coalesces adjacent ones, and keeps the undo/redo stacks.
 *
 * ## Architecture Overview
 *
 * ### 1. Positions are biases
 * - Commands address content by bias (see [`crate::position`]), never by
 *   tree coordinates that a previous edit may have invalidated
 * - The tree is resolved to a concrete location only at execution time
 *
 * ### 2. Snapshot buffers
 * - Each tree mutation captures the smallest subtree it touches before
 *   changing it; `undo` restores those subtrees newest first
 * - A mutation that fails part-way restores its own snapshot, so a failed
 *   `execute` leaves the block untouched
 *
 * ### 3. Coalescing
 * - `try_merge` lets the previous command absorb a new one: typing a word
 *   or holding backspace undoes in one step, bounded by [`MergePolicy`]
 *
 * ### 4. Composites
 * - [`ListCommandBuilder`] sequences lazily built sub-commands into one undo
 *   step; each step sees the document as left by the previous ones
 *
 * ## Module Structure
 *
 * - **`document`**: `Document` (blocks plus selection) and `BlockSelection`
 * - **`command`**: the `Command` trait, `MergePolicy` and notifications
 * - **`history`**: `History` with undo/redo stacks and listeners
 * - **`list`**: composite commands
 * - **`text`**, **`inline`**, **`select`**, **`block`**: concrete commands
 * - **`surgery`**: tree mutations shared by the concrete commands
 *
 * ## Usage Pattern
 *
 * ```rust
 * use richmark_engine::editing::*;
 * use richmark_engine::models::parse_markup;
 * use richmark_engine::position::Direction;
 * use richmark_engine::selection::Interval;
 *
 * let mut doc = Document::from_roots([parse_markup("Lor**e*a*sd**m", true)]).unwrap();
 * let block = doc.block_ids()[0];
 * let mut history = History::default();
 *
 * history
 *     .execute(&mut doc, Box::new(DeleteText::new(block, Interval::new(5, 9), Direction::Forward)))
 *     .unwrap();
 * assert_eq!(doc.root(block).unwrap().display_text(), "Lor**ed**m");
 *
 * history.undo(&mut doc).unwrap();
 * assert_eq!(doc.root(block).unwrap().display_text(), "Lor**e*a*sd**m");
 * ```
 */

pub mod block;
pub mod command;
pub mod document;
pub mod history;
pub mod inline;
pub mod list;
pub mod select;
pub(crate) mod surgery;
pub mod text;

pub use block::{InsertBlock, RemoveBlock};
pub use command::{ChangeKind, Command, MergePolicy, Notification};
pub use document::{BlockSelection, Document};
pub use history::{History, HistoryOptions, Submitted};
pub use inline::{InsertInline, SetHints, WrapFormat};
pub use list::{ListCommand, ListCommandBuilder, Step};
pub use select::SetSelection;
pub use text::{DeleteText, InsertText};
