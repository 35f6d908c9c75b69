//! Core of the richmark block editor: the inline tree model, token
//! positions, and reversible commands with undo history.

pub mod editing;
pub mod error;
pub mod models;
pub mod position;
pub mod selection;

// Re-export key types for easier usage
pub use editing::{BlockSelection, Command, Document, History, HistoryOptions, ListCommandBuilder, MergePolicy, Step};
pub use error::{CommandError, OrderKeyError, PositionError};
pub use models::{Block, BlockId, BlockList, Node, create_order_string, parse_markup};
pub use position::{Location, Placement, bias_to_location, location_to_bias, token_size};
pub use selection::{Interval, SelectionRange};
