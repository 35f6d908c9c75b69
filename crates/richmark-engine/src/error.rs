use thiserror::Error;

use crate::models::BlockId;

/// A location or bias that does not fit the tree it was resolved against.
///
/// These indicate that the caller and the tree have gone out of sync; an
/// out-of-range bias on its own is reported as `None` by the resolver and only
/// becomes an error when a command needs a concrete location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("no container at path {path:?}")]
    MissingContainer { path: Vec<usize> },

    #[error("container at path {path:?} is hidden by the token filter")]
    HiddenContainer { path: Vec<usize> },

    #[error("offset {offset} is out of range for container at {path:?} (max {max})")]
    OffsetOutOfRange {
        path: Vec<usize>,
        offset: usize,
        max: usize,
    },

    #[error("bias {bias} is beyond the {size} tokens of this tree")]
    BiasOutOfRange { bias: usize, size: usize },
}

/// Order keys that cannot produce a neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderKeyError {
    #[error("order key `{prev}` must sort strictly before `{next}`")]
    Unordered { prev: String, next: String },

    #[error("order key `{0}` contains characters outside a..=z")]
    InvalidKey(String),

    #[error("no order key sorts before `{0}`")]
    NoRoomBefore(String),
}

/// Failure while executing, undoing or redoing a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    OrderKey(#[from] OrderKeyError),

    #[error("tokens {start}..{end} would split the atomic object at {path:?}")]
    SplitsAtomic {
        path: Vec<usize>,
        start: usize,
        end: usize,
    },

    #[error("cannot insert inside the atomic object at {path:?}")]
    InsideAtomic { path: Vec<usize> },

    #[error("tokens {start}..{end} cross a formatting boundary")]
    CrossesBoundary { start: usize, end: usize },

    #[error("`{label}` cannot be undone before it has executed")]
    NotExecuted { label: &'static str },
}
