//! # Token Positions
//!
//! A position inside a block is a single integer, the *bias*: the number of
//! tokens before it. Characters, materialized hint sides and atomic object
//! footprints each count as tokens, so a bias survives any restructuring that
//! keeps the token sequence (splitting or merging text runs, for instance).
//!
//! A [`Location`] is the concrete tree coordinate for a bias. Text containers
//! use character offsets, wrappers use child indices, and a non-entered atomic
//! object uses its interior footprint offsets. Several locations can denote
//! the same bias; exactly one is canonical (see [`bias_to_location_with`]).

use serde::{Deserialize, Serialize};

pub mod filter;
pub mod locate;
pub mod size;
pub mod tokens;

pub use filter::{AllTokens, EnterAtomic, TokenFilter, Visibility};
pub use locate::{
    bias_to_location, bias_to_location_with, canonicalize, location_to_bias, location_to_bias_with,
    offset_after, offset_after_with,
};
pub use size::{inner_token_size, token_size, token_size_with};
pub use tokens::{Token, bias_for_logical, logical_offset, tokens, word_offset};

/// Container path plus local offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Child indices from the block root to the container.
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Location {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Tie-break used when a bias sits at the edge of an empty wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Resolve to the surrounding text, as cursor movement does.
    #[default]
    Outer,
    /// Resolve into the deepest empty wrapper, as typing into a freshly
    /// created format does.
    Enter,
}

/// Direction of a motion or a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Backward,
    Forward,
}
