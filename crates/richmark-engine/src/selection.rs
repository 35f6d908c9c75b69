//! Conversion between bias intervals and two-endpoint selections.

use serde::{Deserialize, Serialize};

use crate::error::PositionError;
use crate::models::Node;
use crate::position::{Location, bias_to_location, location_to_bias};

/// Half-open bias interval `[start, end)`.
///
/// Constructors keep `start <= end`. A literal with `start > end` is treated
/// as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    /// Builds an interval from two endpoints in either order.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_collapsed(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, bias: usize) -> bool {
        self.start <= bias && bias < self.end
    }
}

/// A selection as two concrete tree locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: Location,
    pub end: Location,
}

/// `None` when either endpoint lies beyond the tree.
pub fn interval_to_range(root: &Node, interval: Interval) -> Option<SelectionRange> {
    Some(SelectionRange {
        start: bias_to_location(root, interval.start)?,
        end: bias_to_location(root, interval.end)?,
    })
}

/// Endpoints are ordered, so a backwards selection gives a forward interval.
pub fn range_to_interval(root: &Node, range: &SelectionRange) -> Result<Interval, PositionError> {
    let a = location_to_bias(root, &range.start)?;
    let b = location_to_bias(root, &range.end)?;
    Ok(Interval::new(a, b))
}

/// Tokens covered by `range`.
pub fn token_between(root: &Node, range: &SelectionRange) -> Result<usize, PositionError> {
    range_to_interval(root, range).map(|iv| iv.len())
}
