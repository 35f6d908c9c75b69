use crate::error::{CommandError, OrderKeyError};
use crate::models::{Block, BlockId, BlockList, Node};
use crate::position::Placement;
use crate::selection::Interval;

/// Cursor or selection inside one block, as a bias interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSelection {
    pub block: BlockId,
    pub interval: Interval,
    /// How the caret resolves at the edge of an empty wrapper. Set to
    /// `Placement::Enter` right after an empty format has been created.
    pub placement: Placement,
}

impl BlockSelection {
    pub fn new(block: BlockId, interval: Interval) -> Self {
        Self {
            block,
            interval: Interval::new(interval.start, interval.end),
            placement: Placement::Outer,
        }
    }

    pub fn caret(block: BlockId, bias: usize) -> Self {
        Self::new(block, Interval::collapsed(bias))
    }
}

/// The editable state commands operate on: ordered blocks plus the
/// current selection.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub blocks: BlockList,
    pub selection: Option<BlockSelection>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document with one block per root, in order.
    pub fn from_roots(roots: impl IntoIterator<Item = Node>) -> Result<Self, OrderKeyError> {
        let mut blocks = BlockList::new();
        for root in roots {
            blocks.push_back(root)?;
        }
        Ok(Self {
            blocks,
            selection: None,
        })
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, CommandError> {
        self.blocks.get(id).ok_or(CommandError::BlockNotFound(id))
    }

    /// Inline tree of block `id`.
    pub fn root(&self, id: BlockId) -> Result<&Node, CommandError> {
        self.block(id).map(|b| &b.content)
    }

    pub fn root_mut(&mut self, id: BlockId) -> Result<&mut Node, CommandError> {
        self.blocks
            .get_mut(id)
            .map(|b| &mut b.content)
            .ok_or(CommandError::BlockNotFound(id))
    }

    /// Ids of all blocks in document order.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }
}
