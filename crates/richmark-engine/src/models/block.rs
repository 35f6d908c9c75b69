use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderKeyError;
use crate::models::{Node, create_order_string};

/// Stable identifier of a block, independent of its position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One editable region: an inline tree plus its order key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Lexicographic position among sibling blocks.
    pub order: String,
    pub content: Node,
}

#[derive(Debug, Clone)]
struct Link {
    block: Block,
    prev: Option<BlockId>,
    next: Option<BlockId>,
}

/// Doubly linked sequence of blocks keyed by [`BlockId`].
///
/// Order keys are assigned on insert and move only; neighbours keep theirs.
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    links: HashMap<BlockId, Link>,
    head: Option<BlockId>,
    tail: Option<BlockId>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn first(&self) -> Option<BlockId> {
        self.head
    }

    pub fn last(&self) -> Option<BlockId> {
        self.tail
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.links.get(&id).map(|l| &l.block)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.links.get_mut(&id).map(|l| &mut l.block)
    }

    pub fn prev(&self, id: BlockId) -> Option<BlockId> {
        self.links.get(&id)?.prev
    }

    pub fn next(&self, id: BlockId) -> Option<BlockId> {
        self.links.get(&id)?.next
    }

    /// Blocks in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        std::iter::successors(self.head, move |id| self.next(*id))
            .filter_map(move |id| self.get(id))
    }

    pub fn push_back(&mut self, content: Node) -> Result<BlockId, OrderKeyError> {
        self.insert_after(self.tail, BlockId::new(), content)
    }

    /// Inserts a new block after `anchor` (`None` inserts at the head).
    pub fn insert_after(
        &mut self,
        anchor: Option<BlockId>,
        id: BlockId,
        content: Node,
    ) -> Result<BlockId, OrderKeyError> {
        let next = match anchor {
            Some(a) => self.next(a),
            None => self.head,
        };
        let order = self.key_between(anchor, next)?;
        self.link(
            Block { id, order, content },
            anchor,
        );
        Ok(id)
    }

    /// Re-links a block that was removed, keeping its id and order key.
    ///
    /// The key is still valid as long as the neighbours it was removed from
    /// are the ones it is restored between.
    pub fn restore(&mut self, block: Block, anchor: Option<BlockId>) {
        self.link(block, anchor);
    }

    /// Unlinks a block, returning it with the id of the block that preceded it.
    pub fn remove(&mut self, id: BlockId) -> Option<(Block, Option<BlockId>)> {
        let link = self.links.remove(&id)?;
        match link.prev {
            Some(p) => {
                if let Some(prev) = self.links.get_mut(&p) {
                    prev.next = link.next;
                }
            }
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => {
                if let Some(next) = self.links.get_mut(&n) {
                    next.prev = link.prev;
                }
            }
            None => self.tail = link.prev,
        }
        Some((link.block, link.prev))
    }

    /// Moves `id` after `anchor`, re-keying only the moved block.
    pub fn move_after(&mut self, id: BlockId, anchor: Option<BlockId>) -> Result<bool, OrderKeyError> {
        if anchor == Some(id) {
            return Ok(false);
        }
        let Some((mut block, prev)) = self.remove(id) else {
            return Ok(false);
        };
        let next = match anchor {
            Some(a) => self.next(a),
            None => self.head,
        };
        match self.key_between(anchor, next) {
            Ok(order) => {
                block.order = order;
                self.link(block, anchor);
                Ok(true)
            }
            Err(err) => {
                self.link(block, prev);
                Err(err)
            }
        }
    }

    fn key_between(&self, prev: Option<BlockId>, next: Option<BlockId>) -> Result<String, OrderKeyError> {
        let prev_key = prev.and_then(|p| self.get(p)).map(|b| b.order.as_str());
        let next_key = next.and_then(|n| self.get(n)).map(|b| b.order.as_str());
        create_order_string(prev_key, next_key)
    }

    fn link(&mut self, block: Block, anchor: Option<BlockId>) {
        let id = block.id;
        let anchor = anchor.filter(|a| self.links.contains_key(a));
        let next = match anchor {
            Some(a) => self.next(a),
            None => self.head,
        };
        match anchor {
            Some(a) => {
                if let Some(prev) = self.links.get_mut(&a) {
                    prev.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        match next {
            Some(n) => {
                if let Some(after) = self.links.get_mut(&n) {
                    after.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.links.insert(
            id,
            Link {
                block,
                prev: anchor,
                next,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered_texts(list: &BlockList) -> Vec<String> {
        list.iter().map(|b| b.content.logical_text()).collect()
    }

    fn keys_ascending(list: &BlockList) -> bool {
        let keys: Vec<&str> = list.iter().map(|b| b.order.as_str()).collect();
        keys.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn push_back_keeps_document_order() {
        let mut list = BlockList::new();
        for text in ["one", "two", "three"] {
            list.push_back(Node::root(vec![Node::text(text)])).unwrap();
        }
        assert_eq!(ordered_texts(&list), ["one", "two", "three"]);
        assert!(keys_ascending(&list));
    }

    #[test]
    fn insert_between_does_not_rekey_neighbours() {
        let mut list = BlockList::new();
        let a = list.push_back(Node::root(vec![Node::text("a")])).unwrap();
        let c = list.push_back(Node::root(vec![Node::text("c")])).unwrap();
        let before: Vec<String> = list.iter().map(|b| b.order.clone()).collect();

        list.insert_after(Some(a), BlockId::new(), Node::root(vec![Node::text("b")]))
            .unwrap();

        assert_eq!(ordered_texts(&list), ["a", "b", "c"]);
        assert_eq!(list.get(a).unwrap().order, before[0]);
        assert_eq!(list.get(c).unwrap().order, before[1]);
        assert!(keys_ascending(&list));
    }

    #[test]
    fn insert_at_head() {
        let mut list = BlockList::new();
        list.push_back(Node::root(vec![Node::text("b")])).unwrap();
        let a = list
            .insert_after(None, BlockId::new(), Node::root(vec![Node::text("a")]))
            .unwrap();
        assert_eq!(list.first(), Some(a));
        assert_eq!(ordered_texts(&list), ["a", "b"]);
        assert!(keys_ascending(&list));
    }

    #[test]
    fn remove_and_restore_round_trip() {
        let mut list = BlockList::new();
        let a = list.push_back(Node::root(vec![Node::text("a")])).unwrap();
        let b = list.push_back(Node::root(vec![Node::text("b")])).unwrap();
        list.push_back(Node::root(vec![Node::text("c")])).unwrap();

        let (block, prev) = list.remove(b).unwrap();
        assert_eq!(prev, Some(a));
        assert_eq!(ordered_texts(&list), ["a", "c"]);

        list.restore(block, prev);
        assert_eq!(ordered_texts(&list), ["a", "b", "c"]);
        assert!(keys_ascending(&list));
    }

    #[test]
    fn move_after_rekeys_only_moved_block() {
        let mut list = BlockList::new();
        let a = list.push_back(Node::root(vec![Node::text("a")])).unwrap();
        let b = list.push_back(Node::root(vec![Node::text("b")])).unwrap();
        let c = list.push_back(Node::root(vec![Node::text("c")])).unwrap();
        let (key_a, key_b) = (list.get(a).unwrap().order.clone(), list.get(b).unwrap().order.clone());

        assert!(list.move_after(c, Some(a)).unwrap());

        assert_eq!(ordered_texts(&list), ["a", "c", "b"]);
        assert_eq!(list.get(a).unwrap().order, key_a);
        assert_eq!(list.get(b).unwrap().order, key_b);
        assert_eq!(list.last(), Some(b));
        assert!(keys_ascending(&list));
    }
}
