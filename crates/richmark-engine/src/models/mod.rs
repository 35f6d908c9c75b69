pub mod block;
pub mod markup;
pub mod node;
pub mod order;

pub use block::{Block, BlockId, BlockList};
pub use markup::parse_markup;
pub use node::{Atomic, AtomicKind, Format, Node, OBJECT_REPLACEMENT, Side, Wrapper};
pub use order::create_order_string;
