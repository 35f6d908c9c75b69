use crate::models::Node;

/// How a node takes part in token counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Counted normally; atomic objects stay opaque.
    #[default]
    Visible,
    /// Contributes no tokens and no locations.
    Hidden,
    /// For atomic objects: walk the internal content instead of the footprint.
    /// Same as `Visible` for other nodes.
    Enter,
}

/// Decides, per node, whether it is counted, skipped or entered.
///
/// `path` is relative to the root handed to the position functions.
pub trait TokenFilter {
    fn visibility(&self, path: &[usize], node: &Node) -> Visibility;
}

impl<F> TokenFilter for F
where
    F: Fn(&[usize], &Node) -> Visibility,
{
    fn visibility(&self, path: &[usize], node: &Node) -> Visibility {
        self(path, node)
    }
}

/// Counts every node normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllTokens;

impl TokenFilter for AllTokens {
    fn visibility(&self, _path: &[usize], _node: &Node) -> Visibility {
        Visibility::Visible
    }
}

/// Enters the atomic object at `path`; every other node stays visible.
///
/// To address positions inside an object without counting its siblings, pass
/// the object itself as the root with an empty `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterAtomic {
    pub path: Vec<usize>,
}

impl TokenFilter for EnterAtomic {
    fn visibility(&self, path: &[usize], node: &Node) -> Visibility {
        if path == self.path.as_slice() && matches!(node, Node::Atomic(_)) {
            Visibility::Enter
        } else {
            Visibility::Visible
        }
    }
}
