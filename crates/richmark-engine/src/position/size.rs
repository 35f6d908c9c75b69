use crate::models::Node;
use crate::position::filter::{AllTokens, TokenFilter, Visibility};

/// Total tokens in `node`: characters, hint sides and atomic footprints.
pub fn token_size(node: &Node) -> usize {
    token_size_with(node, &AllTokens)
}

pub fn token_size_with<F: TokenFilter + ?Sized>(node: &Node, filter: &F) -> usize {
    let mut path = Vec::new();
    size_at(node, &mut path, filter)
}

/// Tokens inside `node`, excluding its own hints or footprint.
///
/// For an atomic object this is the size of its internal content.
pub fn inner_token_size(node: &Node) -> usize {
    let mut path = Vec::new();
    match node {
        Node::Text(t) => t.chars().count(),
        Node::Wrapper(w) => children_size(&w.children, &mut path, &AllTokens),
        Node::Atomic(a) => children_size(&a.content, &mut path, &AllTokens),
    }
}

/// Size of the node at `path`, with `path` relative to the filter's root.
pub(crate) fn size_at<F: TokenFilter + ?Sized>(node: &Node, path: &mut Vec<usize>, filter: &F) -> usize {
    let visibility = filter.visibility(path, node);
    match (node, visibility) {
        (_, Visibility::Hidden) => 0,
        (Node::Text(t), _) => t.chars().count(),
        (Node::Wrapper(w), _) => 2 * w.hint_width() + children_size(&w.children, path, filter),
        (Node::Atomic(a), Visibility::Enter) => children_size(&a.content, path, filter),
        (Node::Atomic(a), Visibility::Visible) => a.footprint,
    }
}

pub(crate) fn children_size<F: TokenFilter + ?Sized>(
    children: &[Node],
    path: &mut Vec<usize>,
    filter: &F,
) -> usize {
    let mut total = 0;
    for (i, child) in children.iter().enumerate() {
        path.push(i);
        total += size_at(child, path, filter);
        path.pop();
    }
    total
}
