//! Tree mutations shared by the concrete commands.
//!
//! Every mutation first takes a [`Snapshot`] of the smallest subtree it will
//! touch and returns it; restoring the snapshot is the whole of `undo`.

use crate::error::{CommandError, PositionError};
use crate::models::{Format, Node};
use crate::position::locate::{Candidate, CandidateKind, candidates, node_start_bias};
use crate::position::{AllTokens, Location, Placement, Token, bias_to_location_with, token_size, tokens};
use crate::selection::Interval;

/// Copy of the subtree at `path`, taken before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub path: Vec<usize>,
    pub node: Node,
}

impl Snapshot {
    pub fn take(root: &Node, path: &[usize]) -> Result<Self, CommandError> {
        let node = root.get(path).cloned().ok_or_else(|| missing(path))?;
        Ok(Self {
            path: path.to_vec(),
            node,
        })
    }

    pub fn restore(&self, root: &mut Node) -> Result<(), CommandError> {
        let slot = root.get_mut(&self.path).ok_or_else(|| missing(&self.path))?;
        *slot = self.node.clone();
        Ok(())
    }
}

/// Restores `snapshots` newest first, undoing the mutations that produced
/// them in order.
pub(crate) fn restore_all<'a>(
    root: &mut Node,
    snapshots: impl IntoIterator<Item = &'a Snapshot, IntoIter: DoubleEndedIterator>,
) -> Result<(), CommandError> {
    for snapshot in snapshots.into_iter().rev() {
        snapshot.restore(root)?;
    }
    Ok(())
}

fn missing(path: &[usize]) -> CommandError {
    PositionError::MissingContainer { path: path.to_vec() }.into()
}

fn resolve(root: &Node, bias: usize, placement: Placement) -> Result<Location, CommandError> {
    bias_to_location_with(root, bias, &AllTokens, placement).ok_or_else(|| {
        PositionError::BiasOutOfRange {
            bias,
            size: token_size(root),
        }
        .into()
    })
}

fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

/// Splits the text child at `index` at char `offset`, returning the child
/// index of the boundary. Splits at either end are no-ops.
pub(crate) fn split_text(children: &mut Vec<Node>, index: usize, offset: usize) -> usize {
    let Some(Node::Text(text)) = children.get_mut(index) else {
        return index;
    };
    if offset == 0 {
        return index;
    }
    if offset >= text.chars().count() {
        return index + 1;
    }
    let right = text.split_off(byte_index(text, offset));
    children.insert(index + 1, Node::Text(right));
    index + 1
}

/// Inserts `text` at `bias`.
pub(crate) fn insert_text(
    root: &mut Node,
    bias: usize,
    text: &str,
    placement: Placement,
) -> Result<Snapshot, CommandError> {
    let loc = resolve(root, bias, placement)?;
    let snapshot = Snapshot::take(root, &loc.path)?;
    match root.get_mut(&loc.path) {
        Some(Node::Text(t)) => {
            let at = byte_index(t, loc.offset);
            t.insert_str(at, text);
        }
        Some(Node::Wrapper(w)) => w.children.insert(loc.offset, Node::text(text)),
        Some(Node::Atomic(_)) => return Err(CommandError::InsideAtomic { path: loc.path }),
        None => return Err(missing(&loc.path)),
    }
    Ok(snapshot)
}

/// Inserts `node` as a sibling at `bias`, splitting a text run if the bias
/// falls inside one.
pub(crate) fn insert_node(root: &mut Node, bias: usize, node: Node) -> Result<Snapshot, CommandError> {
    let loc = resolve(root, bias, Placement::Outer)?;
    let (parent, offset) = match root.get(&loc.path) {
        Some(Node::Text(_)) => {
            let (&index, parent) = loc.path.split_last().ok_or_else(|| missing(&loc.path))?;
            (parent.to_vec(), Some((index, loc.offset)))
        }
        Some(Node::Wrapper(_)) => (loc.path.clone(), None),
        Some(Node::Atomic(_)) => return Err(CommandError::InsideAtomic { path: loc.path }),
        None => return Err(missing(&loc.path)),
    };
    let snapshot = Snapshot::take(root, &parent)?;
    let normalize = node.is_text();
    let container = root.get_mut(&parent).ok_or_else(|| missing(&parent))?;
    let children = container.children_mut().ok_or_else(|| missing(&parent))?;
    let index = match offset {
        Some((index, chars)) => split_text(children, index, chars),
        None => loc.offset,
    };
    children.insert(index, node);
    if normalize {
        container.normalize();
    }
    Ok(snapshot)
}

/// Removes the tokens of `interval`, returning the snapshot and the tokens
/// that actually left the tree, in document order.
///
/// Children fully inside the interval are dropped; partially covered wrappers
/// keep their hints and lose only the covered content, so the removed tokens
/// can be fewer than `interval.len()`. Fails without changes if the interval
/// would split an atomic object.
pub(crate) fn delete_range(root: &mut Node, interval: Interval) -> Result<(Snapshot, Vec<Token>), CommandError> {
    let start = resolve(root, interval.start, Placement::Outer)?;
    let end = resolve(root, interval.end, Placement::Outer)?;
    let path = element_ancestor(root, &start, &end);
    let snapshot = Snapshot::take(root, &path)?;

    let origin = node_start_bias(root, &path)?;
    let element = root.get_mut(&path).ok_or_else(|| missing(&path))?;
    let Node::Wrapper(w) = element else {
        return Err(missing(&path));
    };
    let inner = origin + w.hint_width();
    let from = interval.start.saturating_sub(inner);
    let to = interval.end.saturating_sub(inner);

    let mut scratch = path.clone();
    let mut removed = Vec::new();
    if let Err(err) = delete_children(&mut w.children, from, to, &mut scratch, inner, &mut removed) {
        snapshot.restore(root)?;
        return Err(err);
    }
    element.normalize();
    Ok((snapshot, removed))
}

/// Deepest wrapper containing both locations.
fn element_ancestor(root: &Node, a: &Location, b: &Location) -> Vec<usize> {
    let mut path: Vec<usize> = a
        .path
        .iter()
        .zip(&b.path)
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect();
    while !matches!(root.get(&path), Some(Node::Wrapper(_))) {
        if path.pop().is_none() {
            break;
        }
    }
    path
}

/// `start`/`end` are relative to the first child; `base` is the absolute bias
/// of that point, used for error reporting.
fn delete_children(
    children: &mut Vec<Node>,
    start: usize,
    end: usize,
    path: &mut Vec<usize>,
    base: usize,
    removed: &mut Vec<Token>,
) -> Result<(), CommandError> {
    let mut cur = 0;
    let mut i = 0;
    while i < children.len() {
        let size = token_size(&children[i]);
        let next = cur + size;
        let covered = if size == 0 {
            start < cur && cur < end
        } else {
            start <= cur && next <= end
        };
        if covered {
            removed.extend(tokens(&children.remove(i), &AllTokens));
            cur = next;
            continue;
        }
        if start.max(cur) < end.min(next) {
            match &mut children[i] {
                Node::Text(t) => {
                    let from = byte_index(t, start.max(cur) - cur);
                    let to = byte_index(t, end.min(next) - cur);
                    removed.extend(t[from..to].chars().map(Token::Char));
                    t.replace_range(from..to, "");
                }
                Node::Wrapper(w) => {
                    let hint = w.hint_width();
                    let inner = size - 2 * hint;
                    let from = start.saturating_sub(cur + hint).min(inner);
                    let to = end.saturating_sub(cur + hint).min(inner);
                    if from < to {
                        path.push(i);
                        delete_children(&mut w.children, from, to, path, base + cur + hint, removed)?;
                        path.pop();
                    }
                }
                Node::Atomic(_) => {
                    path.push(i);
                    return Err(CommandError::SplitsAtomic {
                        path: path.clone(),
                        start: base + start,
                        end: base + end,
                    });
                }
            }
        }
        cur = next;
        i += 1;
    }
    Ok(())
}

/// Where a wrap boundary falls: between children of `parent`, possibly after
/// splitting the text child at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Boundary {
    parent: Vec<usize>,
    index: usize,
    split: Option<usize>,
}

fn boundary(root: &Node, candidate: &Candidate) -> Option<Boundary> {
    let Location { path, offset } = &candidate.location;
    match candidate.kind {
        CandidateKind::Element { .. } => Some(Boundary {
            parent: path.clone(),
            index: *offset,
            split: None,
        }),
        CandidateKind::AtomicInterior => None,
        CandidateKind::Text { .. } => {
            let (&index, parent) = path.split_last()?;
            let len = match root.get(path)? {
                Node::Text(t) => t.chars().count(),
                _ => return None,
            };
            let (index, split) = match *offset {
                0 => (index, None),
                o if o >= len => (index + 1, None),
                o => (index, Some(o)),
            };
            Some(Boundary {
                parent: parent.to_vec(),
                index,
                split,
            })
        }
    }
}

/// Wraps the tokens of a non-empty `interval` in a new wrapper.
///
/// Both ends must be expressible as boundaries between children of one
/// wrapper; among several such wrappers the shallowest is used.
pub(crate) fn wrap_range(
    root: &mut Node,
    interval: Interval,
    format: Format,
    hints: bool,
) -> Result<Snapshot, CommandError> {
    let starts: Vec<Boundary> = candidates(root, interval.start, &AllTokens)
        .iter()
        .filter_map(|c| boundary(root, c))
        .collect();
    let ends: Vec<Boundary> = candidates(root, interval.end, &AllTokens)
        .iter()
        .filter_map(|c| boundary(root, c))
        .collect();

    let mut best: Option<(&Boundary, &Boundary)> = None;
    for s in &starts {
        for e in ends.iter().filter(|e| e.parent == s.parent) {
            if best.is_none_or(|(b, _)| s.parent.len() < b.parent.len()) {
                best = Some((s, e));
            }
        }
    }
    let Some((s, e)) = best else {
        return Err(CommandError::CrossesBoundary {
            start: interval.start,
            end: interval.end,
        });
    };

    let snapshot = Snapshot::take(root, &s.parent)?;
    let children = root
        .get_mut(&s.parent)
        .and_then(Node::children_mut)
        .ok_or_else(|| missing(&s.parent))?;

    let mut end = match e.split {
        Some(offset) => split_text(children, e.index, offset),
        None => e.index,
    };
    let start = match s.split {
        Some(offset) => {
            if s.index < end {
                end += 1;
            }
            split_text(children, s.index, offset)
        }
        None => s.index,
    };
    let inner: Vec<Node> = children.drain(start..end).collect();
    children.insert(start, Node::wrap(format, hints, inner));
    Ok(snapshot)
}

/// Sets the hint flag of every non-root wrapper, returning the previous flags.
pub(crate) fn set_hints(root: &mut Node, visible: bool) -> Vec<(Vec<usize>, bool)> {
    let mut previous = Vec::new();
    let mut path = Vec::new();
    set_hints_at(root, visible, &mut path, &mut previous);
    previous
}

fn set_hints_at(node: &mut Node, visible: bool, path: &mut Vec<usize>, out: &mut Vec<(Vec<usize>, bool)>) {
    let Node::Wrapper(w) = node else {
        return;
    };
    if w.format != Format::Root {
        out.push((path.clone(), w.hints));
        w.hints = visible;
    }
    for (i, child) in w.children.iter_mut().enumerate() {
        path.push(i);
        set_hints_at(child, visible, path, out);
        path.pop();
    }
}

pub(crate) fn restore_hints(root: &mut Node, previous: &[(Vec<usize>, bool)]) -> Result<(), CommandError> {
    for (path, hints) in previous {
        match root.get_mut(path) {
            Some(Node::Wrapper(w)) => w.hints = *hints,
            _ => return Err(missing(path)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Atomic, AtomicKind, Side, parse_markup};

    #[test]
    fn delete_inside_one_run() {
        let mut tree = parse_markup("hello", false);
        let (snapshot, removed) = delete_range(&mut tree, Interval::new(1, 3)).unwrap();
        assert_eq!(tree.logical_text(), "hlo");
        assert_eq!(removed, vec![Token::Char('e'), Token::Char('l')]);
        snapshot.restore(&mut tree).unwrap();
        assert_eq!(tree, parse_markup("hello", false));
    }

    #[test]
    fn delete_across_wrappers_keeps_partial_hints() {
        let mut tree = parse_markup("Lor**e*a*sd**m", true);
        let original = tree.clone();
        let (snapshot, removed) = delete_range(&mut tree, Interval::new(5, 9)).unwrap();
        assert_eq!(tree.display_text(), "Lor**ed**m");
        assert_eq!(
            removed,
            vec![
                Token::Hint(Side::Left),
                Token::Char('a'),
                Token::Hint(Side::Right),
                Token::Char('s'),
            ]
        );
        assert_eq!(token_size(&tree), 8);
        snapshot.restore(&mut tree).unwrap();
        assert_eq!(tree, original);
    }

    #[test]
    fn fully_covered_wrapper_is_removed() {
        let mut tree = parse_markup("a**b**c", true);
        delete_range(&mut tree, Interval::new(1, 4)).unwrap();
        assert_eq!(tree, Node::root(vec![Node::text("ac")]));
    }

    #[test]
    fn kept_hints_are_not_reported_as_removed() {
        let mut tree = parse_markup("Lor**e*a*sd**m", true);
        let original = tree.clone();

        let (_, removed) = delete_range(&mut tree, Interval::new(3, 5)).unwrap();
        assert_eq!(tree.display_text(), "Lor***a*sd**m");
        assert_eq!(removed, vec![Token::Char('e')]);

        let mut tree = original.clone();
        let (_, removed) = delete_range(&mut tree, Interval::new(3, 4)).unwrap();
        assert_eq!(tree, original);
        assert!(removed.is_empty());
    }

    #[test]
    fn splitting_an_atomic_fails_without_changes() {
        let mut tree = Node::root(vec![
            Node::text("a"),
            Node::atomic(Atomic::new(AtomicKind::Formula, "x").with_footprint(2)),
        ]);
        let original = tree.clone();
        let err = delete_range(&mut tree, Interval::new(0, 2)).unwrap_err();
        assert!(matches!(err, CommandError::SplitsAtomic { .. }), "{err:?}");
        assert_eq!(tree, original);
    }

    #[test]
    fn insert_text_at_element_creates_run() {
        let mut tree = Node::root(vec![Node::atomic(Atomic::new(AtomicKind::Formula, "x"))]);
        insert_text(&mut tree, 1, "ab", Placement::Outer).unwrap();
        assert_eq!(tree.children().unwrap()[1], Node::text("ab"));
    }

    #[test]
    fn insert_text_enters_empty_wrapper() {
        let mut tree = parse_markup("ab****", false);
        insert_text(&mut tree, 2, "c", Placement::Enter).unwrap();
        assert_eq!(tree, parse_markup("ab**c**", false));
    }

    #[test]
    fn insert_node_splits_text() {
        let mut tree = parse_markup("abcd", false);
        let formula = Node::atomic(Atomic::new(AtomicKind::Formula, "x"));
        insert_node(&mut tree, 2, formula.clone()).unwrap();
        assert_eq!(
            tree,
            Node::root(vec![Node::text("ab"), formula, Node::text("cd")])
        );
    }

    #[test]
    fn wrap_within_one_run() {
        let mut tree = parse_markup("abcd", true);
        wrap_range(&mut tree, Interval::new(1, 3), Format::Bold, true).unwrap();
        assert_eq!(tree.display_text(), "a**bc**d");
    }

    #[test]
    fn wrap_across_runs_uses_shared_parent() {
        let mut tree = parse_markup("ab*c*de", false);
        wrap_range(&mut tree, Interval::new(1, 4), Format::Bold, false).unwrap();
        assert_eq!(
            tree,
            Node::root(vec![
                Node::text("a"),
                Node::wrap(
                    Format::Bold,
                    false,
                    vec![
                        Node::text("b"),
                        Node::wrap(Format::Italic, false, vec![Node::text("c")]),
                        Node::text("d"),
                    ]
                ),
                Node::text("e"),
            ])
        );
    }

    #[test]
    fn wrap_crossing_a_boundary_fails() {
        let mut tree = parse_markup("a**bc**d", false);
        let err = wrap_range(&mut tree, Interval::new(2, 4), Format::Italic, false).unwrap_err();
        assert_eq!(err, CommandError::CrossesBoundary { start: 2, end: 4 });
    }

    #[test]
    fn hints_toggle_and_restore() {
        let mut tree = parse_markup("a**b*c*d**", true);
        let previous = set_hints(&mut tree, false);
        assert_eq!(tree.display_text(), "abcd");
        restore_hints(&mut tree, &previous).unwrap();
        assert_eq!(tree.display_text(), "a**b*c*d**");
    }
}
