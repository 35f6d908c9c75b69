use crate::error::PositionError;
use crate::models::{Format, Node};
use crate::position::filter::{AllTokens, TokenFilter, Visibility};
use crate::position::size::{children_size, token_size};
use crate::position::{Location, Placement};

/// One of the possibly several locations denoting a bias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub location: Location,
    pub kind: CandidateKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateKind {
    Text { in_empty_wrapper: bool },
    AtomicInterior,
    Element { empty_wrapper: bool },
}

impl Candidate {
    fn inside_empty_wrapper(&self) -> bool {
        matches!(
            self.kind,
            CandidateKind::Text {
                in_empty_wrapper: true
            } | CandidateKind::Element {
                empty_wrapper: true
            }
        )
    }
}

/// Collects, in document order, every location whose bias equals `target`.
struct Collector<'f, F: ?Sized> {
    filter: &'f F,
    target: usize,
    path: Vec<usize>,
    found: Vec<Candidate>,
}

impl<F: TokenFilter + ?Sized> Collector<'_, F> {
    /// Returns the size of `node`, or 0 for nodes starting past the target
    /// (their siblings then start past it as well).
    fn visit(&mut self, node: &Node, start: usize, in_empty: bool) -> usize {
        if start > self.target {
            return 0;
        }
        let visibility = self.filter.visibility(&self.path, node);
        match (node, visibility) {
            (_, Visibility::Hidden) => 0,
            (Node::Text(t), _) => {
                let len = t.chars().count();
                if self.target <= start + len {
                    self.push(
                        self.target - start,
                        CandidateKind::Text {
                            in_empty_wrapper: in_empty,
                        },
                    );
                }
                len
            }
            (Node::Wrapper(w), _) => {
                let empty = w.format != Format::Root
                    && children_size(&w.children, &mut self.path, self.filter) == 0;
                self.visit_children(&w.children, start, w.hint_width(), empty)
            }
            (Node::Atomic(a), Visibility::Enter) => self.visit_children(&a.content, start, 0, false),
            (Node::Atomic(a), Visibility::Visible) => {
                if start < self.target && self.target < start + a.footprint {
                    self.push(self.target - start, CandidateKind::AtomicInterior);
                }
                a.footprint
            }
        }
    }

    fn visit_children(&mut self, children: &[Node], start: usize, hint: usize, empty: bool) -> usize {
        let mut cur = start + hint;
        for (i, child) in children.iter().enumerate() {
            if cur == self.target {
                self.push(i, CandidateKind::Element { empty_wrapper: empty });
            }
            self.path.push(i);
            cur += self.visit(child, cur, empty);
            self.path.pop();
        }
        if cur == self.target {
            self.push(children.len(), CandidateKind::Element { empty_wrapper: empty });
        }
        cur + hint - start
    }

    fn push(&mut self, offset: usize, kind: CandidateKind) {
        self.found.push(Candidate {
            location: Location {
                path: self.path.clone(),
                offset,
            },
            kind,
        });
    }
}

pub(crate) fn candidates<F: TokenFilter + ?Sized>(root: &Node, bias: usize, filter: &F) -> Vec<Candidate> {
    let mut collector = Collector {
        filter,
        target: bias,
        path: Vec::new(),
        found: Vec::new(),
    };
    collector.visit(root, 0, false);
    collector.found
}

/// Picks the canonical location among adjacent-equivalent candidates.
///
/// Text locations win, earliest first; then an atomic interior; then the
/// shallowest element location. `Placement::Enter` first prefers the deepest
/// location inside an empty wrapper.
fn choose(found: &[Candidate], placement: Placement) -> Option<Location> {
    if placement == Placement::Enter {
        let mut deepest: Option<&Candidate> = None;
        for candidate in found.iter().filter(|c| c.inside_empty_wrapper()) {
            if deepest.is_none_or(|d| candidate.location.path.len() > d.location.path.len()) {
                deepest = Some(candidate);
            }
        }
        if let Some(candidate) = deepest {
            return Some(candidate.location.clone());
        }
    }
    found
        .iter()
        .find(|c| matches!(c.kind, CandidateKind::Text { .. }))
        .or_else(|| found.iter().find(|c| c.kind == CandidateKind::AtomicInterior))
        .or_else(|| found.iter().min_by_key(|c| c.location.path.len()))
        .map(|c| c.location.clone())
}

/// Canonical location of `bias`, or `None` when it lies beyond the tree.
pub fn bias_to_location(root: &Node, bias: usize) -> Option<Location> {
    bias_to_location_with(root, bias, &AllTokens, Placement::Outer)
}

pub fn bias_to_location_with<F: TokenFilter + ?Sized>(
    root: &Node,
    bias: usize,
    filter: &F,
    placement: Placement,
) -> Option<Location> {
    let found = candidates(root, bias, filter);
    let location = choose(&found, placement);
    log::trace!(
        "bias {bias} resolved to {location:?} among {} candidates",
        found.len()
    );
    location
}

pub fn location_to_bias(root: &Node, location: &Location) -> Result<usize, PositionError> {
    location_to_bias_with(root, location, &AllTokens)
}

/// Tokens preceding `location`.
///
/// Errors when the location does not exist in `root`, which means the caller's
/// view of the tree is stale.
pub fn location_to_bias_with<F: TokenFilter + ?Sized>(
    root: &Node,
    location: &Location,
    filter: &F,
) -> Result<usize, PositionError> {
    let mut path = Vec::with_capacity(location.path.len());
    let mut node = root;
    let mut bias = 0;

    if filter.visibility(&path, node) == Visibility::Hidden {
        return Err(PositionError::HiddenContainer { path });
    }

    for &index in &location.path {
        let visibility = filter.visibility(&path, node);
        let missing = || PositionError::MissingContainer {
            path: location.path.clone(),
        };
        let (children, hint) = container_children(node, visibility).ok_or_else(missing)?;
        let child = children.get(index).ok_or_else(missing)?;
        bias += hint + children_size(&children[..index], &mut path, filter);
        path.push(index);
        if filter.visibility(&path, child) == Visibility::Hidden {
            return Err(PositionError::HiddenContainer { path });
        }
        node = child;
    }

    let offset = location.offset;
    let out_of_range = |max: usize| PositionError::OffsetOutOfRange {
        path: location.path.clone(),
        offset,
        max,
    };
    let visibility = filter.visibility(&path, node);
    match (node, visibility) {
        (Node::Text(t), _) => {
            let len = t.chars().count();
            if offset > len {
                return Err(out_of_range(len));
            }
            Ok(bias + offset)
        }
        (Node::Atomic(a), Visibility::Visible) => {
            if offset > a.footprint {
                return Err(out_of_range(a.footprint));
            }
            Ok(bias + offset)
        }
        (Node::Wrapper(w), _) => {
            element_offset(&w.children, w.hint_width(), offset, &mut path, filter)
                .map(|inner| bias + inner)
                .ok_or_else(|| out_of_range(w.children.len()))
        }
        (Node::Atomic(a), _) => element_offset(&a.content, 0, offset, &mut path, filter)
            .map(|inner| bias + inner)
            .ok_or_else(|| out_of_range(a.content.len())),
    }
}

fn container_children(node: &Node, visibility: Visibility) -> Option<(&[Node], usize)> {
    match (node, visibility) {
        (Node::Wrapper(w), _) => Some((&w.children, w.hint_width())),
        (Node::Atomic(a), Visibility::Enter) => Some((&a.content, 0)),
        _ => None,
    }
}

fn element_offset<F: TokenFilter + ?Sized>(
    children: &[Node],
    hint: usize,
    offset: usize,
    path: &mut Vec<usize>,
    filter: &F,
) -> Option<usize> {
    let before = children.get(..offset)?;
    Some(hint + children_size(before, path, filter))
}

/// The canonical form of `location`.
pub fn canonicalize(root: &Node, location: &Location) -> Result<Location, PositionError> {
    let bias = location_to_bias(root, location)?;
    bias_to_location(root, bias).ok_or_else(|| PositionError::BiasOutOfRange {
        bias,
        size: token_size(root),
    })
}

pub fn offset_after(root: &Node, start: &Location, delta: isize) -> Result<Option<Location>, PositionError> {
    offset_after_with(root, start, delta, &AllTokens, Placement::Outer)
}

/// Location `delta` tokens away from `start` (backwards when negative).
///
/// Motion that stays strictly inside the starting text run is answered
/// without walking the tree. `Ok(None)` means the motion leaves the tree.
pub fn offset_after_with<F: TokenFilter + ?Sized>(
    root: &Node,
    start: &Location,
    delta: isize,
    filter: &F,
    placement: Placement,
) -> Result<Option<Location>, PositionError> {
    if let Some(Node::Text(t)) = root.get(&start.path) {
        let len = t.chars().count();
        let moved = start.offset.checked_add_signed(delta);
        if start.offset <= len
            && moved.is_some_and(|m| 0 < m && m < len)
            && path_is_visible(root, &start.path, filter)
        {
            return Ok(moved.map(|offset| Location {
                path: start.path.clone(),
                offset,
            }));
        }
    }

    let bias = location_to_bias_with(root, start, filter)?;
    let Some(target) = bias.checked_add_signed(delta) else {
        return Ok(None);
    };
    Ok(bias_to_location_with(root, target, filter, placement))
}

fn path_is_visible<F: TokenFilter + ?Sized>(root: &Node, path: &[usize], filter: &F) -> bool {
    (0..=path.len()).all(|depth| {
        root.get(&path[..depth])
            .is_some_and(|node| filter.visibility(&path[..depth], node) != Visibility::Hidden)
    })
}

/// Bias at which the node at `path` starts, before its own hints.
pub(crate) fn node_start_bias(root: &Node, path: &[usize]) -> Result<usize, PositionError> {
    match path.split_last() {
        None => Ok(0),
        Some((&index, parent)) => location_to_bias(
            root,
            &Location {
                path: parent.to_vec(),
                offset: index,
            },
        ),
    }
}
