use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Placeholder used for atomic objects in hint-free text.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// One node of a block's inline tree.
///
/// The tree is closed over three kinds so that every walk over it is an
/// exhaustive match: plain text runs, formatting wrappers that nest freely,
/// and atomic inline objects with a fixed token footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// A run of characters, one token per `char`.
    Text(String),
    /// Formatting around child nodes; the block root is a `Format::Root` wrapper.
    Wrapper(Wrapper),
    /// An inline object that is never split by editing.
    Atomic(Atomic),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub format: Format,
    /// Whether the markdown delimiters are materialized as hint tokens.
    pub hints: bool,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// The block's own content container. Never carries hints.
    Root,
    Bold,
    Italic,
    Code,
    Strike,
    Link { href: String },
}

impl Format {
    /// Markdown delimiters shown on each side when hints are materialized.
    pub fn delimiters(&self) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
        match self {
            Format::Root => None,
            Format::Bold => Some(("**".into(), "**".into())),
            Format::Italic => Some(("*".into(), "*".into())),
            Format::Code => Some(("`".into(), "`".into())),
            Format::Strike => Some(("~~".into(), "~~".into())),
            Format::Link { href } => Some(("[".into(), format!("]({href})").into())),
        }
    }
}

/// Which side of a wrapper a hint token sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atomic {
    pub kind: AtomicKind,
    /// Tokens the object occupies from the outside, regardless of `content`.
    pub footprint: usize,
    /// Internal representation, only walked when a token filter enters it.
    pub content: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomicKind {
    Formula,
    Kbd,
    Todo { checked: bool },
    BackRef,
}

impl Atomic {
    pub fn new(kind: AtomicKind, source: impl Into<String>) -> Self {
        let source = source.into();
        let content = if source.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(source)]
        };
        Self {
            kind,
            footprint: 1,
            content,
        }
    }

    #[must_use]
    pub fn with_footprint(mut self, footprint: usize) -> Self {
        self.footprint = footprint;
        self
    }

    /// Concatenated text of the internal representation.
    pub fn source(&self) -> String {
        self.content.iter().map(Node::logical_text).collect()
    }
}

impl Wrapper {
    /// Tokens contributed by one side of this wrapper's hints (0 or 1).
    pub fn hint_width(&self) -> usize {
        usize::from(self.hints && self.format != Format::Root)
    }
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    /// Block root holding `children`.
    pub fn root(children: Vec<Node>) -> Self {
        Node::Wrapper(Wrapper {
            format: Format::Root,
            hints: false,
            children,
        })
    }

    pub fn wrap(format: Format, hints: bool, children: Vec<Node>) -> Self {
        Node::Wrapper(Wrapper {
            format,
            hints,
            children,
        })
    }

    pub fn atomic(atomic: Atomic) -> Self {
        Node::Atomic(atomic)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Child list of a wrapper, or the internal content of an atomic object.
    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Text(_) => None,
            Node::Wrapper(w) => Some(&w.children),
            Node::Atomic(a) => Some(&a.content),
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Text(_) => None,
            Node::Wrapper(w) => Some(&mut w.children),
            Node::Atomic(a) => Some(&mut a.content),
        }
    }

    /// Descendant addressed by `path` (child indices from this node).
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children()?.get(index))
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children_mut()?.get_mut(index))
    }

    /// Text as displayed, including materialized hint delimiters.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        self.write_display(&mut out);
        out
    }

    fn write_display(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Wrapper(w) => {
                let delimiters = if w.hints { w.format.delimiters() } else { None };
                if let Some((left, _)) = &delimiters {
                    out.push_str(left);
                }
                for child in &w.children {
                    child.write_display(out);
                }
                if let Some((_, right)) = &delimiters {
                    out.push_str(right);
                }
            }
            Node::Atomic(a) => {
                let source = a.source();
                match &a.kind {
                    AtomicKind::Formula => {
                        out.push('$');
                        out.push_str(&source);
                        out.push('$');
                    }
                    AtomicKind::Kbd => {
                        out.push_str("<kbd>");
                        out.push_str(&source);
                        out.push_str("</kbd>");
                    }
                    AtomicKind::Todo { checked } => {
                        out.push_str(if *checked { "[x]" } else { "[ ]" });
                    }
                    AtomicKind::BackRef => {
                        out.push_str("[[");
                        out.push_str(&source);
                        out.push_str("]]");
                    }
                }
            }
        }
    }

    /// Hint-free content: text runs verbatim, one replacement char per atomic object.
    pub fn logical_text(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Wrapper(w) => w.children.iter().map(Node::logical_text).collect(),
            Node::Atomic(_) => OBJECT_REPLACEMENT.to_string(),
        }
    }

    /// Drops empty text runs and merges adjacent ones, recursively through
    /// wrappers. Atomic content is left untouched. Bias is unaffected.
    pub fn normalize(&mut self) {
        let Node::Wrapper(w) = self else {
            return;
        };
        let mut merged: Vec<Node> = Vec::with_capacity(w.children.len());
        for mut child in std::mem::take(&mut w.children) {
            child.normalize();
            if let Node::Text(t) = &child {
                if t.is_empty() {
                    continue;
                }
                if let Some(Node::Text(prev)) = merged.last_mut() {
                    prev.push_str(t);
                    continue;
                }
            }
            merged.push(child);
        }
        w.children = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::root(vec![
            Node::text("Lor"),
            Node::wrap(
                Format::Bold,
                true,
                vec![
                    Node::text("e"),
                    Node::wrap(Format::Italic, true, vec![Node::text("a")]),
                    Node::text("sd"),
                ],
            ),
            Node::text("m"),
        ])
    }

    #[test]
    fn display_text_includes_hints() {
        assert_eq!(sample().display_text(), "Lor**e*a*sd**m");
    }

    #[test]
    fn logical_text_excludes_hints() {
        assert_eq!(sample().logical_text(), "Loreasdm");
    }

    #[test]
    fn get_follows_child_indices() {
        let tree = sample();
        assert_eq!(tree.get(&[1, 1, 0]), Some(&Node::text("a")));
        assert_eq!(tree.get(&[]), Some(&tree));
        assert_eq!(tree.get(&[0, 0]), None);
        assert_eq!(tree.get(&[7]), None);
    }

    #[test]
    fn normalize_merges_and_drops_text_runs() {
        let mut tree = Node::root(vec![
            Node::text("a"),
            Node::text(""),
            Node::text("b"),
            Node::wrap(Format::Bold, false, vec![Node::text(""), Node::text("c")]),
            Node::wrap(Format::Italic, false, vec![]),
        ]);
        tree.normalize();
        assert_eq!(
            tree,
            Node::root(vec![
                Node::text("ab"),
                Node::wrap(Format::Bold, false, vec![Node::text("c")]),
                Node::wrap(Format::Italic, false, vec![]),
            ])
        );
    }

    #[test]
    fn link_delimiters_carry_href() {
        let link = Node::wrap(
            Format::Link {
                href: "https://example.com".to_string(),
            },
            true,
            vec![Node::text("site")],
        );
        assert_eq!(link.display_text(), "[site](https://example.com)");
    }

    #[test]
    fn atomic_display_uses_source() {
        let formula = Node::atomic(Atomic::new(AtomicKind::Formula, "x^2"));
        assert_eq!(formula.display_text(), "$x^2$");
        assert_eq!(formula.logical_text(), OBJECT_REPLACEMENT.to_string());
    }
}
