//! # Inline Markup
//!
//! Builds a block tree from a compact inline markdown snippet. Plugins use it
//! to create replacement content; tests use it to write fixtures readably.
//!
//! | Markup            | Node                          |
//! |-------------------|-------------------------------|
//! | `**x**`           | bold wrapper                  |
//! | `*x*`             | italic wrapper                |
//! | `~~x~~`           | strike wrapper                |
//! | `` `x` ``         | code wrapper (raw zone)       |
//! | `[x](href)`       | link wrapper                  |
//! | `$x$`             | formula object                |
//! | `<kbd>x</kbd>`    | keyboard badge object         |
//! | `[ ]` / `[x]`     | todo checkbox object          |
//! | `[[x]]`           | back-reference object         |
//!
//! Code spans and objects are raw zones: nothing inside them is parsed.
//! Unclosed constructs are kept as plain text.

use crate::models::{Atomic, AtomicKind, Format, Node};

/// Parses `src` into a block root. `hints` selects whether the created
/// wrappers materialize their delimiters.
pub fn parse_markup(src: &str, hints: bool) -> Node {
    let mut cur = Cursor::new(src);
    Node::root(parse_seq(&mut cur, None, hints))
}

/// Byte cursor over the snippet. Only ever stops on ASCII delimiters, so
/// slicing at its positions stays on char boundaries.
struct Cursor<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    fn bump_char(&mut self) {
        self.i += self.rest().chars().next().map_or(1, char::len_utf8);
    }

    /// Consumes `open`, raw content and `close`, returning the content.
    fn raw(&mut self, open: &str, close: &str) -> Option<&'a str> {
        let body = self.rest().get(open.len()..)?;
        let end = body.find(close)?;
        self.bump_n(open.len() + end + close.len());
        Some(&body[..end])
    }
}

fn parse_seq(cur: &mut Cursor<'_>, until: Option<&str>, hints: bool) -> Vec<Node> {
    let mut out = vec![];
    let mut text_start = cur.i;

    fn flush_text(out: &mut Vec<Node>, s: &str, start: usize, end: usize) {
        if end > start {
            out.push(Node::text(&s[start..end]));
        }
    }

    while !cur.eof() {
        if until.is_some_and(|close| cur.starts_with(close)) {
            break;
        }
        let mark = cur.i;
        if let Some(node) = try_parse_construct(cur, hints) {
            flush_text(&mut out, cur.s, text_start, mark);
            out.push(node);
            text_start = cur.i;
            continue;
        }
        cur.bump_char();
    }

    flush_text(&mut out, cur.s, text_start, cur.i);
    out
}

/// Tries each construct in precedence order; raw zones first.
fn try_parse_construct(cur: &mut Cursor<'_>, hints: bool) -> Option<Node> {
    if cur.starts_with("`") {
        let code = cur.raw("`", "`")?;
        let children = if code.is_empty() {
            vec![]
        } else {
            vec![Node::text(code)]
        };
        return Some(Node::wrap(Format::Code, hints, children));
    }
    if cur.starts_with("$") {
        let source = cur.raw("$", "$")?;
        return Some(Node::atomic(Atomic::new(AtomicKind::Formula, source)));
    }
    if cur.starts_with("<kbd>") {
        let source = cur.raw("<kbd>", "</kbd>")?;
        return Some(Node::atomic(Atomic::new(AtomicKind::Kbd, source)));
    }
    if cur.starts_with("[[") {
        let source = cur.raw("[[", "]]")?;
        return Some(Node::atomic(Atomic::new(AtomicKind::BackRef, source)));
    }
    for (box_text, checked) in [("[ ]", false), ("[x]", true)] {
        if cur.starts_with(box_text) {
            cur.bump_n(box_text.len());
            return Some(Node::atomic(Atomic::new(AtomicKind::Todo { checked }, "")));
        }
    }
    if cur.starts_with("[") {
        return try_parse_link(cur, hints);
    }
    for (delim, format) in [("**", Format::Bold), ("~~", Format::Strike), ("*", Format::Italic)] {
        if cur.starts_with(delim) {
            return try_parse_wrapper(cur, delim, format, hints);
        }
    }
    None
}

fn try_parse_wrapper(cur: &mut Cursor<'_>, delim: &str, format: Format, hints: bool) -> Option<Node> {
    let save = cur.i;
    cur.bump_n(delim.len());
    let children = parse_seq(cur, Some(delim), hints);
    if cur.starts_with(delim) {
        cur.bump_n(delim.len());
        Some(Node::wrap(format, hints, children))
    } else {
        cur.i = save;
        None
    }
}

fn try_parse_link(cur: &mut Cursor<'_>, hints: bool) -> Option<Node> {
    let save = cur.i;
    cur.bump_n(1);
    let children = parse_seq(cur, Some("]"), hints);
    if cur.starts_with("](") {
        cur.bump_n(1);
        if let Some(href) = cur.raw("(", ")") {
            let format = Format::Link {
                href: href.to_string(),
            };
            return Some(Node::wrap(format, hints, children));
        }
    }
    cur.i = save;
    None
}
