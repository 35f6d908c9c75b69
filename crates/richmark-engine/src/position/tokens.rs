use crate::error::PositionError;
use crate::models::{AtomicKind, Node, Side};
use crate::position::filter::{AllTokens, TokenFilter, Visibility};
use crate::position::{Direction, Location, bias_to_location, location_to_bias};

/// One unit of the token sequence a bias counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Char(char),
    /// A materialized delimiter side of a wrapper.
    Hint(Side),
    /// One footprint unit of an atomic object; `step` runs `0..footprint`.
    Object { kind: AtomicKind, step: usize },
}

impl Token {
    pub fn is_hint(&self) -> bool {
        matches!(self, Token::Hint(_))
    }
}

/// Token sequence of `root`, in document order. Its length equals
/// `token_size_with(root, filter)`.
pub fn tokens<F: TokenFilter + ?Sized>(root: &Node, filter: &F) -> Vec<Token> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    push_tokens(root, &mut path, filter, &mut out);
    out
}

fn push_tokens<F: TokenFilter + ?Sized>(node: &Node, path: &mut Vec<usize>, filter: &F, out: &mut Vec<Token>) {
    match (node, filter.visibility(path, node)) {
        (_, Visibility::Hidden) => {}
        (Node::Text(t), _) => out.extend(t.chars().map(Token::Char)),
        (Node::Wrapper(w), _) => {
            let hinted = w.hint_width() > 0;
            if hinted {
                out.push(Token::Hint(Side::Left));
            }
            push_children(&w.children, path, filter, out);
            if hinted {
                out.push(Token::Hint(Side::Right));
            }
        }
        (Node::Atomic(a), Visibility::Enter) => push_children(&a.content, path, filter, out),
        (Node::Atomic(a), Visibility::Visible) => {
            out.extend((0..a.footprint).map(|step| Token::Object {
                kind: a.kind.clone(),
                step,
            }));
        }
    }
}

fn push_children<F: TokenFilter + ?Sized>(
    children: &[Node],
    path: &mut Vec<usize>,
    filter: &F,
    out: &mut Vec<Token>,
) {
    for (i, child) in children.iter().enumerate() {
        path.push(i);
        push_tokens(child, path, filter, out);
        path.pop();
    }
}

/// Number of non-hint tokens before `bias`.
///
/// Logical offsets do not change when hints are toggled, so they carry a
/// position across a change of hint materialization.
pub fn logical_offset(root: &Node, bias: usize) -> usize {
    tokens(root, &AllTokens)
        .iter()
        .take(bias)
        .filter(|t| !t.is_hint())
        .count()
}

/// Smallest bias preceded by exactly `logical` non-hint tokens.
pub fn bias_for_logical(root: &Node, logical: usize) -> Option<usize> {
    let stream = tokens(root, &AllTokens);
    let mut count = 0;
    for (bias, token) in stream.iter().enumerate() {
        if count == logical {
            return Some(bias);
        }
        if !token.is_hint() {
            count += 1;
        }
    }
    (count == logical).then_some(stream.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Space,
    Word,
    Punct,
    Object,
}

/// Hints are transparent to word scans.
fn class(token: &Token) -> Option<Class> {
    match token {
        Token::Hint(_) => None,
        Token::Char(c) if c.is_whitespace() => Some(Class::Space),
        Token::Char(c) if c.is_alphanumeric() || *c == '_' => Some(Class::Word),
        Token::Char(_) => Some(Class::Punct),
        Token::Object { .. } => Some(Class::Object),
    }
}

fn is_blank(token: &Token) -> bool {
    matches!(class(token), None | Some(Class::Space))
}

/// Location of the next word boundary from `location` in `direction`.
///
/// Whitespace and hints are skipped, then a run of word characters or of
/// punctuation is crossed. An atomic object is a word on its own. `Ok(None)`
/// when there is nothing left to cross.
pub fn word_offset(
    root: &Node,
    location: &Location,
    direction: Direction,
) -> Result<Option<Location>, PositionError> {
    let bias = location_to_bias(root, location)?;
    let stream = tokens(root, &AllTokens);
    let target = match direction {
        Direction::Forward => word_end(&stream, bias),
        Direction::Backward => word_start(&stream, bias),
    };
    Ok(target.and_then(|t| bias_to_location(root, t)))
}

fn word_end(stream: &[Token], from: usize) -> Option<usize> {
    let mut i = from;
    while stream.get(i).is_some_and(is_blank) {
        i += 1;
    }
    let kind = stream.get(i).and_then(class)?;
    let mut end = i + 1;
    if kind == Class::Object {
        while matches!(stream.get(end), Some(Token::Object { step, .. }) if *step > 0) {
            end += 1;
        }
        return Some(end);
    }
    let mut j = end;
    while let Some(token) = stream.get(j) {
        match class(token) {
            Some(k) if k == kind => {
                j += 1;
                end = j;
            }
            None => j += 1,
            Some(_) => break,
        }
    }
    Some(end)
}

fn word_start(stream: &[Token], from: usize) -> Option<usize> {
    let mut i = from.min(stream.len());
    while i > 0 && is_blank(&stream[i - 1]) {
        i -= 1;
    }
    let mut start = i.checked_sub(1)?;
    let kind = class(&stream[start])?;
    if kind == Class::Object {
        while matches!(&stream[start], Token::Object { step, .. } if *step > 0) && start > 0 {
            start -= 1;
        }
        return Some(start);
    }
    let mut j = start;
    while j > 0 {
        match class(&stream[j - 1]) {
            Some(k) if k == kind => {
                j -= 1;
                start = j;
            }
            None => j -= 1,
            Some(_) => break,
        }
    }
    Some(start)
}
