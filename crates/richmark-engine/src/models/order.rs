//! Fractional order keys for block sequences.
//!
//! A key is a string over `a..=z` read as a base-26 fraction (`a` = 0). Keys
//! compare lexicographically in document order, and a key between any two
//! neighbours can always be found without touching other blocks, as long as
//! the upper neighbour is not the lower one followed only by `a`s. Generated
//! keys never end in `a`, so that case only arises from hand-written keys.

use crate::error::OrderKeyError;

const DIGITS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
const BASE: usize = DIGITS.len();

/// Returns a key strictly between `prev` and `next`.
///
/// `None` (or an empty string) stands for the open start or end of the
/// sequence.
pub fn create_order_string(prev: Option<&str>, next: Option<&str>) -> Result<String, OrderKeyError> {
    let prev = prev.unwrap_or("");
    let next = next.filter(|n| !n.is_empty());

    for key in std::iter::once(prev).chain(next) {
        if !key.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(OrderKeyError::InvalidKey(key.to_string()));
        }
    }

    if let Some(next) = next {
        if prev >= next {
            return Err(OrderKeyError::Unordered {
                prev: prev.to_string(),
                next: next.to_string(),
            });
        }
        if next.starts_with(prev) && next[prev.len()..].bytes().all(|b| b == b'a') {
            return Err(OrderKeyError::NoRoomBefore(next.to_string()));
        }
    }

    let key = midpoint(prev.as_bytes(), next.map(str::as_bytes));
    // Every byte comes from DIGITS.
    Ok(key.into_iter().map(char::from).collect())
}

fn digit(b: u8) -> usize {
    usize::from(b - b'a')
}

/// Midpoint of two base-26 fractions. `b == None` is 1.0.
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        let shared = b
            .iter()
            .enumerate()
            .take_while(|&(i, &d)| a.get(i).copied().unwrap_or(b'a') == d)
            .count();
        if shared > 0 {
            let mut out = b[..shared].to_vec();
            out.extend(midpoint(a.get(shared..).unwrap_or(&[]), Some(&b[shared..])));
            return out;
        }
    }

    let digit_a = a.first().map_or(0, |&d| digit(d));
    let digit_b = b.map_or(BASE, |b| b.first().map_or(0, |&d| digit(d)));

    if digit_b > digit_a + 1 {
        return vec![DIGITS[(digit_a + digit_b + 1) / 2]];
    }
    match b {
        Some(b) if b.len() > 1 => b[..1].to_vec(),
        _ => {
            let mut out = vec![DIGITS[digit_a]];
            out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
            out
        }
    }
}
