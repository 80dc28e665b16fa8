//! Locale-style name ordering.
//!
//! Approximates the root-locale collation browsers use for
//! `String.prototype.localeCompare`. Levels, in order:
//!
//! 1. Base letters, ignoring case and accents (`école` sorts with `e`).
//!    Punctuation and symbols sort before digits, digits before letters.
//! 2. Accents: unaccented before accented.
//! 3. Case: lowercase before uppercase.
//!
//! A final byte comparison keeps the order total so sorting is deterministic.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Compare two names the way the listing client expects them ordered.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary(a, b)
        .then_with(|| accent_level(a, b))
        .then_with(|| case_level(a, b))
        .then_with(|| a.cmp(b))
}

/// Lowercased base characters with combining marks stripped.
fn base_chars(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn class(c: char) -> u8 {
    if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    }
}

fn primary(a: &str, b: &str) -> Ordering {
    let mut left = base_chars(a);
    let mut right = base_chars(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = class(x).cmp(&class(y)).then(x.cmp(&y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

// Decomposed, lowercased comparison; only marks can differ here.
fn accent_level(a: &str, b: &str) -> Ordering {
    let left = a.nfd().flat_map(char::to_lowercase);
    let right = b.nfd().flat_map(char::to_lowercase);
    left.cmp(right)
}

// First differing case wins, lowercase first.
fn case_level(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}
