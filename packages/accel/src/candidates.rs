//! Utility-class words found in string literals and template quasis.

use std::collections::HashSet;

use crate::inspect;
use crate::protocol::{RecordWriter, TAG_CANDIDATE};

const MAX_LEN: usize = 128;

const BARE_UTILITIES: &[&str] = &[
    "absolute", "antialiased", "block", "border", "capitalize", "container", "contents", "fixed",
    "flex", "grid", "grow", "hidden", "inline", "invisible", "isolate", "italic", "lowercase",
    "outline", "relative", "ring", "rounded", "shadow", "shrink", "static", "sticky", "table",
    "transform", "transition", "truncate", "underline", "uppercase", "visible",
];

fn word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"_-:/.[]#%()!,@".contains(&byte)
}

fn looks_like_utility(word: &str) -> bool {
    let bytes = word.as_bytes();
    let (Some(&first), Some(&last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    if bytes.len() > MAX_LEN
        || !(first.is_ascii_lowercase() || b"!-@[".contains(&first))
        || b"-:/".contains(&last)
        || !bytes.iter().copied().all(word_byte)
        || bytes.windows(2).any(|pair| pair == b"//")
    {
        return false;
    }

    let mut depth = 0i32;
    for &byte in bytes {
        match byte {
            b'[' => depth += 1,
            b']' if depth == 0 => return false,
            b']' => depth -= 1,
            _ => {}
        }
    }
    if depth != 0 {
        return false;
    }

    bytes.iter().any(|b| b"-:[".contains(b)) || BARE_UTILITIES.contains(&word)
}

pub fn scan(source: &str) -> Vec<&str> {
    let pieces = inspect::scan(source).pieces;
    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for &(start, end) in &pieces {
        let Some(text) = source.get(start..end) else {
            continue;
        };
        for word in text.split_whitespace() {
            if looks_like_utility(word) && seen.insert(word) {
                words.push(word);
            }
        }
    }
    words
}

pub fn encode(words: &[&str]) -> Vec<u8> {
    let mut out = RecordWriter::new();
    for word in words {
        out.record(TAG_CANDIDATE, &[word]);
    }
    out.finish()
}
