//! Unsafe-pattern scan over the code mask.
//!
//! Each rule is a hand-written matcher. Word boundaries are ASCII, `\s`
//! runs are Unicode whitespace, and a match that is rejected by its
//! neighbours still consumes its text.

use crate::inspect::{self, Range};
use crate::lines::Lines;
use crate::protocol::{RecordWriter, TAG_SECURITY};

const SCHEME: &str = "javascript:";

fn is_word(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// `\b` at `at`
fn boundary(mask: &[u8], at: usize) -> bool {
    let before = at.checked_sub(1).map(|i| is_word(mask[i])).unwrap_or(false);
    let after = mask.get(at).copied().map(is_word).unwrap_or(false);
    before != after
}

fn skip_space(mask: &str, at: usize) -> usize {
    mask[at..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| at + i)
        .unwrap_or(mask.len())
}

fn literal(mask: &[u8], at: usize, text: &str) -> Option<usize> {
    mask.get(at..at + text.len())
        .filter(|window| *window == text.as_bytes())
        .map(|_| at + text.len())
}

/// A match: (end, reported offset)
type Match = Option<(usize, usize)>;

struct Matcher {
    rule: &'static str,
    matches: fn(&str, usize) -> Match,
    reject_before: &'static [u8],
    reject_after: &'static [u8],
}

fn eval_call(mask: &str, at: usize) -> Match {
    let bytes = mask.as_bytes();
    if !boundary(bytes, at) {
        return None;
    }
    let after = literal(bytes, at, "eval")?;
    let end = literal(bytes, skip_space(mask, after), "(")?;
    Some((end, at))
}

fn new_function(mask: &str, at: usize) -> Match {
    let bytes = mask.as_bytes();
    if !boundary(bytes, at) {
        return None;
    }
    let after = literal(bytes, at, "new")?;
    let name = skip_space(mask, after);
    if name == after {
        return None;
    }
    let after = literal(bytes, name, "Function")?;
    let end = literal(bytes, skip_space(mask, after), "(")?;
    Some((end, at))
}

fn bounded_word(mask: &str, at: usize, words: &[&str]) -> Match {
    let bytes = mask.as_bytes();
    if !boundary(bytes, at) {
        return None;
    }
    words.iter().find_map(|word| {
        let end = literal(bytes, at, word)?;
        boundary(bytes, end).then_some((end, at))
    })
}

fn dangerous_html(mask: &str, at: usize) -> Match {
    bounded_word(mask, at, &["dangerouslySetInnerHTML"])
}

fn storage(mask: &str, at: usize) -> Match {
    bounded_word(mask, at, &["localStorage", "sessionStorage"])
}

fn inner_html(mask: &str, at: usize) -> Match {
    let bytes = mask.as_bytes();
    let name = literal(bytes, at, ".")?;
    let after = literal(bytes, name, "innerHTML").or_else(|| literal(bytes, name, "outerHTML"))?;
    let end = literal(bytes, skip_space(mask, after), "=")?;
    Some((end, name))
}

fn document_cookie(mask: &str, at: usize) -> Match {
    let bytes = mask.as_bytes();
    if !boundary(bytes, at) {
        return None;
    }
    let after = literal(bytes, at, "document")?;
    let after = literal(bytes, skip_space(mask, after), ".")?;
    let end = literal(bytes, skip_space(mask, after), "cookie")?;
    boundary(bytes, end).then_some((end, at))
}

fn network(mask: &str, at: usize) -> Match {
    let bytes = mask.as_bytes();
    if !boundary(bytes, at) {
        return None;
    }
    if let Some(after) = literal(bytes, at, "fetch") {
        if let Some(end) = literal(bytes, skip_space(mask, after), "(") {
            return Some((end, at));
        }
    }
    bounded_word(mask, at, &["XMLHttpRequest", "WebSocket"])
}

const MATCHERS: &[Matcher] = &[
    Matcher {
        rule: "no-eval",
        matches: eval_call,
        reject_before: b"$.",
        reject_after: b"",
    },
    Matcher {
        rule: "no-new-function",
        matches: new_function,
        reject_before: b"",
        reject_after: b"",
    },
    Matcher {
        rule: "no-dangerous-html",
        matches: dangerous_html,
        reject_before: b"",
        reject_after: b"",
    },
    Matcher {
        rule: "no-inner-html",
        matches: inner_html,
        reject_before: b"",
        reject_after: b"=",
    },
    Matcher {
        rule: "no-document-cookie",
        matches: document_cookie,
        reject_before: b"",
        reject_after: b"",
    },
    Matcher {
        rule: "no-storage-access",
        matches: storage,
        reject_before: b"",
        reject_after: b"",
    },
    Matcher {
        rule: "no-network",
        matches: network,
        reject_before: b"",
        reject_after: b"",
    },
];

impl Matcher {
    fn find(&self, mask: &str) -> Vec<usize> {
        let bytes = mask.as_bytes();
        let mut found = Vec::new();
        let mut at = 0;
        while at < bytes.len() {
            let Some((end, reported)) = (self.matches)(mask, at) else {
                at += 1;
                continue;
            };
            let rejected = at
                .checked_sub(1)
                .is_some_and(|i| self.reject_before.contains(&bytes[i]))
                || bytes.get(end).is_some_and(|b| self.reject_after.contains(b));
            if !rejected {
                found.push(reported);
            }
            at = end.max(at + 1);
        }
        found
    }
}

fn javascript_urls(source: &str, pieces: &[Range]) -> Vec<usize> {
    pieces
        .iter()
        .filter(|(start, end)| {
            source
                .get(*start..*end)
                .map(str::trim_start)
                .and_then(|text| text.get(..SCHEME.len()))
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME))
        })
        .map(|(start, _)| *start)
        .collect()
}

/// `(rule, line, column)` sorted by position, then rule
pub fn scan(source: &str) -> Vec<(&'static str, u32, u32)> {
    let lexed = inspect::scan(source);
    let mask = lexed.code_mask(source);
    let lines = Lines::new(source);

    let mut issues: Vec<(&'static str, u32, u32)> = MATCHERS
        .iter()
        .flat_map(|matcher| {
            matcher
                .find(&mask)
                .into_iter()
                .map(move |offset| (matcher.rule, offset))
        })
        .chain(
            javascript_urls(source, &lexed.pieces)
                .into_iter()
                .map(|offset| ("no-javascript-url", offset)),
        )
        .map(|(rule, offset)| {
            let (line, column) = lines.position(offset);
            (rule, line, column)
        })
        .collect();

    issues.sort_by(|a, b| (a.1, a.2, a.0).cmp(&(b.1, b.2, b.0)));
    issues
}

pub fn encode(issues: &[(&'static str, u32, u32)]) -> Vec<u8> {
    let mut out = RecordWriter::new();
    for (rule, line, column) in issues {
        out.record(TAG_SECURITY, &[rule, line, column]);
    }
    out.finish()
}
