//! Utility-class candidates: every string-literal word that could be a
//! utility class, for the stylesheet generator.

use std::collections::HashSet;

use snippet_parser::string_contents;

pub const MAX_CANDIDATE_LEN: usize = 128;

/// Single-word utilities that carry no `-`, `:` or `[`
pub const STANDALONE: &[&str] = &[
    "absolute",
    "antialiased",
    "block",
    "border",
    "capitalize",
    "container",
    "contents",
    "fixed",
    "flex",
    "grid",
    "grow",
    "hidden",
    "inline",
    "invisible",
    "isolate",
    "italic",
    "lowercase",
    "outline",
    "relative",
    "ring",
    "rounded",
    "shadow",
    "shrink",
    "static",
    "sticky",
    "table",
    "transform",
    "transition",
    "truncate",
    "underline",
    "uppercase",
    "visible",
];

fn allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '_' | '-' | ':' | '/' | '.' | '[' | ']' | '#' | '%' | '(' | ')' | '!' | ',' | '@'
        )
}

fn balanced(word: &str) -> bool {
    let mut depth = 0i32;
    for c in word.chars() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Whether a whitespace-free word looks like a utility class
pub fn is_candidate(word: &str) -> bool {
    let Some(first) = word.chars().next() else {
        return false;
    };
    if word.len() > MAX_CANDIDATE_LEN
        || !(first.is_ascii_lowercase() || matches!(first, '!' | '-' | '@' | '['))
        || !word.chars().all(allowed)
        || word.ends_with(['-', ':', '/'])
        || word.contains("//")
        || !balanced(word)
    {
        return false;
    }
    word.contains(['-', ':', '[']) || STANDALONE.contains(&word)
}

/// Unique candidates in first-occurrence order. Only string bodies and
/// template quasis count, including strings inside interpolations; comments
/// and markup text are skipped.
pub fn scan_class_candidates(source: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for span in string_contents(source) {
        for word in span.slice(source).split_whitespace() {
            if is_candidate(word) && seen.insert(word) {
                candidates.push(word.to_string());
            }
        }
    }
    tracing::debug!(count = candidates.len(), "class candidate scan");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate() {
        for word in ["p-4", "md:flex", "w-[120px]", "!mt-2", "-translate-x-1", "flex", "bg-red-500/50", "@lg:p-2"] {
            assert!(is_candidate(word), "{word}");
        }
        for word in ["hello", "Button", "p-", "md:", "w-[12px", "http://x.y", "a=b", "", "w-1/"] {
            assert!(!is_candidate(word), "{word}");
        }
        assert!(!is_candidate(&format!("p-{}", "1".repeat(MAX_CANDIDATE_LEN))));
    }

    #[test]
    fn test_scan_is_unique_and_ordered() {
        let source = r#"
const a = "p-4 flex p-4";
// "mt-8" in a comment
const b = `gap-2 ${x ? 'text-sm' : "p-4"}`;
<div className="hover:underline text-sm">Hello world</div>
"#;
        assert_eq!(
            scan_class_candidates(source),
            vec!["p-4", "flex", "gap-2", "text-sm", "hover:underline"]
        );
    }
}
