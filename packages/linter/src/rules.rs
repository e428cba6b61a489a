use std::sync::OnceLock;

use regex::Regex;
use snippet_parser::Span;
use snippet_sourcemap::SourcePosition;

use crate::diagnostic::{SecurityIssue, Severity};

const SCHEME: &str = "javascript:";

/// How a rule finds its matches
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// A regular expression over the code mask, so literal, comment and
    /// markup text never trigger it
    Pattern {
        pattern: &'static str,
        /// A match preceded by one of these bytes is ignored
        reject_before: &'static [u8],
        /// A match followed by one of these bytes is ignored
        reject_after: &'static [u8],
        /// Capture group whose start is reported, 0 for the whole match
        group: usize,
    },
    /// String bodies holding a `javascript:` URL
    JavascriptUrl,
}

/// A built-in security rule
#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    /// Message attached to every issue of this rule
    pub message: &'static str,
    matcher: Matcher,
    compiled: OnceLock<Option<Regex>>,
}

const fn pattern(pattern: &'static str) -> Matcher {
    Matcher::Pattern {
        pattern,
        reject_before: b"",
        reject_after: b"",
        group: 0,
    }
}

static RULES: [Rule; 8] = [
    Rule::new(
        "no-eval",
        "Disallow eval()",
        Severity::Error,
        "eval() executes arbitrary strings as code",
        Matcher::Pattern {
            pattern: r"(?-u:\b)eval\s*\(",
            reject_before: b"$.",
            reject_after: b"",
            group: 0,
        },
    ),
    Rule::new(
        "no-new-function",
        "Disallow the Function constructor",
        Severity::Error,
        "new Function() executes arbitrary strings as code",
        pattern(r"(?-u:\b)new\s+Function\s*\("),
    ),
    Rule::new(
        "no-dangerous-html",
        "Disallow dangerouslySetInnerHTML",
        Severity::Warning,
        "dangerouslySetInnerHTML injects unescaped markup",
        pattern(r"(?-u:\b)dangerouslySetInnerHTML(?-u:\b)"),
    ),
    Rule::new(
        "no-inner-html",
        "Disallow assignments to innerHTML and outerHTML",
        Severity::Warning,
        "assigning innerHTML/outerHTML injects unescaped markup",
        Matcher::Pattern {
            pattern: r"\.(innerHTML|outerHTML)\s*=",
            reject_before: b"",
            reject_after: b"=",
            group: 1,
        },
    ),
    Rule::new(
        "no-document-cookie",
        "Disallow document.cookie",
        Severity::Warning,
        "document.cookie exposes the host page's cookies",
        pattern(r"(?-u:\b)document\s*\.\s*cookie(?-u:\b)"),
    ),
    Rule::new(
        "no-storage-access",
        "Disallow localStorage and sessionStorage",
        Severity::Warning,
        "web storage is shared with the host page",
        pattern(r"(?-u:\b)(localStorage|sessionStorage)(?-u:\b)"),
    ),
    Rule::new(
        "no-network",
        "Disallow network requests",
        Severity::Warning,
        "snippets must not make network requests",
        pattern(r"(?-u:\b)(fetch\s*\(|XMLHttpRequest(?-u:\b)|WebSocket(?-u:\b))"),
    ),
    Rule::new(
        "no-javascript-url",
        "Disallow javascript: URLs",
        Severity::Error,
        "javascript: URLs execute code when followed",
        Matcher::JavascriptUrl,
    ),
];

/// All built-in rules
pub fn rules() -> &'static [Rule] {
    &RULES
}

pub fn rule(name: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.name == name)
}

/// One document prepared for the rules
pub struct ScanInput<'a> {
    pub source: &'a str,
    /// The source with comments, literal bodies and markup text blanked
    pub mask: String,
    /// Quoted string bodies and template quasis
    pub strings: Vec<Span>,
}

impl<'a> ScanInput<'a> {
    pub fn new(source: &'a str) -> Self {
        let scan = snippet_parser::lexical::scan(source);
        Self {
            source,
            mask: scan.code_mask(source),
            strings: scan.string_contents().collect(),
        }
    }
}

impl Rule {
    const fn new(
        name: &'static str,
        description: &'static str,
        severity: Severity,
        message: &'static str,
        matcher: Matcher,
    ) -> Self {
        Self {
            name,
            description,
            severity,
            message,
            matcher,
            compiled: OnceLock::new(),
        }
    }

    /// The rule's pattern, compiled on first use
    fn regex(&self) -> Option<&Regex> {
        let Matcher::Pattern { pattern, .. } = self.matcher else {
            return None;
        };
        self.compiled
            .get_or_init(|| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    tracing::error!(rule = self.name, error = %err, "invalid rule pattern, rule disabled");
                    None
                }
            })
            .as_ref()
    }

    /// Byte offsets of every finding in the scanned document
    pub fn find(&self, input: &ScanInput<'_>) -> Vec<usize> {
        match self.matcher {
            Matcher::Pattern {
                reject_before,
                reject_after,
                group,
                ..
            } => match self.regex() {
                Some(regex) => find_pattern(regex, &input.mask, reject_before, reject_after, group),
                None => Vec::new(),
            },
            Matcher::JavascriptUrl => input
                .strings
                .iter()
                .filter(|span| {
                    let trimmed = span.slice(input.source).trim_start();
                    trimmed
                        .get(..SCHEME.len())
                        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME))
                })
                .map(|span| span.start)
                .collect(),
        }
    }

    pub fn issue(&self, position: SourcePosition) -> SecurityIssue {
        SecurityIssue::new(self.name, self.severity, self.message, position)
    }
}

fn find_pattern(
    regex: &Regex,
    mask: &str,
    reject_before: &[u8],
    reject_after: &[u8],
    group: usize,
) -> Vec<usize> {
    let bytes = mask.as_bytes();
    regex
        .captures_iter(mask)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let before = whole.start().checked_sub(1).map(|i| bytes[i]);
            if before.is_some_and(|b| reject_before.contains(&b)) {
                return None;
            }
            if bytes.get(whole.end()).is_some_and(|b| reject_after.contains(b)) {
                return None;
            }
            captures.get(group).map(|found| found.start())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(name: &str, source: &str) -> Vec<usize> {
        rule(name).unwrap().find(&ScanInput::new(source))
    }

    #[test]
    fn test_every_pattern_compiles() {
        for rule in rules() {
            let has_pattern = matches!(rule.matcher, Matcher::Pattern { .. });
            assert_eq!(rule.regex().is_some(), has_pattern, "{}", rule.name);
        }
    }

    #[test]
    fn test_rejected_neighbours() {
        assert_eq!(offsets("no-eval", "eval(x); a.eval(y); $eval(z); eval (w)"), vec![0, 30]);
    }

    #[test]
    fn test_reported_group() {
        assert_eq!(offsets("no-inner-html", "el.innerHTML = x; el.outerHTML == y"), vec![3]);
    }

    #[test]
    fn test_literals_are_masked() {
        assert!(offsets("no-eval", "const s = \"eval(x)\"; // eval(y)").is_empty());
    }

    #[test]
    fn test_markup_text_is_masked() {
        assert!(offsets("no-eval", "const p = <p>Use eval( here</p>;").is_empty());
    }

    #[test]
    fn test_javascript_url_in_any_case() {
        let source = r#"<a href="  JavaScript:alert(1)">x</a>; const ok = "https://x.y"; `javascript:${x}`"#;
        let found = offsets("no-javascript-url", source);
        assert_eq!(found, vec![9, source.find('`').unwrap() + 1]);
    }

    #[test]
    fn test_javascript_url_ignores_comments_and_code() {
        let source = "// javascript:alert(1)\nlet javascript = 1;";
        assert!(offsets("no-javascript-url", source).is_empty());
    }
}
