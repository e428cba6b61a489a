//! Security scan over expanded snippet sources.
//!
//! Rules run over a code mask of the document (comments, literal bodies and
//! markup text blanked) or over its string literals, and report 1-based
//! positions in the original text.

mod diagnostic;
mod rules;

use snippet_sourcemap::LineIndex;

pub use diagnostic::{SecurityIssue, Severity};
pub use rules::{rule, rules, Rule, ScanInput};

/// Scan a document and return its issues ordered by position, then rule
pub fn scan(source: &str) -> Vec<SecurityIssue> {
    let input = ScanInput::new(source);
    let lines = LineIndex::new(source);

    let mut issues: Vec<SecurityIssue> = rules()
        .iter()
        .flat_map(|rule| {
            rule.find(&input)
                .into_iter()
                .map(|offset| rule.issue(lines.position(offset)))
                .collect::<Vec<_>>()
        })
        .collect();

    sort_issues(&mut issues);
    tracing::debug!(issues = issues.len(), "security scan");
    issues
}

/// Position order, then rule name for findings at the same position
fn sort_issues(issues: &mut [SecurityIssue]) {
    issues.sort_by(|a, b| (a.line, a.column, &a.rule).cmp(&(b.line, b.column, &b.rule)));
}
