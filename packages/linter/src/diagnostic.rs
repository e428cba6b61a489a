use serde::{Deserialize, Serialize};
use snippet_sourcemap::SourcePosition;

/// Severity level of a security issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A finding of the security scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIssue {
    /// The rule that generated this issue
    pub rule: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// 1-based line in the scanned document
    pub line: u32,

    /// 1-based column, in Unicode scalar values
    pub column: u32,
}

impl SecurityIssue {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        position: SourcePosition,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column)
    }
}
