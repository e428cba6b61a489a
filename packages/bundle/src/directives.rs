//! Line-oriented directive grammar of the multi-file encoding
//!
//! ```text
//! // @snippet-imports (auto-managed)
//! // @import card.tsx
//!
//! // @snippet-file card.tsx
//! export const Card = () => <div />;
//! // @snippet-file-end
//! export default () => <Card />;
//! ```
//!
//! Directives are matched against the trimmed line and are case sensitive.

use crate::error::{BundleError, BundleResult};

/// Identifier of the entry file; never a valid file name
pub const MAIN_FILE: &str = "main";

pub const FILE_START: &str = "// @snippet-file";
pub const FILE_END: &str = "// @snippet-file-end";
pub const IMPORTS_HEADER: &str = "// @snippet-imports (auto-managed)";
pub const IMPORT: &str = "// @import";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    FileStart(&'a str),
    FileEnd,
}

/// Check that `name` can be used as a file name
pub fn validate_file_name(name: &str) -> BundleResult<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(BundleError::InvalidName {
            name: name.to_string(),
        });
    }
    if name == MAIN_FILE {
        return Err(BundleError::ReservedName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn is_valid_file_name(name: &str) -> bool {
    validate_file_name(name).is_ok()
}

/// Text after `keyword` when it is followed by whitespace and a single word
fn argument<'a>(trimmed: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = trimmed.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    (!name.is_empty() && !name.contains(char::is_whitespace)).then_some(name)
}

/// Classify one line; lines that are not directives return None.
/// A start directive with an invalid name is ordinary text.
pub fn directive(line: &str) -> Option<Directive<'_>> {
    let trimmed = line.trim();
    if trimmed == FILE_END {
        return Some(Directive::FileEnd);
    }
    argument(trimmed, FILE_START)
        .filter(|name| is_valid_file_name(name))
        .map(Directive::FileStart)
}

/// Name referenced by a `// @import <name>` line
pub fn import_line(line: &str) -> Option<&str> {
    argument(line.trim(), IMPORT)
}

pub fn is_imports_header(line: &str) -> bool {
    line.trim() == IMPORTS_HEADER
}

/// Extent of the auto-managed import block at the top of a main buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportBlock {
    pub lines: u32,
    /// Byte length of the block, line terminators included
    pub len: usize,
}

impl ImportBlock {
    /// Scan the leading run of header lines, import lines and single blank
    /// lines that directly follow one of them
    pub fn scan(source: &str) -> Self {
        let mut block = Self::default();
        let mut after_directive = false;

        for line in source.split_inclusive('\n') {
            if is_imports_header(line) || import_line(line).is_some() {
                after_directive = true;
            } else if line.trim().is_empty() && after_directive {
                after_directive = false;
            } else {
                break;
            }
            block.lines += 1;
            block.len += line.len();
        }

        block
    }
}

/// User-visible main buffer: the raw main buffer without its import block
pub fn strip_import_block(source: &str) -> &str {
    &source[ImportBlock::scan(source).len..]
}

/// Names listed by the import block of `source`, in order of appearance
pub fn import_names(source: &str) -> Vec<String> {
    let block = ImportBlock::scan(source);
    source[..block.len]
        .lines()
        .filter_map(import_line)
        .map(str::to_string)
        .collect()
}

/// Render an import block listing `names`; nothing when there are none
pub fn render_import_block<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut block = String::new();
    for name in names {
        if block.is_empty() {
            block.push_str(IMPORTS_HEADER);
            block.push('\n');
        }
        block.push_str(IMPORT);
        block.push(' ');
        block.push_str(name);
        block.push('\n');
    }
    if !block.is_empty() {
        block.push('\n');
    }
    block
}
