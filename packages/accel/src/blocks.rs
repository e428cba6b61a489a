//! Multi-file blob splitting and document expansion, encoded as the binary
//! file-block payload.

use crate::protocol::{BinaryWriter, FLAG_HAS_FILE_BLOCKS, MAGIC, VERSION};

const FILE_START: &str = "// @snippet-file";
const FILE_END: &str = "// @snippet-file-end";
const IMPORTS_HEADER: &str = "// @snippet-imports (auto-managed)";
const IMPORT: &str = "// @import";
const MAIN_FILE: &str = "main";

/// `(file_index, expanded_start_line, original_start_line, line_count)`
pub type Segment = (u32, u32, u32, u32);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Blocks<'a> {
    pub has_file_blocks: bool,
    pub main: String,
    pub files: Vec<(&'a str, String)>,
    pub expanded: String,
    pub segments: Vec<Segment>,
}

/// The single word after `keyword` and whitespace
fn word_after<'a>(trimmed: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = trimmed.strip_prefix(keyword)?;
    if !rest.chars().next().is_some_and(char::is_whitespace) {
        return None;
    }
    let word = rest.trim();
    if word.is_empty() || word.chars().any(char::is_whitespace) {
        return None;
    }
    Some(word)
}

fn file_start(line: &str) -> Option<&str> {
    word_after(line.trim(), FILE_START).filter(|name| *name != MAIN_FILE)
}

fn is_file_end(line: &str) -> bool {
    line.trim() == FILE_END
}

/// `(lines, bytes)` of the import block heading a main buffer
fn import_block(main: &str) -> (u32, usize) {
    let mut lines = 0;
    let mut bytes = 0;
    let mut after_directive = false;
    for line in main.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed == IMPORTS_HEADER || word_after(trimmed, IMPORT).is_some() {
            after_directive = true;
        } else if trimmed.is_empty() && after_directive {
            after_directive = false;
        } else {
            break;
        }
        lines += 1;
        bytes += line.len();
    }
    (lines, bytes)
}

fn strip_line_break(content: &mut String) {
    if content.ends_with('\n') {
        content.pop();
        if content.ends_with('\r') {
            content.pop();
        }
    }
}

fn store<'a>(files: &mut Vec<(&'a str, String)>, name: &'a str, mut content: String) {
    strip_line_break(&mut content);
    if let Some(slot) = files.iter_mut().find(|(existing, _)| *existing == name) {
        slot.1 = content;
    } else {
        files.push((name, content));
    }
}

pub fn scan(source: &str) -> Blocks<'_> {
    let mut blocks = Blocks::default();
    // (name, content, dangling)
    let mut open: Option<(&str, String, bool)> = None;

    for line in source.split_inclusive('\n') {
        match &mut open {
            Some((_, content, true)) => content.push_str(line),
            Some((name, content, dangling)) => {
                if is_file_end(line) {
                    let (name, content) = (*name, std::mem::take(content));
                    open = None;
                    store(&mut blocks.files, name, content);
                } else {
                    if file_start(line).is_some() {
                        *dangling = true;
                    }
                    content.push_str(line);
                }
            }
            None => match file_start(line) {
                Some(name) => {
                    blocks.has_file_blocks = true;
                    open = Some((name, String::new(), false));
                }
                None => blocks.main.push_str(line),
            },
        }
    }
    if let Some((name, content, _)) = open {
        store(&mut blocks.files, name, content);
    }

    let (block_lines, block_len) = import_block(&blocks.main);
    let mut main_piece = "\n".repeat(block_lines as usize);
    main_piece.push_str(&blocks.main[block_len..]);

    let mut next_line = 1;
    let pieces = std::iter::once((0u32, main_piece.as_str())).chain(
        blocks
            .files
            .iter()
            .enumerate()
            .map(|(i, (_, content))| (i as u32 + 1, content.as_str())),
    );
    for (index, piece) in pieces {
        if piece.is_empty() {
            continue;
        }
        blocks.expanded.push_str(piece);
        let mut count = piece.bytes().filter(|b| *b == b'\n').count() as u32;
        if !piece.ends_with('\n') {
            blocks.expanded.push('\n');
            count += 1;
        }
        blocks.segments.push((index, next_line, 1, count));
        next_line += count;
    }

    blocks
}

pub fn encode(blocks: &Blocks<'_>) -> Vec<u8> {
    let body: usize = blocks.main.len()
        + blocks.expanded.len()
        + blocks
            .files
            .iter()
            .map(|(name, content)| 8 + name.len() + content.len())
            .sum::<usize>()
        + blocks.segments.len() * 16;
    let mut out = BinaryWriter::with_capacity(crate::protocol::HEADER_LEN + body);

    out.u32(MAGIC);
    out.u32(VERSION);
    out.u32(if blocks.has_file_blocks {
        FLAG_HAS_FILE_BLOCKS
    } else {
        0
    });
    out.u32(blocks.main.len() as u32);
    out.u32(blocks.files.len() as u32);
    out.u32(blocks.expanded.len() as u32);
    out.u32(blocks.segments.len() as u32);
    out.u32(0);

    out.bytes(blocks.main.as_bytes());
    for (name, content) in &blocks.files {
        out.u32(name.len() as u32);
        out.u32(content.len() as u32);
        out.bytes(name.as_bytes());
        out.bytes(content.as_bytes());
    }
    out.bytes(blocks.expanded.as_bytes());
    for &(file, expanded_start, original_start, count) in &blocks.segments {
        out.u32(file);
        out.u32(expanded_start);
        out.u32(original_start);
        out.u32(count);
    }
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections() {
        let source = "// @snippet-imports (auto-managed)\n// @import a.tsx\n\n// @snippet-file a.tsx\nexport const A = 1;\n// @snippet-file-end\nmain();\n";
        let blocks = scan(source);
        assert!(blocks.has_file_blocks);
        assert_eq!(
            blocks.main,
            "// @snippet-imports (auto-managed)\n// @import a.tsx\n\nmain();\n"
        );
        assert_eq!(blocks.files, vec![("a.tsx", "export const A = 1;".to_string())]);
        assert_eq!(blocks.expanded, "\n\n\nmain();\nexport const A = 1;\n");
        assert_eq!(blocks.segments, vec![(0, 1, 1, 4), (1, 5, 1, 1)]);
    }

    #[test]
    fn test_dangling_and_invalid_names() {
        let blocks = scan("// @snippet-file main\nx\n// @snippet-file a\n1\n// @snippet-file b\n2\n// @snippet-file-end\n");
        assert_eq!(blocks.main, "// @snippet-file main\nx\n");
        assert_eq!(
            blocks.files,
            vec![("a", "1\n// @snippet-file b\n2\n// @snippet-file-end".to_string())]
        );
    }

    #[test]
    fn test_encoding_header() {
        let bytes = encode(&scan("x"));
        assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), VERSION);
        // main "x", expanded "x\n", one segment
        assert_eq!(bytes.len(), 32 + 1 + 2 + 16);
    }
}
