use serde::{Deserialize, Serialize};
use snippet_sourcemap::{LineMap, LineMapBuilder, LineMapSegment};

use crate::directives::{directive, Directive, ImportBlock};

/// Result of splitting a multi-file blob into its buffers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBlockScan {
    pub has_file_blocks: bool,
    /// Main buffer with its import block still in place
    pub main_source: String,
    /// Files in first-declaration order
    pub files: Vec<(String, String)>,
    pub expanded_source: String,
    pub segments: Vec<LineMapSegment>,
}

impl FileBlockScan {
    pub fn import_block(&self) -> ImportBlock {
        ImportBlock::scan(&self.main_source)
    }

    pub fn line_map(&self) -> LineMap {
        LineMap::new(self.segments.clone(), self.import_block().lines)
    }
}

struct OpenSection {
    name: String,
    content: String,
    /// Another start appeared before an end; the section runs to EOF
    dangling: bool,
}

fn close_section(files: &mut Vec<(String, String)>, section: OpenSection) {
    let OpenSection {
        name, mut content, ..
    } = section;

    // Drop the section's own line terminator
    let terminator = if content.ends_with("\r\n") {
        2
    } else {
        usize::from(content.ends_with('\n'))
    };
    content.truncate(content.len() - terminator);

    match files.iter_mut().find(|(existing, _)| *existing == name) {
        Some((_, existing)) => *existing = content,
        None => files.push((name, content)),
    }
}

/// Split `source` into the raw main buffer and its file sections, and build
/// the expanded document for them
pub fn scan_file_blocks(source: &str) -> FileBlockScan {
    let mut main_source = String::new();
    let mut files: Vec<(String, String)> = Vec::new();
    let mut open: Option<OpenSection> = None;
    let mut has_file_blocks = false;

    for line in source.split_inclusive('\n') {
        match (open.as_mut(), directive(line)) {
            (Some(section), _) if section.dangling => section.content.push_str(line),
            (Some(_), Some(Directive::FileEnd)) => {
                if let Some(section) = open.take() {
                    close_section(&mut files, section);
                }
            }
            (Some(section), Some(Directive::FileStart(name))) => {
                tracing::debug!(
                    section = %section.name,
                    next = name,
                    "file section left open; extending to end of document"
                );
                section.dangling = true;
                section.content.push_str(line);
            }
            (Some(section), None) => section.content.push_str(line),
            (None, Some(Directive::FileStart(name))) => {
                has_file_blocks = true;
                open = Some(OpenSection {
                    name: name.to_string(),
                    content: String::new(),
                    dangling: false,
                });
            }
            (None, _) => main_source.push_str(line),
        }
    }

    if let Some(section) = open.take() {
        close_section(&mut files, section);
    }

    let (expanded_source, line_map) = expand(
        &main_source,
        files.iter().map(|(name, content)| (name.as_str(), content.as_str())),
    );

    FileBlockScan {
        has_file_blocks,
        main_source,
        files,
        expanded_source,
        segments: line_map.into_segments(),
    }
}

/// Flatten a raw main buffer and its files into one document.
///
/// Import block lines of the main buffer are kept as empty lines so the rest
/// of the buffer keeps its line numbers.
pub fn expand<'a>(
    raw_main: &str,
    files: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> (String, LineMap) {
    let block = ImportBlock::scan(raw_main);

    let mut main_piece = "\n".repeat(block.lines as usize);
    main_piece.push_str(&raw_main[block.len..]);

    let mut builder = LineMapBuilder::new();
    builder.push(None, &main_piece);
    for (name, content) in files {
        builder.push(Some(name), content);
    }
    builder.finish(block.lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_source_has_no_blocks() {
        let scan = scan_file_blocks("export default () => <div />;\n");
        assert!(!scan.has_file_blocks);
        assert_eq!(scan.main_source, "export default () => <div />;\n");
        assert!(scan.files.is_empty());
        assert_eq!(scan.expanded_source, scan.main_source);
        assert_eq!(scan.segments.len(), 1);
        assert_eq!(scan.segments[0].line_count, 1);
    }

    #[test]
    fn test_sections_and_main() {
        let source = "// @snippet-imports (auto-managed)\n// @import card.tsx\n\n// @snippet-file card.tsx\nexport const Card = () => (\n  <div />\n);\n// @snippet-file-end\nexport default () => <Card />;";
        let scan = scan_file_blocks(source);

        assert!(scan.has_file_blocks);
        assert_eq!(
            scan.files,
            vec![(
                "card.tsx".to_string(),
                "export const Card = () => (\n  <div />\n);".to_string()
            )]
        );
        assert_eq!(
            scan.main_source,
            "// @snippet-imports (auto-managed)\n// @import card.tsx\n\nexport default () => <Card />;"
        );
        assert_eq!(
            scan.expanded_source,
            "\n\n\nexport default () => <Card />;\nexport const Card = () => (\n  <div />\n);\n"
        );

        let map = scan.line_map();
        assert_eq!(map.import_block_lines(), 3);
        assert_eq!(map.resolve(4, 1).unwrap().line, 1);
        assert_eq!(
            map.resolve(6, 3).unwrap().file.as_deref(),
            Some("card.tsx")
        );
    }

    #[test]
    fn test_dangling_section_extends_to_end() {
        let source = "main\n// @snippet-file a.tsx\nline a\n// @snippet-file b.tsx\nline b\n// @snippet-file-end\ntail\n";
        let scan = scan_file_blocks(source);
        assert_eq!(scan.main_source, "main\n");
        assert_eq!(
            scan.files,
            vec![(
                "a.tsx".to_string(),
                "line a\n// @snippet-file b.tsx\nline b\n// @snippet-file-end\ntail".to_string()
            )]
        );
    }

    #[test]
    fn test_unterminated_section() {
        let scan = scan_file_blocks("// @snippet-file a.tsx\nconst a = 1;");
        assert_eq!(scan.main_source, "");
        assert_eq!(
            scan.files,
            vec![("a.tsx".to_string(), "const a = 1;".to_string())]
        );
        // The empty main buffer contributes no segment
        assert_eq!(scan.segments.len(), 1);
        assert_eq!(scan.segments[0].file_name.as_deref(), Some("a.tsx"));
    }

    #[test]
    fn test_duplicate_name_keeps_first_position() {
        let source = "// @snippet-file a.tsx\nfirst\n// @snippet-file-end\n// @snippet-file b.tsx\nb\n// @snippet-file-end\n// @snippet-file a.tsx\nsecond\n// @snippet-file-end\n";
        let scan = scan_file_blocks(source);
        assert_eq!(
            scan.files,
            vec![
                ("a.tsx".to_string(), "second".to_string()),
                ("b.tsx".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_crlf_line_breaks() {
        let source = "// @snippet-file a.tsx\r\none\r\ntwo\r\n// @snippet-file-end\r\nmain\r\n";
        let scan = scan_file_blocks(source);
        assert_eq!(
            scan.files,
            vec![("a.tsx".to_string(), "one\r\ntwo".to_string())]
        );
        assert_eq!(scan.main_source, "main\r\n");
    }

    #[test]
    fn test_stray_end_stays_in_main() {
        let scan = scan_file_blocks("a\n// @snippet-file-end\nb");
        assert!(!scan.has_file_blocks);
        assert_eq!(scan.main_source, "a\n// @snippet-file-end\nb");
    }

    #[test]
    fn test_empty_section() {
        let scan = scan_file_blocks("// @snippet-file a.tsx\n// @snippet-file-end\n");
        assert_eq!(scan.files, vec![("a.tsx".to_string(), String::new())]);
        assert!(scan.segments.is_empty());
        assert_eq!(scan.expanded_source, "");
    }
}
