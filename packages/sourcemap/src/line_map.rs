use serde::{Deserialize, Serialize};

use crate::builder::SourceMapBuilder;
use crate::error::LineMapError;

/// Source name used for the main buffer in exported source maps
pub const MAIN_SOURCE_NAME: &str = "main";

/// A run of expanded-document lines that came from one buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMapSegment {
    /// None for the main buffer
    pub file_name: Option<String>,
    pub expanded_start_line: u32,
    pub original_start_line: u32,
    pub line_count: u32,
}

impl LineMapSegment {
    /// First expanded line after the segment
    pub fn expanded_end_line(&self) -> u32 {
        self.expanded_start_line + self.line_count
    }

    pub fn contains_line(&self, expanded_line: u32) -> bool {
        self.expanded_start_line <= expanded_line && expanded_line < self.expanded_end_line()
    }
}

/// A position in a per-file buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

/// Ordered, gapless segments of an expanded document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMap {
    segments: Vec<LineMapSegment>,
    /// Lines of the main buffer taken by the auto-managed import block
    import_block_lines: u32,
}

impl LineMap {
    pub fn new(segments: Vec<LineMapSegment>, import_block_lines: u32) -> Self {
        Self {
            segments,
            import_block_lines,
        }
    }

    pub fn segments(&self) -> &[LineMapSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<LineMapSegment> {
        self.segments
    }

    pub fn import_block_lines(&self) -> u32 {
        self.import_block_lines
    }

    /// Lines of the expanded document covered by the map
    pub fn total_lines(&self) -> u32 {
        self.segments
            .last()
            .map(|segment| segment.expanded_end_line() - 1)
            .unwrap_or(0)
    }

    /// True when segments start at line 1 and follow each other without gaps
    pub fn is_contiguous(&self) -> bool {
        let mut next = 1;
        for segment in &self.segments {
            if segment.expanded_start_line != next || segment.line_count == 0 {
                return false;
            }
            next = segment.expanded_end_line();
        }
        true
    }

    fn segment_for(&self, expanded_line: u32) -> Option<&LineMapSegment> {
        let index = self
            .segments
            .partition_point(|segment| segment.expanded_start_line <= expanded_line);
        let segment = self.segments.get(index.checked_sub(1)?)?;
        segment.contains_line(expanded_line).then_some(segment)
    }

    /// Map an expanded-document position back to its buffer.
    ///
    /// Main-buffer lines are reported relative to the user-visible buffer,
    /// so lines inside the import block have no position.
    pub fn resolve(&self, expanded_line: u32, column: u32) -> Option<ResolvedPosition> {
        let segment = self.segment_for(expanded_line)?;
        let mut line = segment.original_start_line + (expanded_line - segment.expanded_start_line);

        if segment.file_name.is_none() {
            if line <= self.import_block_lines {
                return None;
            }
            line -= self.import_block_lines;
        }

        Some(ResolvedPosition {
            file: segment.file_name.clone(),
            line,
            column,
        })
    }

    /// Map a buffer line to its expanded-document line
    pub fn expanded_line(&self, file: Option<&str>, line: u32) -> Option<u32> {
        if line == 0 {
            return None;
        }
        let segment = self
            .segments
            .iter()
            .find(|segment| segment.file_name.as_deref() == file)?;

        let original = if file.is_none() {
            line + self.import_block_lines
        } else {
            line
        };
        if original < segment.original_start_line {
            return None;
        }
        let offset = original - segment.original_start_line;
        (offset < segment.line_count).then(|| segment.expanded_start_line + offset)
    }

    /// Line-granular Source Map v3 for the expanded document
    pub fn to_source_map(&self, expanded_file: &str) -> Result<String, LineMapError> {
        let mut builder = SourceMapBuilder::new(expanded_file);

        for segment in &self.segments {
            let name = segment.file_name.as_deref().unwrap_or(MAIN_SOURCE_NAME);
            let source = builder.add_source(name, None);
            for expanded_line in segment.expanded_start_line..segment.expanded_end_line() {
                if let Some(resolved) = self.resolve(expanded_line, 1) {
                    builder.add_mapping(expanded_line - 1, 0, source, resolved.line - 1, 0, None);
                }
            }
        }

        builder.to_json()
    }
}

/// Accumulates an expanded document piece by piece, recording segments
#[derive(Debug, Default)]
pub struct LineMapBuilder {
    expanded: String,
    segments: Vec<LineMapSegment>,
    next_line: u32,
}

impl LineMapBuilder {
    pub fn new() -> Self {
        Self {
            expanded: String::new(),
            segments: Vec::new(),
            next_line: 1,
        }
    }

    /// Append one buffer; empty pieces leave no segment
    pub fn push(&mut self, file_name: Option<&str>, piece: &str) {
        if piece.is_empty() {
            return;
        }

        self.expanded.push_str(piece);
        if !piece.ends_with('\n') {
            self.expanded.push('\n');
        }

        let mut line_count = piece.bytes().filter(|byte| *byte == b'\n').count() as u32;
        if !piece.ends_with('\n') {
            line_count += 1;
        }

        self.segments.push(LineMapSegment {
            file_name: file_name.map(str::to_string),
            expanded_start_line: self.next_line,
            original_start_line: 1,
            line_count,
        });
        self.next_line += line_count;
    }

    pub fn finish(self, import_block_lines: u32) -> (String, LineMap) {
        (self.expanded, LineMap::new(self.segments, import_block_lines))
    }
}
