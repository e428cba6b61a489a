//! Output formats shared with the host.
//!
//! The file-block scan answers with a little-endian binary payload:
//!
//! ```text
//! u32 magic "SNIP" | u32 version | u32 flags | u32 main_len | u32 file_count
//! u32 expanded_len | u32 segment_count | u32 reserved
//! main bytes
//! file_count x (u32 name_len, u32 content_len, name, content)
//! expanded bytes
//! segment_count x (u32 file_index, u32 expanded_start_line,
//!                  u32 original_start_line, u32 line_count)
//! ```
//!
//! Every other scan answers with newline-delimited records: one tag byte,
//! then tab-separated fields.

use std::fmt::{Display, Write};

pub const MAGIC: u32 = 0x5049_4E53;
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 8 * 4;
pub const FLAG_HAS_FILE_BLOCKS: u32 = 1;

pub const TAG_CANDIDATE: u8 = b'C';
pub const TAG_SECURITY: u8 = b'S';
pub const TAG_ENTRY: u8 = b'E';
pub const TAG_TEXT: u8 = b'T';

/// No parent / no name
pub const NONE_FIELD: &str = "-";

/// Result codes of the `snippet_<op>` exports
pub const STATUS_OK: u32 = 0;
pub const STATUS_INVALID_UTF8: u32 = 1;
pub const STATUS_NULL_INPUT: u32 = 2;

/// One exported scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FileBlocks,
    ClassCandidates,
    Security,
    InspectIndex,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::FileBlocks,
        Operation::ClassCandidates,
        Operation::Security,
        Operation::InspectIndex,
    ];

    /// Name of the export implementing the operation
    pub fn export_name(self) -> &'static str {
        match self {
            Operation::FileBlocks => "snippet_scan_file_blocks",
            Operation::ClassCandidates => "snippet_scan_class_candidates",
            Operation::Security => "snippet_scan_security",
            Operation::InspectIndex => "snippet_build_inspect_index",
        }
    }
}

/// Builder for newline-delimited records
#[derive(Debug, Default)]
pub struct RecordWriter {
    out: String,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tag: u8, fields: &[&dyn Display]) {
        self.out.push(tag as char);
        for field in fields {
            // Writing into a String cannot fail
            let _ = write!(self.out, "\t{}", field);
        }
        self.out.push('\n');
    }

    pub fn finish(self) -> Vec<u8> {
        self.out.into_bytes()
    }
}

/// Little-endian writer for the binary payload
#[derive(Debug, Default)]
pub struct BinaryWriter {
    out: Vec<u8>,
}

impl BinaryWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    pub fn u32(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
