//! Decoding of accelerator output into the shared data model.
//!
//! Decoders are strict: anything short of a well-formed payload is a
//! [`ProtocolError`], and the caller falls back for that call.

use snippet_accel::protocol::{
    FLAG_HAS_FILE_BLOCKS, HEADER_LEN, MAGIC, NONE_FIELD, TAG_CANDIDATE, TAG_ENTRY, TAG_SECURITY,
    TAG_TEXT, VERSION,
};
use snippet_bundle::FileBlockScan;
use snippet_editor::{EntryKind, InspectIndex, InspectIndexEntry};
use snippet_linter::SecurityIssue;
use snippet_sourcemap::{LineMapSegment, SourcePosition, TextRange};

use crate::error::ProtocolError;

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        let available = self.bytes.len() - self.offset;
        if len > available {
            return Err(ProtocolError::Truncated {
                offset: self.offset,
                needed: len,
                available,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self, len: u32) -> Result<String, ProtocolError> {
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    fn finish(self) -> Result<(), ProtocolError> {
        match self.bytes.len() - self.offset {
            0 => Ok(()),
            rest => Err(ProtocolError::TrailingBytes(rest)),
        }
    }
}

pub fn decode_file_blocks(bytes: &[u8]) -> Result<FileBlockScan, ProtocolError> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            offset: 0,
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut reader = Reader::new(bytes);

    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ProtocolError::BadMagic(magic));
    }
    let version = reader.u32()?;
    if version != VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    let flags = reader.u32()?;
    let main_len = reader.u32()?;
    let file_count = reader.u32()?;
    let expanded_len = reader.u32()?;
    let segment_count = reader.u32()?;
    let _reserved = reader.u32()?;

    let main_source = reader.string(main_len)?;

    let mut files = Vec::new();
    for _ in 0..file_count {
        let name_len = reader.u32()?;
        let content_len = reader.u32()?;
        let name = reader.string(name_len)?;
        let content = reader.string(content_len)?;
        files.push((name, content));
    }

    let expanded_source = reader.string(expanded_len)?;

    let mut segments = Vec::new();
    for _ in 0..segment_count {
        let index = reader.u32()?;
        let file_name = match index {
            0 => None,
            n => match files.get(n as usize - 1) {
                Some((name, _)) => Some(name.clone()),
                None => {
                    return Err(ProtocolError::BadFileIndex {
                        index: n,
                        files: files.len(),
                    })
                }
            },
        };
        segments.push(LineMapSegment {
            file_name,
            expanded_start_line: reader.u32()?,
            original_start_line: reader.u32()?,
            line_count: reader.u32()?,
        });
    }
    reader.finish()?;

    Ok(FileBlockScan {
        has_file_blocks: flags & FLAG_HAS_FILE_BLOCKS != 0,
        main_source,
        files,
        expanded_source,
        segments,
    })
}

/// Tab-separated fields of each record, tag first
fn records(bytes: &[u8]) -> Result<Vec<(u8, Vec<&str>)>, ProtocolError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = text.strip_suffix('\n') else {
        return Err(ProtocolError::record(0, "output does not end with a newline"));
    };

    body.split('\n')
        .enumerate()
        .map(|(index, line)| {
            let mut fields = line.split('\t');
            let tag = match fields.next().map(str::as_bytes) {
                Some([tag]) => *tag,
                _ => return Err(ProtocolError::record(index, "missing tag")),
            };
            Ok((tag, fields.collect()))
        })
        .collect()
}

fn expect_tag(index: usize, tag: u8, expected: u8) -> Result<(), ProtocolError> {
    if tag == expected {
        Ok(())
    } else {
        Err(ProtocolError::record(
            index,
            format!("expected tag '{}', found '{}'", expected as char, tag as char),
        ))
    }
}

fn expect_fields<'f, 'a>(
    index: usize,
    fields: &'f [&'a str],
    count: usize,
) -> Result<&'f [&'a str], ProtocolError> {
    if fields.len() == count {
        Ok(fields)
    } else {
        Err(ProtocolError::record(
            index,
            format!("expected {} fields, found {}", count, fields.len()),
        ))
    }
}

fn number<T: std::str::FromStr>(index: usize, field: &str) -> Result<T, ProtocolError> {
    field
        .parse()
        .map_err(|_| ProtocolError::record(index, format!("'{}' is not a number", field)))
}

fn position(index: usize, line: &str, column: &str) -> Result<SourcePosition, ProtocolError> {
    let position = SourcePosition::new(number(index, line)?, number(index, column)?);
    if position.line == 0 || position.column == 0 {
        return Err(ProtocolError::record(index, "positions are 1-based"));
    }
    Ok(position)
}

fn range(index: usize, fields: &[&str]) -> Result<TextRange, ProtocolError> {
    let start = position(index, fields[0], fields[1])?;
    let end = position(index, fields[2], fields[3])?;
    if end < start {
        return Err(ProtocolError::record(index, "range ends before it starts"));
    }
    Ok(TextRange::new(start, end))
}

pub fn decode_candidates(bytes: &[u8]) -> Result<Vec<String>, ProtocolError> {
    records(bytes)?
        .into_iter()
        .enumerate()
        .map(|(index, (tag, fields))| {
            expect_tag(index, tag, TAG_CANDIDATE)?;
            let fields = expect_fields(index, &fields, 1)?;
            if fields[0].is_empty() {
                return Err(ProtocolError::record(index, "empty candidate"));
            }
            Ok(fields[0].to_string())
        })
        .collect()
}

/// Security records carry only rule and position; severity and message come
/// from the built-in rule of the same name
pub fn decode_security(bytes: &[u8]) -> Result<Vec<SecurityIssue>, ProtocolError> {
    records(bytes)?
        .into_iter()
        .enumerate()
        .map(|(index, (tag, fields))| {
            expect_tag(index, tag, TAG_SECURITY)?;
            let fields = expect_fields(index, &fields, 3)?;
            let rule = snippet_linter::rule(fields[0])
                .ok_or_else(|| ProtocolError::UnknownRule {
                    record: index,
                    rule: fields[0].to_string(),
                })?;
            Ok(rule.issue(position(index, fields[1], fields[2])?))
        })
        .collect()
}

pub fn decode_inspect_index(bytes: &[u8]) -> Result<InspectIndex, ProtocolError> {
    let mut entries: Vec<InspectIndexEntry> = Vec::new();

    for (index, (tag, fields)) in records(bytes)?.into_iter().enumerate() {
        match tag {
            TAG_ENTRY => {
                let fields = expect_fields(index, &fields, 8)?;
                let id: usize = number(index, fields[0])?;
                if id != entries.len() {
                    return Err(ProtocolError::record(index, format!("entry {} out of order", id)));
                }
                let parent_id = match fields[1] {
                    NONE_FIELD => None,
                    raw => {
                        let parent: usize = number(index, raw)?;
                        if parent >= id {
                            return Err(ProtocolError::record(index, "parent after child"));
                        }
                        Some(parent)
                    }
                };
                let kind = match fields[2] {
                    "e" => EntryKind::Element,
                    "f" => EntryKind::Fragment,
                    other => {
                        return Err(ProtocolError::record(index, format!("unknown kind '{}'", other)))
                    }
                };
                let name = match fields[3] {
                    NONE_FIELD => None,
                    name => Some(name.to_string()),
                };
                entries.push(InspectIndexEntry {
                    id,
                    parent_id,
                    range: range(index, &fields[4..])?,
                    kind,
                    name,
                    text_ranges: Vec::new(),
                });
            }
            TAG_TEXT => {
                let fields = expect_fields(index, &fields, 5)?;
                let id: usize = number(index, fields[0])?;
                let text_range = range(index, &fields[1..])?;
                match entries.last_mut() {
                    Some(entry) if entry.id == id => entry.text_ranges.push(text_range),
                    _ => {
                        return Err(ProtocolError::record(
                            index,
                            format!("text for entry {} outside its entry", id),
                        ))
                    }
                }
            }
            other => {
                return Err(ProtocolError::record(
                    index,
                    format!("unexpected tag '{}'", other as char),
                ))
            }
        }
    }

    Ok(InspectIndex::from_entries(entries))
}
