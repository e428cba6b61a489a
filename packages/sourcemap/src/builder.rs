use std::collections::HashMap;

use sourcemap::{SourceMap as ExternalSourceMap, SourceMapBuilder as ExternalBuilder};

use crate::error::LineMapError;

/// Builder for source maps over an expanded document made of several sources
pub struct SourceMapBuilder {
    builder: ExternalBuilder,
    sources: HashMap<String, u32>,
}

impl SourceMapBuilder {
    /// Create a builder for the generated document `file`
    pub fn new(file: &str) -> Self {
        Self {
            builder: ExternalBuilder::new(Some(file)),
            sources: HashMap::new(),
        }
    }

    /// Register a source, returning its index; repeated names share one entry
    pub fn add_source(&mut self, name: &str, contents: Option<&str>) -> u32 {
        if let Some(id) = self.sources.get(name) {
            return *id;
        }
        let id = self.builder.add_source(name);
        self.builder.set_source_contents(id, contents);
        self.sources.insert(name.to_string(), id);
        id
    }

    /// Add a mapping from generated position to source position (all 0-indexed)
    pub fn add_mapping(
        &mut self,
        gen_line: u32,
        gen_col: u32,
        source: u32,
        src_line: u32,
        src_col: u32,
        name: Option<&str>,
    ) {
        let name_id = name.map(|n| self.builder.add_name(n));

        self.builder.add_raw(
            gen_line,
            gen_col,
            src_line,
            src_col,
            Some(source),
            name_id,
            false, // is_range
        );
    }

    /// Build the final source map
    pub fn build(self) -> ExternalSourceMap {
        self.builder.into_sourcemap()
    }

    /// Convert to JSON string
    pub fn to_json(self) -> Result<String, LineMapError> {
        let map = self.build();
        let mut buf = Vec::new();
        map.to_writer(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
