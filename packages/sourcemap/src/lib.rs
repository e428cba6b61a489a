//! Positions and line maps for expanded snippet documents
//!
//! A snippet bundle is flattened into one expanded document for analysis.
//! This crate converts between byte offsets and editor positions, tracks
//! which expanded lines came from which buffer, and exports that mapping
//! as a Source Map v3 document.

pub mod builder;
pub mod error;
pub mod line_map;
pub mod utils;

pub use builder::SourceMapBuilder;
pub use error::LineMapError;
pub use line_map::{LineMap, LineMapBuilder, LineMapSegment, ResolvedPosition, MAIN_SOURCE_NAME};
pub use utils::{offset_at, position_at, LineIndex, SourcePosition, TextRange};
