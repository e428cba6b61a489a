//! Byte-level accelerator for the snippet source scans.
//!
//! Every scan here has a parser-backed reference in the host crates and must
//! answer identically on well-formed input. The host reaches the scans either
//! through the raw memory exports in [`abi`] or the `wasm-bindgen` functions
//! below; both return the encodings described in [`protocol`].

pub mod abi;
pub mod blocks;
pub mod candidates;
pub mod inspect;
pub mod lines;
pub mod protocol;
pub mod security;

use wasm_bindgen::prelude::*;

pub use protocol::Operation;

/// Run one scan and encode its answer
pub fn run(operation: Operation, source: &str) -> Vec<u8> {
    match operation {
        Operation::FileBlocks => blocks::encode(&blocks::scan(source)),
        Operation::ClassCandidates => candidates::encode(&candidates::scan(source)),
        Operation::Security => security::encode(&security::scan(source)),
        Operation::InspectIndex => inspect::encode(source, &inspect::build(source)),
    }
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = scanFileBlocks)]
pub fn scan_file_blocks_js(source: &str) -> Vec<u8> {
    run(Operation::FileBlocks, source)
}

#[wasm_bindgen(js_name = scanClassCandidates)]
pub fn scan_class_candidates_js(source: &str) -> Vec<u8> {
    run(Operation::ClassCandidates, source)
}

#[wasm_bindgen(js_name = scanSecurity)]
pub fn scan_security_js(source: &str) -> Vec<u8> {
    run(Operation::Security, source)
}

#[wasm_bindgen(js_name = buildInspectIndex)]
pub fn build_inspect_index_js(source: &str) -> Vec<u8> {
    run(Operation::InspectIndex, source)
}

/// Protocol version, for hosts checking compatibility before the first scan
#[wasm_bindgen(js_name = protocolVersion)]
pub fn protocol_version() -> u32 {
    protocol::VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_match_run() {
        let source = "<div className=\"p-4\">{eval(x)}</div>";
        assert_eq!(scan_class_candidates_js(source), b"C\tp-4\n");
        assert_eq!(scan_security_js(source), b"S\tno-eval\t1\t23\n");
        assert_eq!(build_inspect_index_js(source), run(Operation::InspectIndex, source));
        assert_eq!(&scan_file_blocks_js(source)[..4], &protocol::MAGIC.to_le_bytes());
    }
}
