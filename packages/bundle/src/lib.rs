pub mod bundle;
pub mod directives;
pub mod error;
pub mod scan;

pub use bundle::*;
pub use directives::{
    import_names, strip_import_block, validate_file_name, ImportBlock, MAIN_FILE,
};
pub use error::{BundleError, BundleResult};
pub use scan::{expand, scan_file_blocks, FileBlockScan};
