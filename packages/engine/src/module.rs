use std::panic::{self, AssertUnwindSafe};

use snippet_accel::abi;
use snippet_accel::protocol::STATUS_OK;
pub use snippet_accel::Operation;

use crate::error::AccelError;

/// A loaded accelerator: answers each operation with its encoded output
pub trait AcceleratorModule: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the module provides the export named `export`
    fn has_export(&self, export: &str) -> bool;

    fn call(&self, operation: Operation, source: &str) -> Result<Vec<u8>, AccelError>;
}

type Export = unsafe extern "C" fn(*const u8, usize) -> u32;

/// The accelerator linked into this binary, driven through its raw memory
/// exports the same way a host drives the WebAssembly build
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeModule;

impl NativeModule {
    pub fn new() -> Self {
        Self
    }

    fn export(operation: Operation) -> Export {
        match operation {
            Operation::FileBlocks => abi::snippet_scan_file_blocks,
            Operation::ClassCandidates => abi::snippet_scan_class_candidates,
            Operation::Security => abi::snippet_scan_security,
            Operation::InspectIndex => abi::snippet_build_inspect_index,
        }
    }
}

impl AcceleratorModule for NativeModule {
    fn name(&self) -> &str {
        "native"
    }

    fn has_export(&self, export: &str) -> bool {
        Operation::ALL
            .iter()
            .any(|operation| operation.export_name() == export)
    }

    fn call(&self, operation: Operation, source: &str) -> Result<Vec<u8>, AccelError> {
        let export = Self::export(operation);
        let name = operation.export_name();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let len = source.len();
            let input = abi::snippet_alloc(len);
            // SAFETY: `input` has capacity for `len` bytes and is freed once;
            // the output buffer is copied before any other call can replace it
            unsafe {
                std::ptr::copy_nonoverlapping(source.as_ptr(), input, len);
                let status = export(input, len);
                abi::snippet_free(input, len);
                if status != STATUS_OK {
                    return Err(status);
                }
                let output = std::slice::from_raw_parts(abi::snippet_output_ptr(), abi::snippet_output_len());
                Ok(output.to_vec())
            }
        }));

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(status)) => Err(AccelError::Status {
                export: name,
                status,
            }),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(AccelError::Panicked {
                    export: name,
                    message,
                })
            }
        }
    }
}
