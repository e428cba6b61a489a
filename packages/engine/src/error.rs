use std::path::PathBuf;

use thiserror::Error;

/// Failures to obtain or invoke the accelerator module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccelError {
    #[error("accelerator disabled by configuration")]
    Disabled,

    #[error("accelerator load failed recently; retrying in {remaining_ms}ms")]
    CoolingDown { remaining_ms: u64 },

    #[error("accelerator did not load within {timeout_ms}ms")]
    LoadTimeout { timeout_ms: u64 },

    #[error("failed to load accelerator: {0}")]
    Load(String),

    #[error("accelerator has no export '{0}'")]
    MissingExport(&'static str),

    #[error("export '{export}' returned status {status}")]
    Status { export: &'static str, status: u32 },

    #[error("export '{export}' panicked: {message}")]
    Panicked { export: &'static str, message: String },
}

/// Malformed accelerator output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("bad magic {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u32),

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("segment references file {index} of {files}")]
    BadFileIndex { index: u32, files: usize },

    #[error("record {record}: {reason}")]
    MalformedRecord { record: usize, reason: String },

    #[error("record {record}: unknown rule '{rule}'")]
    UnknownRule { record: usize, rule: String },
}

impl ProtocolError {
    pub(crate) fn record(record: usize, reason: impl Into<String>) -> Self {
        ProtocolError::MalformedRecord {
            record,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Accel(#[from] AccelError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;
