use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    #[error("Invalid file name '{name}': names must be non-empty and contain no whitespace")]
    InvalidName { name: String },

    #[error("'{name}' is reserved for the entry file")]
    ReservedName { name: String },

    #[error("File '{name}' already exists in bundle")]
    DuplicateFile { name: String },

    #[error("File '{name}' not found in bundle")]
    FileNotFound { name: String },
}

pub type BundleResult<T> = Result<T, BundleError>;
