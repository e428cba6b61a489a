//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Edits overlap: {first_start}..{first_end} and {second_start}..{second_end}")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("Edit {start}..{end} is outside the {len}-byte buffer")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    #[error("unable to map the selected element back to source")]
    TargetNotFound,

    #[error("the opening tag of the selected element is incomplete")]
    InvalidOpeningTag,

    #[error("element is not editable: {reason}")]
    NotEditable { reason: String },

    #[error("style is a string; only object styles can be edited")]
    StringStyle,

    #[error("no text at the selected position")]
    TextNotFound,

    #[error("{value} cannot be written as a style value")]
    NonFiniteValue { value: f64 },

    #[error(transparent)]
    Edit(#[from] EditError),
}

pub type WriteResult<T> = Result<T, WriteError>;
