//! Error types shared by the store, renderer, editor and CLI.

use thiserror::Error;

/// Reasons the layout editor refuses an operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Please load a template image first")]
    NoTemplate,
    #[error("Field ID already exists: {0}")]
    DuplicateField(String),
    #[error("Field ID must not be empty")]
    EmptyFieldId,
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("No field selected")]
    NothingSelected,
}

#[derive(Error, Debug)]
pub enum PrintError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Malformed file: {0}")]
    Malformed(String),
    #[error("Failed to create PDF: {0}")]
    Pdf(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrintError>;
