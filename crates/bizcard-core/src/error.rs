//! Error types for the bizcard-core library.

use thiserror::Error;

/// Main error type for the bizcard library.
#[derive(Error, Debug)]
pub enum BizcardError {
    /// Token classification error.
    #[error("classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Record store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the field classifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// Fewer than two tokens were supplied; NAME and DESIGNATION are positional.
    #[error("at least 2 tokens are required, got {found}")]
    InsufficientInput { found: usize },
}

/// Errors related to OCR processing.
///
/// Every variant means the card could not be read, so classification is
/// never attempted on a partial token sequence.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The engine ran but produced no usable text.
    #[error("no text detected in image")]
    NoText,

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl OcrError {
    /// Whether retrying with another photo of the card may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OcrError::ModelLoad(_))
    }
}

/// Errors raised by a record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A row with the same (name, designation) pair already exists.
    #[error("duplicate entry for name '{name}' and designation '{designation}'")]
    Duplicate { name: String, designation: String },

    /// No row has the requested id.
    #[error("no entry with id {0}")]
    NotFound(i64),

    /// The store could not be opened or is unreachable.
    #[error("store unavailable: {0}")]
    Connection(String),

    /// A statement failed for a reason other than connectivity.
    #[error("query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// Whether this error rejected a duplicate insert.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Result type for the bizcard library.
pub type Result<T> = std::result::Result<T, BizcardError>;
