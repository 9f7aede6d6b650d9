//! Core library for business card OCR processing.
//!
//! This crate provides:
//! - The fixed ten-field card schema and extraction record
//! - An ordered rule cascade that classifies OCR tokens into fields
//! - A token source seam with a pure Rust OCR engine behind it
//! - A record store seam with a SQLite implementation
//! - A pipeline tying the three stages together

pub mod error;
pub mod models;
pub mod classify;
pub mod ocr;
pub mod store;
pub mod pipeline;

pub use error::{BizcardError, ClassifyError, OcrError, Result, StoreError};
pub use models::card::{ExtractionRecord, FieldName, PersistedRow, NOT_FOUND};
pub use models::config::BizcardConfig;
pub use classify::{classify, Classification, RuleCascade, TokenAssignment};
pub use ocr::{open_image, OcrResult, TextBox, TokenSource};
#[cfg(feature = "native")]
pub use ocr::CardOcrEngine;
pub use store::RecordStore;
#[cfg(feature = "native")]
pub use store::SqliteStore;
pub use pipeline::{CardExtraction, CardPipeline, StoreOutcome};
