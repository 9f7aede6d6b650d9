//! Token-to-field classification.

mod classifier;
pub mod patterns;
pub mod rules;

pub use classifier::{classify, Classification, RuleCascade, TokenAssignment};
pub use rules::{Rule, CASCADE};

use crate::error::ClassifyError;

/// Result type for classification operations.
pub type Result<T> = std::result::Result<T, ClassifyError>;
