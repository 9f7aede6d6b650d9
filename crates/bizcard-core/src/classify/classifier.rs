//! Rule-cascade classifier producing an [`ExtractionRecord`].

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::ClassifyError;
use crate::models::card::{ExtractionRecord, FieldName, NOT_FOUND};

use super::rules::{Rule, CASCADE};
use super::Result;

/// Where a single token ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAssignment {
    /// Position in the token sequence.
    pub index: usize,
    /// Raw token text.
    pub token: String,
    /// Field that received the token.
    pub field: FieldName,
    /// Rule that claimed it ("position" for NAME and DESIGNATION).
    pub rule: &'static str,
    /// Value appended to the field.
    pub value: String,
}

/// Record plus a per-token trace of the decisions made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub record: ExtractionRecord,
    pub assignments: Vec<TokenAssignment>,
}

/// Per-field accumulation of matched values before collapsing.
#[derive(Default)]
struct FieldBuckets([Vec<String>; 10]);

impl FieldBuckets {
    fn push(&mut self, field: FieldName, value: String) {
        self.0[field.index()].push(value);
    }

    /// Collapse every field to a single presentation string.
    ///
    /// CONTACT is always joined, so a card without phone numbers gets an
    /// empty string there rather than the placeholder. Other fields keep their
    /// first match.
    fn finish(mut self) -> ExtractionRecord {
        ExtractionRecord::from_fn(|field| {
            let values = std::mem::take(&mut self.0[field.index()]);
            match field {
                FieldName::Contact => values.join(", "),
                FieldName::CompanyName if !values.is_empty() => values.join(" "),
                _ => values
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| NOT_FOUND.to_string()),
            }
        })
    }
}

/// Classifier that runs tokens through an ordered rule list.
#[derive(Debug, Clone, Copy)]
pub struct RuleCascade {
    rules: &'static [Rule],
}

impl RuleCascade {
    /// Create a classifier using the standard cascade.
    pub fn new() -> Self {
        Self { rules: &CASCADE }
    }

    /// Create a classifier over a custom rule list, tried in order.
    pub fn with_rules(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    /// Classify tokens into a record.
    pub fn classify<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ExtractionRecord> {
        self.classify_with_trace(tokens).map(|c| c.record)
    }

    /// Classify tokens, keeping track of which rule claimed each one.
    pub fn classify_with_trace<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Classification> {
        if tokens.len() < 2 {
            return Err(ClassifyError::InsufficientInput {
                found: tokens.len(),
            });
        }

        let mut buckets = FieldBuckets::default();
        let mut assignments = Vec::with_capacity(tokens.len());

        for (index, field) in [FieldName::Name, FieldName::Designation].into_iter().enumerate() {
            let token = tokens[index].as_ref();
            buckets.push(field, token.to_string());
            assignments.push(TokenAssignment {
                index,
                token: token.to_string(),
                field,
                rule: "position",
                value: token.to_string(),
            });
        }

        for (index, token) in tokens.iter().enumerate().skip(2) {
            let token = token.as_ref();
            let Some((rule, value)) = self
                .rules
                .iter()
                .find_map(|rule| rule.apply(token).map(|value| (rule, value)))
            else {
                // Only reachable with a custom rule list lacking a catch-all.
                trace!("token {} ({:?}) matched no rule", index, token);
                continue;
            };

            trace!("token {} ({:?}) -> {} via {}", index, token, rule.field, rule.name);
            buckets.push(rule.field, value.clone());
            assignments.push(TokenAssignment {
                index,
                token: token.to_string(),
                field: rule.field,
                rule: rule.name,
                value,
            });
        }

        let record = buckets.finish();
        let missing = FieldName::ALL.iter().filter(|f| record.is_missing(**f)).count();
        debug!(
            "Classified {} tokens, {} of {} fields not found",
            tokens.len(),
            missing,
            FieldName::ALL.len()
        );

        Ok(Classification {
            record,
            assignments,
        })
    }
}

impl Default for RuleCascade {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify tokens with the standard cascade.
pub fn classify<S: AsRef<str>>(tokens: &[S]) -> Result<ExtractionRecord> {
    RuleCascade::new().classify(tokens)
}
