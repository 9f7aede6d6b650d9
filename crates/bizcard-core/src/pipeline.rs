//! End-to-end card processing: tokens in, classified and stored record out.

use image::DynamicImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{Classification, RuleCascade};
use crate::error::{Result, StoreError};
use crate::ocr::TokenSource;
use crate::store::RecordStore;

/// What happened when the record was handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StoreOutcome {
    /// Stored under this id.
    Inserted(i64),
    /// A row with the same name and designation already exists.
    Duplicate,
    /// No store was attached.
    Skipped,
    /// The store failed; the record was not saved.
    Unavailable(String),
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct CardExtraction {
    pub tokens: Vec<String>,
    pub classification: Classification,
    pub store: StoreOutcome,
}

/// Runs token source, classifier and (optionally) store in sequence.
pub struct CardPipeline<'a> {
    cascade: RuleCascade,
    store: Option<&'a dyn RecordStore>,
}

impl<'a> CardPipeline<'a> {
    /// Create a pipeline that classifies without saving.
    pub fn new() -> Self {
        Self {
            cascade: RuleCascade::new(),
            store: None,
        }
    }

    /// Save every classified record to `store`.
    pub fn with_store(mut self, store: &'a dyn RecordStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Read tokens from `image`, then classify and store them.
    ///
    /// OCR failures abort the run before classification.
    pub fn run(&self, source: &dyn TokenSource, image: &DynamicImage) -> Result<CardExtraction> {
        let tokens = source.recognize(image)?;
        info!("Token source produced {} tokens", tokens.len());
        self.run_tokens(tokens)
    }

    /// Classify an existing token sequence and store the result.
    ///
    /// Store failures are reported in [`CardExtraction::store`]; only
    /// classification errors fail the call.
    pub fn run_tokens(&self, tokens: Vec<String>) -> Result<CardExtraction> {
        let classification = self.cascade.classify_with_trace(&tokens)?;
        let store = self.save(&classification);

        Ok(CardExtraction {
            tokens,
            classification,
            store,
        })
    }

    fn save(&self, classification: &Classification) -> StoreOutcome {
        let Some(store) = self.store else {
            return StoreOutcome::Skipped;
        };

        match store.insert(&classification.record) {
            Ok(id) => StoreOutcome::Inserted(id),
            Err(StoreError::Duplicate { .. }) => StoreOutcome::Duplicate,
            Err(e) => {
                warn!("Record not saved: {}", e);
                StoreOutcome::Unavailable(e.to_string())
            }
        }
    }
}

impl Default for CardPipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use crate::error::{BizcardError, ClassifyError, OcrError};
    use crate::models::card::{ExtractionRecord, PersistedRow};
    use crate::store;

    struct ScriptedSource(Vec<&'static str>);

    impl TokenSource for ScriptedSource {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<Vec<String>, OcrError> {
            if self.0.is_empty() {
                return Err(OcrError::NoText);
            }
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingSource;

    impl TokenSource for FailingSource {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<Vec<String>, OcrError> {
            Err(OcrError::Recognition("engine crashed".to_string()))
        }
    }

    /// In-memory store that records every insert attempt.
    #[derive(Default)]
    struct VecStore {
        rows: RefCell<Vec<PersistedRow>>,
        broken: bool,
    }

    impl RecordStore for VecStore {
        fn insert(&self, record: &ExtractionRecord) -> store::Result<i64> {
            if self.broken {
                return Err(StoreError::Connection("disk gone".to_string()));
            }
            let mut rows = self.rows.borrow_mut();
            if rows
                .iter()
                .any(|r| r.record.name == record.name && r.record.designation == record.designation)
            {
                return Err(StoreError::Duplicate {
                    name: record.name.clone(),
                    designation: record.designation.clone(),
                });
            }
            let id = rows.len() as i64 + 1;
            rows.push(PersistedRow {
                id,
                record: record.clone(),
            });
            Ok(id)
        }

        fn list(&self) -> store::Result<Vec<PersistedRow>> {
            Ok(self.rows.borrow().clone())
        }

        fn delete_by_id(&self, id: i64) -> store::Result<()> {
            let mut rows = self.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            if rows.len() == before {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        }
    }

    fn blank_image() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_run_without_store() {
        let source = ScriptedSource(vec!["Jane Doe", "Manager", "jane@acme.com"]);
        let result = CardPipeline::new().run(&source, &blank_image()).unwrap();

        assert_eq!(result.store, StoreOutcome::Skipped);
        assert_eq!(result.tokens.len(), 3);
        assert_eq!(result.classification.record.email, "jane@acme.com");
    }

    #[test]
    fn test_run_inserts_then_reports_duplicate() {
        let store = VecStore::default();
        let pipeline = CardPipeline::new().with_store(&store);
        let source = ScriptedSource(vec!["Jane Doe", "Manager", "Acme"]);

        let first = pipeline.run(&source, &blank_image()).unwrap();
        let second = pipeline.run(&source, &blank_image()).unwrap();

        assert_eq!(first.store, StoreOutcome::Inserted(1));
        assert_eq!(second.store, StoreOutcome::Duplicate);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_ocr_failure_skips_classification_and_store() {
        let store = VecStore::default();
        let pipeline = CardPipeline::new().with_store(&store);

        let err = pipeline.run(&FailingSource, &blank_image()).unwrap_err();
        assert!(matches!(err, BizcardError::Ocr(OcrError::Recognition(_))));

        let err = pipeline
            .run(&ScriptedSource(vec![]), &blank_image())
            .unwrap_err();
        assert!(matches!(err, BizcardError::Ocr(OcrError::NoText)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_single_token_is_insufficient() {
        let store = VecStore::default();
        let pipeline = CardPipeline::new().with_store(&store);

        let err = pipeline.run_tokens(vec!["Jane Doe".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            BizcardError::Classify(ClassifyError::InsufficientInput { found: 1 })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_store_failure_is_reported_not_raised() {
        let store = VecStore {
            broken: true,
            ..VecStore::default()
        };
        let pipeline = CardPipeline::new().with_store(&store);

        let result = pipeline
            .run_tokens(vec!["Jane Doe".to_string(), "Manager".to_string()])
            .unwrap();
        assert_eq!(
            result.store,
            StoreOutcome::Unavailable("store unavailable: disk gone".to_string())
        );
        assert_eq!(result.classification.record.name, "Jane Doe");
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_run_tokens_with_sqlite() {
        let store = crate::store::SqliteStore::open_in_memory().unwrap();
        let pipeline = CardPipeline::new().with_store(&store);

        let tokens: Vec<String> = ["Jane Doe", "Manager", "600001"]
            .into_iter()
            .map(String::from)
            .collect();
        let result = pipeline.run_tokens(tokens).unwrap();

        let id = match result.store {
            StoreOutcome::Inserted(id) => id,
            ref other => panic!("expected insert, got {:?}", other),
        };
        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.record.pincode, "600001");
        assert_eq!(row.record, result.classification.record);
    }
}
