//! Configuration structures for the card pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BizcardError, Result};

/// Main configuration for bizcard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BizcardConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Record store configuration.
    pub store: StoreConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Maximum image dimension (longer side); larger photos are downscaled.
    pub max_image_size: u32,

    /// Keep `[UNK]` markers for glyphs missing from the dictionary.
    pub keep_unk: bool,

    /// Drop recognized fragments shorter than this (after trimming).
    pub min_token_length: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            max_image_size: 2048,
            keep_unk: false,
            min_token_length: 1,
        }
    }
}

/// Model file names and download location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files (platform data dir when unset).
    pub model_dir: Option<PathBuf>,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Base URL the model files are downloaded from.
    pub download_base_url: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            download_base_url: "https://github.com/jakubmatias/incr/raw/main/models/mobile"
                .to_string(),
        }
    }
}

impl ModelConfig {
    /// File names of every model the engine needs.
    pub fn files(&self) -> [&str; 3] {
        [
            self.detection_model.as_str(),
            self.recognition_model.as_str(),
            self.dictionary.as_str(),
        ]
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file (platform data dir when unset).
    pub database_path: Option<PathBuf>,
}

impl BizcardConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BizcardError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BizcardError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "ocr": { "min_token_length": 2 } }"#).unwrap();

        let config = BizcardConfig::from_file(&path).unwrap();
        assert_eq!(config.ocr.min_token_length, 2);
        assert_eq!(config.ocr.max_image_size, 2048);
        assert_eq!(config.models.detection_model, "det.onnx");
        assert!(config.store.database_path.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BizcardConfig::default();
        config.store.database_path = Some(PathBuf::from("/tmp/cards.db"));
        config.save(&path).unwrap();

        let loaded = BizcardConfig::from_file(&path).unwrap();
        assert_eq!(loaded.store.database_path, Some(PathBuf::from("/tmp/cards.db")));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let err = BizcardConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BizcardError::Config(ref msg) if msg.contains("config.json")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BizcardConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BizcardError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
