//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{OcrResult, TextBox, TokenSource};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct CardOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl CardOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(
        model_dir: &Path,
        models: &ModelConfig,
        config: OcrConfig,
    ) -> Result<Self, OcrError> {
        for file in models.files() {
            let path = model_dir.join(file);
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "{} not found",
                    path.display()
                )));
            }
        }

        let det_path = model_dir.join(&models.detection_model);
        let rec_path = model_dir.join(&models.recognition_model);
        let dict_path = model_dir.join(&models.dictionary);

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine, config })
    }

    /// Process an image and extract text boxes in reading order.
    pub fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        info!("Processing image: {}x{}", width, height);

        let max_side = self.config.max_image_size;
        let scaled;
        let image = if max_side > 0 && width.max(height) > max_side {
            scaled = image.resize(max_side, max_side, FilterType::Triangle);
            debug!(
                "Downscaled image to {}x{}",
                scaled.width(),
                scaled.height()
            );
            &scaled
        } else {
            image
        };

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let boxes = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                score: r.confidence,
            })
            .collect();

        let mut result = OcrResult {
            boxes,
            processing_time_ms: start.elapsed().as_millis() as u64,
            image_size: (width, height),
        };
        result.sort_by_reading_order();

        info!(
            "OCR complete: {} text boxes in {}ms, mean score {:.2}",
            result.boxes.len(),
            result.processing_time_ms,
            result.mean_score().unwrap_or(0.0)
        );

        Ok(result)
    }
}

impl TokenSource for CardOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        let tokens = self.process(image)?.tokens(self.config.min_token_length);
        if tokens.is_empty() {
            return Err(OcrError::NoText);
        }
        Ok(tokens)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
