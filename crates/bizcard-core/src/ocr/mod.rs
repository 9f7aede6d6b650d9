//! Token sources: turning a card image into an ordered sequence of strings.

#[cfg(feature = "native")]
mod engine;

#[cfg(feature = "native")]
pub use engine::CardOcrEngine;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{OcrError, Result};

/// Decode a card photo from disk.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Anything that can read text tokens off a card image.
pub trait TokenSource {
    /// Recognize text fragments in reading order.
    ///
    /// An empty sequence is reported as [`OcrError::NoText`] so callers never
    /// classify a card nothing was read from.
    fn recognize(&self, image: &DynamicImage) -> std::result::Result<Vec<String>, OcrError>;
}

impl<T: TokenSource + ?Sized> TokenSource for &T {
    fn recognize(&self, image: &DynamicImage) -> std::result::Result<Vec<String>, OcrError> {
        (**self).recognize(image)
    }
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Sort boxes by reading order (top-to-bottom, left-to-right).
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let (ax, ay, _, _) = a.rect();
            let (bx, by, _, _) = b.rect();

            // Group by approximate vertical position (within 20 pixels)
            let row_a = (ay / 20.0) as i32;
            let row_b = (by / 20.0) as i32;

            row_a
                .cmp(&row_b)
                .then_with(|| ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
        });
    }

    /// Average recognition score, or `None` when nothing was recognized.
    pub fn mean_score(&self) -> Option<f32> {
        if self.boxes.is_empty() {
            return None;
        }
        Some(self.boxes.iter().map(|b| b.score).sum::<f32>() / self.boxes.len() as f32)
    }

    /// Box texts in their current order, trimmed, dropping those shorter
    /// than `min_len` characters.
    pub fn tokens(&self, min_len: usize) -> Vec<String> {
        self.boxes
            .iter()
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty() && t.chars().count() >= min_len)
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(text: &str, x: f32, y: f32) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let mut result = OcrResult {
            boxes: vec![
                text_box("right", 200.0, 42.0),
                text_box("bottom", 0.0, 100.0),
                text_box("top", 10.0, 0.0),
                text_box("left", 0.0, 45.0),
            ],
            processing_time_ms: 0,
            image_size: (300, 200),
        };
        result.sort_by_reading_order();

        assert_eq!(result.tokens(1), vec!["top", "left", "right", "bottom"]);
    }

    #[test]
    fn test_tokens_trim_and_filter() {
        let result = OcrResult {
            boxes: vec![
                text_box("  Jane Doe ", 0.0, 0.0),
                text_box("   ", 0.0, 20.0),
                text_box("|", 0.0, 40.0),
                text_box("Manager", 0.0, 60.0),
            ],
            processing_time_ms: 0,
            image_size: (100, 100),
        };

        assert_eq!(result.tokens(1), vec!["Jane Doe", "|", "Manager"]);
        assert_eq!(result.tokens(2), vec!["Jane Doe", "Manager"]);
    }

    #[test]
    fn test_mean_score() {
        let mut result = OcrResult {
            boxes: vec![text_box("a", 0.0, 0.0), text_box("b", 0.0, 20.0)],
            processing_time_ms: 0,
            image_size: (100, 100),
        };
        result.boxes[1].score = 0.5;
        assert!((result.mean_score().unwrap() - 0.7).abs() < 1e-6);

        result.boxes.clear();
        assert_eq!(result.mean_score(), None);
    }

    #[test]
    fn test_open_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        std::fs::write(&path, "not an image").unwrap();

        let err = open_image(&path).unwrap_err();
        assert!(matches!(err, crate::BizcardError::Image(_)));
    }
}
