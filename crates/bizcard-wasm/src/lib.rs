//! WASM bindings for business card field classification.
//!
//! OCR runs on the JavaScript side; these bindings take the recognized text
//! fragments and return the classified card. Nothing is stored.

use wasm_bindgen::prelude::*;

use bizcard_core::{FieldName, OcrResult, RuleCascade, TextBox};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Field labels in their fixed order.
#[wasm_bindgen]
pub fn field_names() -> js_sys::Array {
    FieldName::ALL
        .iter()
        .map(|f| JsValue::from_str(f.label()))
        .collect()
}

fn to_tokens(tokens: JsValue) -> Result<Vec<String>, JsValue> {
    serde_wasm_bindgen::from_value(tokens)
        .map_err(|e| JsValue::from_str(&format!("expected an array of strings: {}", e)))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Classify an array of text fragments into a card record.
#[wasm_bindgen]
pub fn classify_tokens(tokens: JsValue) -> Result<JsValue, JsValue> {
    let tokens = to_tokens(tokens)?;
    let record = bizcard_core::classify(&tokens).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&record)
}

/// Classify fragments and include the rule that claimed each one.
#[wasm_bindgen]
pub fn classify_with_trace(tokens: JsValue) -> Result<JsValue, JsValue> {
    CardClassifier::new().classify_with_trace(tokens)
}

/// Card classifier class for browser use.
///
/// Boxes can be added in any order; they are sorted top-to-bottom and
/// left-to-right before classification.
#[wasm_bindgen]
pub struct CardClassifier {
    cascade: RuleCascade,
    ocr: OcrResult,
    min_token_length: usize,
}

#[wasm_bindgen]
impl CardClassifier {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cascade: RuleCascade::new(),
            ocr: OcrResult {
                boxes: Vec::new(),
                processing_time_ms: 0,
                image_size: (0, 0),
            },
            min_token_length: 1,
        }
    }

    /// Drop fragments shorter than this many characters.
    #[wasm_bindgen]
    pub fn set_min_token_length(&mut self, len: usize) {
        self.min_token_length = len;
    }

    /// Add a recognized text box from browser-side OCR.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.ocr.boxes.push(TextBox {
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            text: text.to_string(),
            score: confidence,
        });
    }

    /// Number of boxes added so far.
    #[wasm_bindgen]
    pub fn box_count(&self) -> usize {
        self.ocr.boxes.len()
    }

    /// Remove all boxes.
    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.ocr.boxes.clear();
    }

    /// Fragments of the added boxes in reading order.
    #[wasm_bindgen]
    pub fn tokens(&mut self) -> Vec<String> {
        self.ocr.sort_by_reading_order();
        self.ocr.tokens(self.min_token_length)
    }

    /// Classify the added boxes.
    #[wasm_bindgen]
    pub fn classify_boxes(&mut self) -> Result<JsValue, JsValue> {
        let tokens = self.tokens();
        let classification = self
            .cascade
            .classify_with_trace(&tokens)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&classification)
    }

    /// Classify an array of fragments given in reading order.
    #[wasm_bindgen]
    pub fn classify(&self, tokens: JsValue) -> Result<JsValue, JsValue> {
        let tokens = to_tokens(tokens)?;
        let record = self
            .cascade
            .classify(&tokens)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&record)
    }

    /// Like `classify`, with the per-token rule trace.
    #[wasm_bindgen]
    pub fn classify_with_trace(&self, tokens: JsValue) -> Result<JsValue, JsValue> {
        let tokens = to_tokens(tokens)?;
        let classification = self
            .cascade
            .classify_with_trace(&tokens)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&classification)
    }
}

impl Default for CardClassifier {
    fn default() -> Self {
        Self::new()
    }
}
