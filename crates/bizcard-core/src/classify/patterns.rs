//! Regex patterns used by the classification rules.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Bare six-digit pincode, e.g. "600001". ASCII digits only, no trailing newline.
    pub static ref PINCODE_EXACT: Regex = Regex::new(
        r"^[0-9]{6}$"
    ).unwrap();

    // Nine-letter label followed by digits, e.g. "TamilNadu 600113"
    pub static ref LABELLED_PINCODE: Regex = Regex::new(
        r"[a-zA-Z]{9} +[0-9]"
    ).unwrap();

    // Street line ending in the state, e.g. "123 ABC St. Chennai TamilNadu"
    pub static ref CITY_BEFORE_STATE: Regex = Regex::new(
        r"St\.\s+(\w+)\s+TamilNadu"
    ).unwrap();
}

/// Width of the label that precedes the digits in [`LABELLED_PINCODE`] matches,
/// including the separating space.
pub const PINCODE_LABEL_WIDTH: usize = 10;

/// Canonical spelling written to STATE.
pub const STATE_CANONICAL: &str = "TamilNadu";

/// Spellings of the state recognised in a token.
pub const STATE_SPELLINGS: [&str; 2] = ["Tamil Nadu", "TamilNadu"];

/// Markers that make a `.com` token a website.
pub const WEBSITE_MARKERS: [&str; 3] = ["www", "http", "https"];
