//! Data models for business card extraction.

pub mod card;
pub mod config;
