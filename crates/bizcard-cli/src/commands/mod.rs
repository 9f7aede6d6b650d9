//! Subcommand implementations.

pub mod batch;
pub mod classify;
pub mod config;
pub mod extract;
pub mod home;
pub mod models;
pub mod output;
pub mod records;
