//! # senti-common
//!
//! Shared code for the sentiment ingest workspace:
//! - Common error type
//! - TOML configuration loading and persistence
//! - Tracing subscriber initialization
//! - Timestamp helpers used by the storage layout

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
