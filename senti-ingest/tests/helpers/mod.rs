//! Test Helper Utilities
//!
//! Shared utilities for testing senti-ingest

#![allow(dead_code, unused_imports)]

pub mod log_capture;
pub mod stand_in;
pub mod stubs;

// Re-export commonly used items
pub use log_capture::{capture_logs, LogCapture};
pub use stand_in::{start_inference, start_webhdfs, unreachable_addr, FakeHdfs, FakeInference};
pub use stubs::{
    csv_files, write_raw, FixedBackend, KeywordBackend, StallingBackend, FIXTURE_TIMESTAMP,
};
