//! Inkframe Common Utilities
//!
//! Shared infrastructure for all Inkframe crates:
//! - Error types and result aliases
//! - Frame clock utilities for converting frame indices to time
//! - Tracing/logging initialization
//! - Analyzer configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
