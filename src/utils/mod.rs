//! Utility functions and helpers for citewatch.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and log-safe body previews.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
