//! Data models for profile metrics and user settings.
//!
//! - `snapshot`: extracted metrics and the cache record that holds them
//! - `settings`: profile identity and feature toggles

// Author: kelexine (https://github.com/kelexine)

pub mod settings;
pub mod snapshot;

pub use settings::ProfileSettings;
pub use snapshot::{CacheRecord, Metrics, MetricsSnapshot};
