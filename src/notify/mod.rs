//! Change detection and user-facing feedback.
//!
//! # Submodules
//!
//! - `evaluator`: pure old-vs-new snapshot comparison producing notifications.
//! - `badge`: compact badge text for a citation count.
//! - `sinks`: traits for the notification, badge and status outputs, plus a
//!   `tracing` implementation.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod badge;
pub mod evaluator;
pub mod sinks;

pub use badge::{render, Badge};
pub use evaluator::{evaluate, ChangeKind, Notification};
pub use sinks::{BadgeSink, NotificationSink, Sinks, StatusSink, StatusUpdate, TracingSink};
