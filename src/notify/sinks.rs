// Side-effect sinks for notifications, badge updates and status messages
// Author: kelexine (https://github.com/kelexine)

use super::badge::Badge;
use super::evaluator::Notification;
use std::sync::Arc;
use tracing::{info, warn};

/// Receives change notifications. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Receives badge text updates.
pub trait BadgeSink: Send + Sync {
    fn set_badge(&self, badge: &Badge);
}

/// UI-facing state changes that are not notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// No profile id or URL is configured.
    NotConfigured,
    /// A user-initiated refresh succeeded.
    Updated { citations: u64 },
    /// A user-initiated refresh failed.
    Error(String),
}

/// Side channel for [`StatusUpdate`]s.
pub trait StatusSink: Send + Sync {
    fn status(&self, update: &StatusUpdate);
}

/// Logs every side effect through `tracing`. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) {
        info!(
            priority = notification.priority,
            "🔔 {} {}", notification.title, notification.message
        );
    }
}

impl BadgeSink for TracingSink {
    fn set_badge(&self, badge: &Badge) {
        if badge.is_cleared() {
            info!("Badge cleared");
        } else {
            info!("Badge: {} ({})", badge.text, badge.background_color);
        }
    }
}

impl StatusSink for TracingSink {
    fn status(&self, update: &StatusUpdate) {
        match update {
            StatusUpdate::NotConfigured => {
                warn!("No profile configured. Run `citewatch configure --url <profile url>` first")
            }
            StatusUpdate::Updated { citations } => info!("Update succeeded: {} citations", citations),
            StatusUpdate::Error(message) => warn!("Update failed: {}", message),
        }
    }
}

/// The three sinks the refresh coordinator writes to.
#[derive(Clone)]
pub struct Sinks {
    pub notifications: Arc<dyn NotificationSink>,
    pub badge: Arc<dyn BadgeSink>,
    pub status: Arc<dyn StatusSink>,
}

impl Sinks {
    /// Route every side effect to the log.
    pub fn tracing() -> Self {
        let sink = Arc::new(TracingSink);
        Self {
            notifications: sink.clone(),
            badge: sink.clone(),
            status: sink,
        }
    }
}
