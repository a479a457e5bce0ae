// Change evaluation between two snapshots
// Author: kelexine (https://github.com/kelexine)

use crate::models::MetricsSnapshot;
use serde::Serialize;

/// Priority passed to the notification sink for every change notification.
pub const CHANGE_PRIORITY: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    CitationsIncreased { delta: u64, total: u64 },
    HIndexIncreased { from: u64, to: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: ChangeKind,
    pub title: String,
    pub message: String,
    pub priority: u8,
}

impl Notification {
    fn citations(delta: u64, total: u64) -> Self {
        Self {
            kind: ChangeKind::CitationsIncreased { delta, total },
            title: "Citations increased!".to_string(),
            message: format!(
                "Your citations grew by {}. Total citations: {}",
                delta, total
            ),
            priority: CHANGE_PRIORITY,
        }
    }

    fn h_index(from: u64, to: u64) -> Self {
        Self {
            kind: ChangeKind::HIndexIncreased { from, to },
            title: "h-index increased!".to_string(),
            message: format!("Your h-index rose from {} to {}", from, to),
            priority: CHANGE_PRIORITY,
        }
    }
}

/// Notifications for metrics that went up between `old` and `new`.
///
/// Only citations and h-index are watched, and only increases count. The
/// i10-index is never reported.
pub fn evaluate(old: &MetricsSnapshot, new: &MetricsSnapshot) -> Vec<Notification> {
    let mut notifications = Vec::new();

    if new.citations > old.citations {
        notifications.push(Notification::citations(
            new.citations - old.citations,
            new.citations,
        ));
    }

    if new.h_index > old.h_index {
        notifications.push(Notification::h_index(old.h_index, new.h_index));
    }

    notifications
}
