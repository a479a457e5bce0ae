// Per-profile in-flight refresh guard
// Author: kelexine (https://github.com/kelexine)

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Set of profiles with a refresh currently running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `profile`. Returns `None` if another refresh already holds it.
    pub fn try_acquire(&self, profile: &str) -> Option<InFlightGuard> {
        let mut active = self.active.lock();
        if !active.insert(profile.to_string()) {
            debug!("Refresh already in flight for {}", profile);
            return None;
        }
        Some(InFlightGuard {
            active: Arc::clone(&self.active),
            profile: profile.to_string(),
        })
    }

    pub fn is_active(&self, profile: &str) -> bool {
        self.active.lock().contains(profile)
    }
}

/// Releases the claim on drop, including on early returns and errors.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<String>>>,
    profile: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.profile);
    }
}
