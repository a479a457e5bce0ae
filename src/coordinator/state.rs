// Refresh cycle state machine
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What started a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    Manual,
    SettingsChanged,
}

impl Trigger {
    /// Scheduled ticks reuse a fresh cache; user actions always fetch.
    pub fn forces_fetch(&self) -> bool {
        !matches!(self, Trigger::Scheduled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Scheduled => "scheduled",
            Trigger::Manual => "manual",
            Trigger::SettingsChanged => "settings_changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    CheckCache,
    ServeCached,
    Fetch,
    Persist,
    Notify,
}

impl RefreshState {
    pub fn can_transition_to(self, next: RefreshState) -> bool {
        use RefreshState::*;
        matches!(
            (self, next),
            (Idle, CheckCache)
                | (CheckCache, ServeCached)
                | (CheckCache, Fetch)
                | (Fetch, Persist)
                | (Persist, Notify)
                // Early exits: not configured, served from cache, fetch failed, done.
                | (Idle, Idle)
                | (CheckCache, Idle)
                | (ServeCached, Idle)
                | (Fetch, Idle)
                | (Persist, Idle)
                | (Notify, Idle)
        )
    }
}

/// Tracks one pass through the refresh state machine.
#[derive(Debug)]
pub struct RefreshCycle {
    trigger: Trigger,
    state: RefreshState,
    history: Vec<RefreshState>,
}

impl RefreshCycle {
    pub fn start(trigger: Trigger) -> Self {
        Self {
            trigger,
            state: RefreshState::Idle,
            history: vec![RefreshState::Idle],
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn history(&self) -> &[RefreshState] {
        &self.history
    }

    pub fn advance(&mut self, next: RefreshState) {
        if !self.state.can_transition_to(next) {
            warn!(
                "Unexpected refresh transition {:?} -> {:?} ({})",
                self.state,
                next,
                self.trigger.as_str()
            );
        }
        debug!("Refresh ({}): {:?} -> {:?}", self.trigger.as_str(), self.state, next);
        self.state = next;
        self.history.push(next);
    }

    pub fn finish(&mut self) {
        self.advance(RefreshState::Idle);
    }
}
