// Profile settings (user configuration read from the sync partition)
// Author: kelexine (https://github.com/kelexine)

use crate::config::ScholarConfig;
use serde::{Deserialize, Serialize};

/// User-facing settings that identify the tracked profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,

    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    #[serde(default = "default_true")]
    pub auto_update_enabled: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            profile_id: None,
            profile_url: None,
            notifications_enabled: true,
            auto_update_enabled: true,
        }
    }
}

impl ProfileSettings {
    pub fn profile_id(&self) -> Option<&str> {
        non_blank(self.profile_id.as_deref())
    }

    pub fn profile_url(&self) -> Option<&str> {
        non_blank(self.profile_url.as_deref())
    }

    pub fn is_configured(&self) -> bool {
        self.profile_id().is_some() || self.profile_url().is_some()
    }

    /// Resolve the page to fetch. A direct URL wins over an id.
    ///
    /// Returns `None` when neither is set, which callers treat as the
    /// "not configured" state rather than an error.
    pub fn target_url(&self, scholar: &ScholarConfig) -> Option<String> {
        if let Some(url) = self.profile_url() {
            return Some(url.to_string());
        }
        self.profile_id().map(|id| {
            format!(
                "{}?user={}&hl={}",
                scholar.base_url,
                urlencoding::encode(id),
                scholar.language
            )
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_true() -> bool {
    true
}
