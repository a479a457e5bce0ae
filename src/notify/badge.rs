// Badge rendering
// Author: kelexine (https://github.com/kelexine)

use serde::Serialize;

/// Background colour used for every non-empty badge.
pub const BADGE_COLOR: &str = "#4CAF50";

/// What the badge sink should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Empty text clears the badge.
    pub text: String,
    pub background_color: String,
}

impl Badge {
    pub fn for_citations(citations: Option<u64>) -> Self {
        Self {
            text: render(citations.unwrap_or(0)),
            background_color: BADGE_COLOR.to_string(),
        }
    }

    pub fn cleared() -> Self {
        Self::for_citations(None)
    }

    pub fn is_cleared(&self) -> bool {
        self.text.is_empty()
    }
}

/// Compact badge text for a citation count.
///
/// Zero means "unknown" and renders as an empty badge. The million branch is
/// checked before the thousand branch so 2 500 000 reads "2M", not "2500k".
pub fn render(citations: u64) -> String {
    match citations {
        0 => String::new(),
        1..=9_999 => citations.to_string(),
        n if n >= 1_000_000 => format!("{}M", n / 1_000_000),
        n => format!("{}k", n / 1_000),
    }
}
