//! HTML metric extraction.
//!
//! Turns a raw profile page into a [`MetricsSnapshot`]. The headline metrics
//! come from an ordered cascade of strategies (see [`strategies::STRATEGIES`]);
//! author details and the yearly citation trend are independent best-effort
//! lookups. Extraction never fails: a page no strategy understands yields a
//! zeroed snapshot with the `degraded` marker set.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod profile;
pub mod strategies;

use crate::models::{Metrics, MetricsSnapshot};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Extract a snapshot stamped with the current time.
pub fn extract(html: &str) -> MetricsSnapshot {
    extract_at(html, Utc::now())
}

/// Extract a snapshot stamped with `timestamp`.
pub fn extract_at(html: &str, timestamp: DateTime<Utc>) -> MetricsSnapshot {
    let Some(metrics) = run_cascade(html) else {
        warn!(
            "No extraction strategy found a citation count ({} bytes of HTML)",
            html.len()
        );
        return MetricsSnapshot::degraded(timestamp);
    };

    MetricsSnapshot {
        author_name: profile::author_name(html),
        affiliation: profile::affiliation(html),
        recent_citations_by_year: profile::recent_citations_by_year(html),
        ..MetricsSnapshot::new(metrics, timestamp)
    }
}

fn run_cascade(html: &str) -> Option<Metrics> {
    for strategy in strategies::STRATEGIES {
        match (strategy.run)(html) {
            Some(metrics) if metrics.is_usable() => {
                debug!(
                    "Strategy {} matched: citations={}, h-index={}, i10-index={}",
                    strategy.name, metrics.citations, metrics.h_index, metrics.i10_index
                );
                return Some(metrics);
            }
            _ => debug!("Strategy {} found no citation count", strategy.name),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_falls_through_to_label_pattern() {
        // Only two stat cells: the positional strategy declines.
        let html = r#"
            <table>
              <tr><td>Citations</td><td class="gsc_rsb_std">77</td></tr>
              <tr><td>h-index</td><td class="gsc_rsb_std">4</td></tr>
            </table>"#;
        let snapshot = extract(html);
        assert_eq!(snapshot.citations, 77);
        assert_eq!(snapshot.h_index, 4);
        assert!(!snapshot.degraded);
    }

    #[test]
    fn test_zero_stat_cells_fall_through() {
        let html = r#"
            <table>
              <tr><td class="gsc_rsb_std">0</td><td class="gsc_rsb_std">0</td><td class="gsc_rsb_std">0</td></tr>
              <tr><td class="a"><a>Citations</a></td><td class="b">15</td></tr>
            </table>"#;
        assert_eq!(extract(html).citations, 15);
    }

    #[test]
    fn test_unrecognised_page_is_degraded() {
        let ts = Utc::now();
        let snapshot = extract_at("<html><body>Please verify you are human</body></html>", ts);
        assert_eq!(snapshot, MetricsSnapshot::degraded(ts));
        assert_eq!(snapshot.citations, 0);
    }

    #[test]
    fn test_empty_input() {
        let snapshot = extract("");
        assert!(snapshot.degraded);
        assert!(snapshot.author_name.is_none());
    }
}
