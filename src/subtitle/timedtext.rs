//! Timed-text XML parsing.
//!
//! Ported from `getyt.py`'s `YTimedTextEntry.parse_block`: a flat list of
//! `<text start="…" dur="…">text content</text>` elements.

use super::{Error, Result};

/// One timed-text caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Start time, in seconds.
    pub start: f64,
    /// Duration, in seconds. Defaults to `0.0` when the source omits `dur`.
    pub dur: f64,
    /// Caption text, with XML entities already unescaped by the parser.
    pub text: String,
}

/// Parses a timed-text XML document into its flat list of caption entries.
pub fn parse_timedtext(xml: &str) -> Result<Vec<Entry>> {
    let doc = roxmltree::Document::parse(xml).map_err(Error::Xml)?;

    let entries = doc
        .descendants()
        .filter(|n| n.has_tag_name("text"))
        .map(|node| {
            let start = node.attribute("start").and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
            let dur = node.attribute("dur").and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
            let text = node.descendants().find(|n| n.is_text()).and_then(|n| n.text()).unwrap_or("").to_string();
            Entry { start, dur, text }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_with_explicit_duration() {
        let xml = r#"<transcript><text start="1.5" dur="2.5">Hi there</text></transcript>"#;
        let entries = parse_timedtext(xml).unwrap();
        assert_eq!(entries, vec![Entry { start: 1.5, dur: 2.5, text: "Hi there".to_string() }]);
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let xml = r#"<transcript><text start="4">No duration</text></transcript>"#;
        let entries = parse_timedtext(xml).unwrap();
        assert_eq!(entries[0].dur, 0.0);
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = r#"<transcript><text start="0">Tom &amp; Jerry</text></transcript>"#;
        let entries = parse_timedtext(xml).unwrap();
        assert_eq!(entries[0].text, "Tom & Jerry");
    }
}
