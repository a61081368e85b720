//! Annotation XML parsing and subtitle-event derivation.
//!
//! Ported from `yavdlt.py`'s `YTAnnotation`/`YTAnnotationRR`/
//! `YTAnnotationAppearence`/`parse_ytanno`.

use super::{Error, Result};

/// One of an annotation's (up to two) timed/positioned regions. Only `t`
/// (the timestamp) is used downstream; the spatial fields are kept since
/// they're part of the source schema, even though this crate's output never
/// reads them back (subtitle placement is a player concern, not a mux one).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    /// Region timestamp in seconds, or `None` for the `"never"` sentinel.
    pub t: Option<f64>,
    /// Horizontal position.
    pub x: Option<f64>,
    /// Vertical position.
    pub y: Option<f64>,
    /// Width.
    pub w: Option<f64>,
    /// Height.
    pub h: Option<f64>,
    /// Depth/z-order.
    pub d: Option<f64>,
}

/// An annotation's visual appearance. Only the foreground colour feeds into
/// the derived subtitle style (`spec.md` §4.6: "all other style fields are
/// defaults") -- the source schema carries border/background colour and
/// alpha too, but nothing downstream of `YTAnnotationAppearence.get_style`
/// ever used them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    /// Foreground colour, as a 24-bit RGB value parsed from the source's hex string.
    pub fg_color: Option<u32>,
}

/// A parsed `<annotation>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// The annotation's author display name, if present.
    pub author: Option<String>,
    /// Text content, present only for `type="text"` annotations.
    pub content: Option<String>,
    /// First region (start).
    pub r1: Option<Region>,
    /// Second region (end).
    pub r2: Option<Region>,
    /// Visual appearance, if the annotation carries one.
    pub appearance: Option<Appearance>,
    /// Whether the source flagged this annotation as spam.
    pub spam_flag: bool,
}

impl Annotation {
    fn is_sublike(&self) -> bool {
        self.content.is_some()
            && self.r1.as_ref().is_some_and(|r| r.t.is_some())
            && self.r2.as_ref().is_some_and(|r| r.t.is_some())
    }

    /// Converts this annotation into `(start, duration, text, author,
    /// fg_color)` iff it's sublike (has text and both region timestamps) and
    /// isn't filtered as spam. Mirrors `YTAnnotation.get_sub`.
    pub fn to_event(&self, filter_spam: bool) -> Option<(f64, f64, &str, Option<&str>, Option<u32>)> {
        if !self.is_sublike() {
            return None;
        }
        if filter_spam && self.spam_flag {
            return None;
        }
        let r1 = self.r1.as_ref().unwrap().t.unwrap();
        let r2 = self.r2.as_ref().unwrap().t.unwrap();
        let fg_color = self.appearance.as_ref().and_then(|a| a.fg_color);
        Some((r1, r2 - r1, self.content.as_deref().unwrap_or(""), self.author.as_deref(), fg_color))
    }
}

/// Parses a colon-delimited timestamp (`h:m:s`, `m:s`, or bare seconds) into
/// seconds, or `None` for the `"never"` sentinel. Mirrors
/// `YTAnnotationRR.build_from_xmlnode`'s handling of the `t` attribute: up to
/// three `:`-delimited components are consumed from the right, each
/// multiplying its running weight by 60.
fn parse_timestamp(s: &str) -> Option<f64> {
    if s == "never" {
        return None;
    }
    let mut rest = s;
    let mut total = 0.0;
    let mut factor = 1.0;
    for _ in 0..3 {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = match rest.rsplit_once(':') {
            Some((h, t)) => (h, t),
            None => ("", rest),
        };
        total += tail.parse::<f64>().ok()? * factor;
        factor *= 60.0;
        rest = head;
    }
    Some(total)
}

fn parse_region(node: roxmltree::Node) -> Region {
    let f = |name: &str| node.attribute(name).and_then(|v| v.parse::<f64>().ok());
    Region { t: node.attribute("t").and_then(parse_timestamp), x: f("x"), y: f("y"), w: f("w"), h: f("h"), d: f("d") }
}

fn parse_appearance(node: roxmltree::Node) -> Appearance {
    let fg_color = node.attribute("fgColor").and_then(|s| u32::from_str_radix(s.trim_start_matches("0x"), 16).ok());
    Appearance { fg_color }
}

fn first_text(node: roxmltree::Node) -> String {
    node.descendants().find(|n| n.is_text()).and_then(|n| n.text()).unwrap_or("").to_string()
}

/// Parses every `<annotation>` element in an annotation XML document.
pub fn parse_annotations(xml: &str) -> Result<Vec<Annotation>> {
    let doc = roxmltree::Document::parse(xml).map_err(Error::Xml)?;

    let annotations = doc
        .descendants()
        .filter(|n| n.has_tag_name("annotation"))
        .map(|node| {
            let author = node.attribute("author").map(str::to_string);
            let kind = node.attribute("type");

            let regions: Vec<_> =
                node.descendants().filter(|n| n.has_tag_name("rectRegion") || n.has_tag_name("anchoredRegion")).collect();
            let r1 = regions.first().map(|n| parse_region(*n));
            let r2 = regions.get(1).map(|n| parse_region(*n));

            let content = if kind == Some("text") {
                node.descendants().find(|n| n.has_tag_name("TEXT")).map(first_text)
            } else {
                None
            };

            let appearance = node.descendants().find(|n| n.has_tag_name("appearance")).map(parse_appearance);

            let spam_flag = node
                .descendants()
                .find(|n| n.has_tag_name("metadata"))
                .and_then(|n| n.attribute("yt_spam_flag"))
                .is_some_and(|v| v == "true");

            Annotation { author, content, r1, r2, appearance, spam_flag }
        })
        .collect();

    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_sentinel_is_never() {
        assert_eq!(parse_timestamp("never"), None);
    }

    #[test]
    fn timestamp_parses_hms() {
        assert_eq!(parse_timestamp("1:02:03.5"), Some(3723.5));
    }

    #[test]
    fn timestamp_parses_bare_seconds() {
        assert_eq!(parse_timestamp("7.5"), Some(7.5));
    }

    #[test]
    fn sublike_annotation_yields_event() {
        let xml = r#"<document>
            <annotation author="Alice" type="text">
                <TEXT>Hello</TEXT>
                <rectRegion t="3.0" x="0" y="0" w="1" h="1" d="0"/>
                <rectRegion t="7.5" x="0" y="0" w="1" h="1" d="0"/>
            </annotation>
        </document>"#;
        let annos = parse_annotations(xml).unwrap();
        assert_eq!(annos.len(), 1);
        let (start, dur, text, author, _fg) = annos[0].to_event(false).unwrap();
        assert_eq!(start, 3.0);
        assert_eq!(dur, 4.5);
        assert_eq!(text, "Hello");
        assert_eq!(author, Some("Alice"));
    }

    #[test]
    fn annotation_missing_second_region_is_not_sublike() {
        let xml = r#"<document>
            <annotation author="Alice" type="text">
                <TEXT>Hello</TEXT>
                <rectRegion t="3.0" x="0" y="0" w="1" h="1" d="0"/>
            </annotation>
        </document>"#;
        let annos = parse_annotations(xml).unwrap();
        assert_eq!(annos[0].to_event(false), None);
    }

    #[test]
    fn spam_flagged_annotation_is_filtered_when_requested() {
        let xml = r#"<document>
            <annotation author="Bob" type="text">
                <TEXT>Spam</TEXT>
                <rectRegion t="0" x="0" y="0" w="1" h="1" d="0"/>
                <rectRegion t="1" x="0" y="0" w="1" h="1" d="0"/>
                <metadata yt_spam_flag="true"/>
            </annotation>
        </document>"#;
        let annos = parse_annotations(xml).unwrap();
        assert!(annos[0].to_event(true).is_none());
        assert!(annos[0].to_event(false).is_some());
    }
}
