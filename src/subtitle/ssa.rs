//! SSA/ASS style and event model, and both of its serialisations (standalone
//! `.ass` file, and the Script-Info/Styles/Events triplet embedded as a
//! Matroska track's codec-private data plus one frame body per event).
//!
//! Ported from `yavdlt.py`'s `ASSStyle`/`ASSSubtitle`/`ASSSubSet`.

/// The `[V4+ Styles]` field order, matching `ASSStyle.ASS_FIELD_NAMES`.
pub const STYLE_FIELD_NAMES: [&str; 23] = [
    "Name", "Fontname", "Fontsize", "PrimaryColour", "SecondaryColour", "OutlineColour", "BackColour", "Bold", "Italic",
    "Underline", "StrikeOut", "ScaleX", "ScaleY", "Spacing", "Angle", "BorderStyle", "Outline", "Shadow", "Alignment",
    "MarginL", "MarginR", "MarginV", "Encoding",
];

/// The `[Events]` field order, matching `ASSSubtitle.ASS_FIELD_NAMES`.
pub const EVENT_FIELD_NAMES: [&str; 10] =
    ["Layer", "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text"];

/// Packs RGBA components into the `AABBGGRR`-ordered 32-bit value ASS style
/// colour fields use. Mirrors `make_ass_color`.
pub const fn make_ass_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// A `[V4+ Styles]` entry. Every field but `name` and `color1` defaults to a
/// fixed value -- `spec.md` §4.6 only derives foreground colour from source
/// annotations, so those are the only two fields this crate ever varies.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style name, assigned by the document when the style is first seen (`StyleN`).
    pub name: String,
    /// Primary (foreground) text colour.
    pub color1: u32,
}

impl Default for Style {
    fn default() -> Self {
        Style { name: String::new(), color1: make_ass_color(255, 255, 255, 0) }
    }
}

impl Style {
    fn fmt_line(&self) -> String {
        format!(
            "Style: {},,20,{},{},{},{},0,0,0,0,100.00,100.00,0,0.000000,1,2,0,2,0,0,10,1",
            self.name,
            self.color1,
            make_ass_color(223, 223, 223, 0),
            make_ass_color(0, 0, 0, 0),
            make_ass_color(0, 0, 0, 0),
        )
    }
}

/// A `[Events]` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Start time, in seconds.
    pub start: f64,
    /// Duration, in seconds.
    pub dur: f64,
    /// Dialogue text, with literal newlines already rewritten to `\N`.
    pub text: String,
    /// Display name (the annotation author, or empty).
    pub name: Option<String>,
    /// Index into the document's style list.
    pub style_index: usize,
}

fn ass_timestamp(seconds: f64) -> String {
    let mut seconds = seconds;
    let hours = (seconds / 3600.0).floor() as i64;
    seconds %= 3600.0;
    let minutes = (seconds / 60.0).floor() as i64;
    seconds %= 60.0;
    format!("{hours}:{minutes:02}:{seconds:05.2}")
}

impl Event {
    fn body(&self) -> String {
        self.text.replace('\n', "\\N")
    }

    fn display_name(&self) -> String {
        self.name.as_deref().unwrap_or("").replace('\n', "_").replace(',', "_").replace('\0', "_")
    }

    fn fmt_standalone(&self, style_name: &str) -> String {
        format!(
            "Dialogue: 0,{},{},{},{},0,0,0,,{}",
            ass_timestamp(self.start),
            ass_timestamp(self.start + self.dur),
            style_name,
            self.display_name(),
            self.body()
        )
    }

    /// Formats this event as it appears in an embedded MKV subtitle frame:
    /// the same field set as [`Event::fmt_standalone`] minus the `Dialogue:`
    /// prefix and the Start/End timestamps (those live in the block's
    /// timecode instead), with a leading ReadOrder index. Mirrors
    /// `ASSSubtitle.get_line_ass_mkv`.
    fn fmt_mkv_body(&self, style_name: &str, read_order: u64) -> String {
        format!("{},0,{},{},0,0,0,,{}", read_order, style_name, self.display_name(), self.body())
    }
}

/// Accumulates deduplicated styles and subtitle events, producing either a
/// standalone `.ass` file or an embedded-track codec-private header plus one
/// frame body per event. Mirrors `ASSSubSet`.
#[derive(Debug, Clone, Default)]
pub struct Document {
    styles: Vec<Style>,
    events: Vec<Event>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Document::default()
    }

    /// Returns the index of a style with the given foreground colour,
    /// creating and naming one (`Style0`, `Style1`, …) if none exists yet.
    /// Mirrors `ASSSubSet.make_style`'s value-tuple dedup.
    pub fn style_index(&mut self, color1: u32) -> usize {
        if let Some(i) = self.styles.iter().position(|s| s.color1 == color1) {
            return i;
        }
        let name = format!("Style{}", self.styles.len());
        self.styles.push(Style { name, color1 });
        self.styles.len() - 1
    }

    /// Appends an event using (or creating) the style for `color1`
    /// (defaulting to white-on-transparent when `None`).
    pub fn push_event(&mut self, start: f64, dur: f64, text: impl Into<String>, name: Option<String>, color1: Option<u32>) {
        let style_index = self.style_index(color1.unwrap_or_else(|| Style::default().color1));
        self.events.push(Event { start, dur, text: text.into(), name, style_index });
    }

    fn sorted_event_indices(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.events.len()).collect();
        idx.sort_by(|&a, &b| {
            self.events[a]
                .start
                .partial_cmp(&self.events[b].start)
                .unwrap()
                .then(self.events[a].dur.partial_cmp(&self.events[b].dur).unwrap())
        });
        idx
    }

    fn header(&self) -> String {
        let mut out = String::from("\u{feff}[Script Info]\r\nScriptType: v4.00+\r\n\r\n[V4+ Styles]\r\n");
        out.push_str(&format!("Format: {}\r\n", STYLE_FIELD_NAMES.join(", ")));
        for style in &self.styles {
            out.push_str(&style.fmt_line());
            out.push_str("\r\n");
        }
        out
    }

    fn events_header(&self) -> String {
        format!("\r\n[Events]\r\nFormat: {}\r\n\r\n", EVENT_FIELD_NAMES.join(", "))
    }

    /// Renders a standalone `.ass` file: BOM, Script Info, Styles, Events,
    /// one `Dialogue:` line per event sorted by start then duration.
    pub fn write_standalone(&self) -> String {
        let mut out = self.header();
        out.push_str(&self.events_header());
        for i in self.sorted_event_indices() {
            let event = &self.events[i];
            out.push_str(&event.fmt_standalone(&self.styles[event.style_index].name));
            out.push_str("\r\n");
        }
        out
    }

    /// The header bytes used as an embedded track's `CodecPrivate`: the
    /// Script-Info, Styles, and Events `Format:` lines, with no event bodies.
    pub fn codec_private(&self) -> Vec<u8> {
        let mut out = self.header();
        out.push_str(&self.events_header());
        out.into_bytes()
    }

    /// Returns `(start, dur, frame_body)` triples, sorted by start then
    /// duration, each carrying a 1-based ReadOrder. Mirrors `_iter_subs_mkv`.
    pub fn mkv_frames(&self) -> Vec<(f64, f64, String)> {
        self.sorted_event_indices()
            .into_iter()
            .enumerate()
            .map(|(i, idx)| {
                let event = &self.events[idx];
                (event.start, event.dur, event.fmt_mkv_body(&self.styles[event.style_index].name, i as u64 + 1))
            })
            .collect()
    }

    /// Whether any event carries non-empty text. Mirrors
    /// `ASSSubSet.contains_nonempty_subs`.
    pub fn has_nonempty_events(&self) -> bool {
        self.events.iter().any(|e| !e.body().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_matches_scenario_5() {
        assert_eq!(ass_timestamp(3.0), "0:00:03.00");
        assert_eq!(ass_timestamp(7.5), "0:00:07.50");
    }

    #[test]
    fn styles_dedup_by_color() {
        let mut doc = Document::new();
        let a = doc.style_index(0x00FF_FFFF);
        let b = doc.style_index(0x00FF_FFFF);
        let c = doc.style_index(0x0000_00FF);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn standalone_output_matches_scenario_5() {
        let mut doc = Document::new();
        doc.push_event(3.0, 4.5, "Hello", None, None);
        let out = doc.write_standalone();
        assert!(out.contains("Dialogue: 0,0:00:03.00,0:00:07.50,Style0,,0,0,0,,Hello"));
    }

    #[test]
    fn mkv_frame_body_omits_dialogue_prefix_and_timestamps() {
        let mut doc = Document::new();
        doc.push_event(3.0, 4.5, "Hello", None, None);
        let frames = doc.mkv_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].2, "1,0,Style0,,0,0,0,,Hello");
    }

    #[test]
    fn events_sort_by_start_then_duration() {
        let mut doc = Document::new();
        doc.push_event(5.0, 1.0, "second", None, None);
        doc.push_event(1.0, 1.0, "first", None, None);
        let frames = doc.mkv_frames();
        assert!(frames[0].2.ends_with("first"));
        assert!(frames[1].2.ends_with("second"));
    }
}
