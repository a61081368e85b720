//! End-to-end scenario 5: an annotation XML document becomes a standalone
//! `.ass` file and an embedded Matroska subtitle track with matching fields.

use std::io::Cursor;

use mkremux::codec::TrackKind;
use mkremux::dataref::DataRef;
use mkremux::mux::{CompatFlags, MatroskaBuilder, TrackMeta, TrackSettings};
use mkremux::subtitle;

const ANNOTATION_XML: &str = r#"<document>
    <annotation author="" type="text">
        <TEXT>Hello</TEXT>
        <rectRegion t="3.0" x="0" y="0" w="1" h="1" d="0"/>
        <rectRegion t="7.5" x="0" y="0" w="1" h="1" d="0"/>
    </annotation>
</document>"#;

#[test]
fn annotation_round_trips_into_standalone_ass() {
    let doc = subtitle::document_from_annotations(ANNOTATION_XML, false).unwrap();
    let ass = subtitle::write_standalone_ass(&doc);
    assert!(ass.contains("Dialogue: 0,0:00:03.00,0:00:07.50,Style0,,0,0,0,,Hello"));
}

#[test]
fn annotation_embeds_as_subtitle_track_with_matching_block_body() {
    let doc = subtitle::document_from_annotations(ANNOTATION_XML, false).unwrap();

    let mut mb = MatroskaBuilder::new("mkremux integration test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
    mb.add_track(
        vec![(0, DataRef::from_owned(vec![0u8]), true)],
        TrackKind::Video,
        "V_MPEG4/ISO/AVC",
        None,
        TrackSettings::Video { width: 640, height: 480 },
        TrackMeta::default(),
    )
    .unwrap();

    let tcs = mb.timestamp_scale();
    subtitle::embed_subtitle_track(&mut mb, &doc, tcs, Some("English".to_string()), Some("eng".to_string())).unwrap();

    let mut out = Vec::new();
    mb.write_to_file(&mut out).unwrap();

    let mut cursor = Cursor::new(&out);
    let view = mkremux::view::MatroskaView::new(&mut cursor).unwrap();
    let tracks = view.segments[0].tracks.as_ref().unwrap();
    assert_eq!(tracks.track_entry.len(), 2);

    let sub_track = tracks.track_entry.iter().find(|t| t.codec_id.0 == "S_TEXT/ASS").unwrap();
    assert_eq!(sub_track.name.as_ref().unwrap().0, "English");
    assert_eq!(sub_track.language.0, "eng");
    assert_eq!(*sub_track.flag_default, 0);

    // The frame body (scenario 5's "block body after the ReadOrder prefix")
    // carries the same comma-joined event fields as the standalone rendering,
    // minus the `Dialogue:` prefix and Start/End timestamps.
    let frames = doc.mkv_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].2, "1,0,Style0,,0,0,0,,Hello");
}
