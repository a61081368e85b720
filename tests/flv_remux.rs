//! End-to-end scenario 1: an FLV source with one H.264 keyframe and one AAC
//! frame remuxes into a Matroska file carrying both tracks.

use std::io::Cursor;

use mkremux::orchestrator::{self, SourceFormat};

fn u24(value: u32) -> [u8; 3] {
    let b = value.to_be_bytes();
    [b[1], b[2], b[3]]
}

/// Appends one FLV tag (header + body + trailing back-pointer) to `out`.
fn push_tag(out: &mut Vec<u8>, tag_type: u8, timestamp: i32, body: &[u8]) {
    let tag_start = out.len();
    out.push(tag_type);
    out.extend(u24(body.len() as u32));
    out.extend(u24((timestamp as u32) & 0x00FF_FFFF));
    out.push(((timestamp >> 24) & 0xFF) as u8);
    out.extend([0u8, 0, 0]); // StreamID, always zero
    out.extend_from_slice(body);
    let tag_size = (out.len() - tag_start) as u32;
    out.extend(tag_size.to_be_bytes());
}

fn build_flv_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(b"FLV");
    out.push(1); // version
    out.push(0x03); // has_video | has_audio
    out.extend(9u32.to_be_bytes()); // data_offset
    out.extend(0u32.to_be_bytes()); // leading zero tag-size

    // One H.264 keyframe: FrameType=1, CodecID=7, AVCPacketType=1 (NALU), CT offset 0.
    let mut video_body = vec![0x17, 0x01, 0x00, 0x00, 0x00];
    video_body.extend([0x65, 0xAA, 0xBB]);
    push_tag(&mut out, 9, 0, &video_body);

    // One AAC raw frame: SoundFormat=10, 44kHz, 16-bit, stereo, AACPacketType=1.
    let mut audio_body = vec![0xAF, 0x01];
    audio_body.extend([0x21, 0x22, 0x23]);
    push_tag(&mut out, 8, 0, &audio_body);

    out
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("mkremux-test-{name}-{:?}", std::thread::current().id()))
}

#[test]
fn flv_keyframe_and_aac_frame_remux_to_two_tracks() {
    let path = temp_path("flv-one-keyframe-one-aac");
    std::fs::write(&path, build_flv_bytes()).unwrap();

    let mb = orchestrator::build(&path, SourceFormat::Flv, "mkremux integration test", vec![]).unwrap();
    let mut out = Vec::new();
    mb.write_to_file(&mut out).unwrap();

    let mut cursor = Cursor::new(&out);
    let view = mkremux::view::MatroskaView::new(&mut cursor).unwrap();
    let tracks = view.segments[0].tracks.as_ref().unwrap();
    assert_eq!(tracks.track_entry.len(), 2);

    let codec_ids: Vec<&str> = tracks.track_entry.iter().map(|t| t.codec_id.0.as_str()).collect();
    assert!(codec_ids.contains(&"V_MPEG4/ISO/AVC"));
    assert!(codec_ids.contains(&"A_AAC"));

    let video_track_number = tracks.track_entry.iter().find(|t| t.codec_id.0 == "V_MPEG4/ISO/AVC").unwrap().track_number.0;

    // One CuePoint at time 0 pointing at the video keyframe's block; the AAC
    // frame isn't on a cue-eligible track, so it contributes no CuePoint.
    let cues = view.segments[0].cues.as_ref().unwrap();
    assert_eq!(cues.cue_point.len(), 1);
    let cue = &cues.cue_point[0];
    assert_eq!(*cue.cue_time, 0);
    assert_eq!(cue.cue_track_positions.len(), 1);
    assert_eq!(cue.cue_track_positions[0].cue_track.0, video_track_number);
    assert_eq!(cue.cue_track_positions[0].cue_block_number.unwrap().0, 1);

    std::fs::remove_file(&path).ok();
}

#[test]
fn mismatched_stream_parameters_are_rejected() {
    let path = temp_path("flv-inconsistent-audio");
    let mut bytes = build_flv_bytes();

    // A second audio tag with a different channel count than the first.
    let mut second_audio = vec![0xAE, 0x01]; // same codec/rate/size, mono this time
    second_audio.extend([0x30, 0x31]);
    push_tag(&mut bytes, 8, 40, &second_audio);

    std::fs::write(&path, bytes).unwrap();

    let result = orchestrator::build(&path, SourceFormat::Flv, "mkremux integration test", vec![]);
    assert!(result.is_err());

    std::fs::remove_file(&path).ok();
}
