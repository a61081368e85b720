//! Ties the FLV/MP4 demuxers, the Matroska builder, and the subtitle
//! producer together into complete output files, and implements the
//! filename-sanitisation convention of §6.
//!
//! Grounded on `original_source/mcde_flv.py`'s `FLVReader.make_mkvb` and
//! `original_source/mcde_mp4.py`'s `MovBoxMovie.make_mkvb` (track assembly
//! and shared-timescale selection), and `original_source/yavdlt.py`'s
//! `YTVideo._choose_fn` (filename sanitisation). This is the only module in
//! the crate that catches a per-input error, logs it, and continues —
//! everything below it propagates with `?`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::codec::TrackKind;
use crate::dataref::DataRef;
use crate::flv::amf::Value as AmfValue;
use crate::flv::tag::{self, TagBody};
use crate::flv::FlvReader;
use crate::mp4::Mp4Reader;
use crate::mux::{tcs_from_secdiv, CompatFlags, MatroskaBuilder, TrackMeta, TrackSettings};
use crate::subtitle::Document;
use crate::{Error, Result};

/// The container format of a source video body, selected by its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `video/x-flv`.
    Flv,
    /// `video/mp4` or `video/3gpp`.
    Mp4,
}

/// A subtitle track to embed, already converted to an SSA/ASS [`Document`].
pub struct SubtitleInput {
    /// The parsed subtitle document.
    pub doc: Document,
    /// Track display name.
    pub name: Option<String>,
    /// Already-translated ISO-639-2 language code; see
    /// [`crate::subtitle::to_iso_639_2`].
    pub lang: Option<String>,
}

/// Builds a complete `MatroskaBuilder` from one demuxed source plus any
/// subtitle tracks, ready for [`MatroskaBuilder::write_to_file`].
pub fn build(source_path: &Path, format: SourceFormat, write_app: &str, subtitles: Vec<SubtitleInput>) -> Result<MatroskaBuilder> {
    let mut mb = match format {
        SourceFormat::Flv => build_from_flv(source_path, write_app)?,
        SourceFormat::Mp4 => build_from_mp4(source_path, write_app)?,
    };

    let tcs = mb.timestamp_scale();
    for sub in subtitles {
        crate::subtitle::embed_subtitle_track(&mut mb, &sub.doc, tcs, sub.name, sub.lang)?;
    }

    Ok(mb)
}

struct StreamAccum<T> {
    samples: Vec<(i32, DataRef, bool)>,
    init_data: Option<Vec<u8>>,
    params: Option<T>,
}

impl<T> StreamAccum<T> {
    fn new() -> Self {
        StreamAccum { samples: Vec::new(), init_data: None, params: None }
    }
}

fn build_from_flv(path: &Path, write_app: &str) -> Result<MatroskaBuilder> {
    let reader = FlvReader::open(path)?;
    let header = reader.parse_header()?;
    let tags = reader.tags(&header)?;

    let mut video = StreamAccum::<u8>::new(); // codec_id
    let mut audio = StreamAccum::<(u8, u32, u8)>::new(); // (codec_id, sample_rate, channels)
    let mut duration_secs = 0.0f64;

    for flv_tag in &tags {
        match &flv_tag.body {
            TagBody::Video(v) => {
                match video.params {
                    None => video.params = Some(v.codec_id),
                    Some(codec_id) if codec_id != v.codec_id => return Err(Error::Flv(crate::flv::Error::StreamInconsistency)),
                    Some(_) => {}
                }
                if v.is_header() == Some(true) {
                    video.init_data = Some(v.data.get_data()?);
                } else {
                    video.samples.push((flv_tag.presentation_timestamp(), v.data.clone(), v.is_keyframe));
                }
            }
            TagBody::Audio(a) => {
                match &audio.params {
                    None => audio.params = Some((a.codec_id, a.sample_rate, a.channels)),
                    Some((codec_id, rate, ch)) if *codec_id != a.codec_id || *rate != a.sample_rate || *ch != a.channels => {
                        return Err(Error::Flv(crate::flv::Error::StreamInconsistency));
                    }
                    Some(_) => {}
                }
                if a.is_header() == Some(true) {
                    audio.init_data = Some(a.data.get_data()?);
                } else {
                    audio.samples.push((flv_tag.presentation_timestamp(), a.data.clone(), true));
                }
            }
            TagBody::Script(s) => {
                if let Some(entries) = s.get_metadata()? {
                    for (key, value) in entries {
                        if key == "duration" {
                            if let AmfValue::Number(n) = value {
                                duration_secs = n;
                            }
                        }
                    }
                }
            }
            TagBody::Other { .. } => {}
        }
    }

    // FLV timestamps are already whole milliseconds; 1_000_000 ns/tick maps
    // them onto the builder's scale with no rescaling needed. Mirrors
    // `FLVReader.make_mkvb`, which passes the `onMetaData` duration straight
    // into `MatroskaBuilder`'s `ts` (`DateUTC`) argument rather than a
    // separate duration field — there is no Matroska `Duration` element in
    // this builder (see `DESIGN.md` C6).
    let mut mb = MatroskaBuilder::new(write_app, 1_000_000, duration_secs, CompatFlags::default());

    if let Some(codec_id) = video.params {
        if let Some(codec_mkv) = tag::video_codec_matroska_id(codec_id) {
            // FLV carries pixel dimensions on the `onMetaData` script tag, not
            // the tag stream itself; this crate doesn't thread width/height
            // out of `ScriptTag::get_metadata`'s generic key/value list, so
            // the video track is emitted with no `Video` settings element.
            let samples = non_negative_timestamps(video.samples)?;
            mb.add_track(samples, TrackKind::Video, codec_mkv, video.init_data, TrackSettings::None, TrackMeta::default())?;
        }
    }

    if let Some((codec_id, sample_rate, channels)) = audio.params {
        if let Some(codec_mkv) = tag::audio_codec_matroska_id(codec_id) {
            let samples = non_negative_timestamps(audio.samples)?;
            mb.add_track(
                samples,
                TrackKind::Audio,
                codec_mkv,
                audio.init_data,
                TrackSettings::Audio { sample_rate: sample_rate as f64, channels },
                TrackMeta::default(),
            )?;
        }
    }

    Ok(mb)
}

/// Converts `(presentation_timestamp_ms, data, is_keyframe)` triples to the
/// absolute `u64` ticks [`MatroskaBuilder::add_track`] expects. A negative
/// presentation timestamp (an out-of-range composition-time offset) is an
/// output invariant violation, not a recoverable demuxer condition.
fn non_negative_timestamps(samples: Vec<(i32, DataRef, bool)>) -> Result<Vec<(u64, DataRef, bool)>> {
    samples
        .into_iter()
        .map(|(ts, data, kf)| {
            let ts = u64::try_from(ts).map_err(|_| Error::OutputInvariant(format!("negative FLV presentation timestamp {ts}")))?;
            Ok((ts, data, kf))
        })
        .collect()
}

fn build_from_mp4(path: &Path, write_app: &str) -> Result<MatroskaBuilder> {
    let reader = Mp4Reader::open(path)?;
    let movie = reader.parse_movie()?;

    if movie.tracks.is_empty() {
        return Ok(MatroskaBuilder::new(write_app, 1_000_000, 0.0, CompatFlags::default()));
    }

    let td_gcd = movie.tracks.iter().map(|t| t.sample_delta_gcd() as u64).fold(0u64, gcd_u64);
    let ts_base = movie.tracks.iter().map(|t| t.media_time_scale as u64).max().unwrap_or(1);
    let dur_secs = movie
        .tracks
        .iter()
        .map(|t| t.media_duration as f64 / t.media_time_scale as f64)
        .fold(movie.duration_secs(), f64::max);

    let (tcs, elmult, _err) = tcs_from_secdiv(ts_base, td_gcd.max(1), None);
    // Same quirk as the FLV path: `MovBoxMovie.make_mkvb` passes the derived
    // duration straight into `MatroskaBuilder`'s `ts` argument.
    let mut mb = MatroskaBuilder::new(write_app, tcs, dur_secs, CompatFlags::default());

    let file = reader.file_handle();
    for track in &movie.tracks {
        let Some(codec_mkv) = track.codec.matroska_codec_id() else {
            warn!("MP4 track {} has no Matroska encapsulation for its codec; skipping", track.track_id);
            continue;
        };
        let ts_fact = ts_base as f64 / track.media_time_scale as f64;
        let time_mult = elmult * ts_fact;
        let samples = track.get_sample_data(file.clone(), time_mult)?;

        let settings = match (track.kind, track.video_dimensions, track.audio_params) {
            (TrackKind::Video, Some((width, height)), _) => TrackSettings::Video { width, height },
            (TrackKind::Audio, _, Some((rate, channels))) => TrackSettings::Audio { sample_rate: rate as f64, channels },
            _ => TrackSettings::None,
        };

        mb.add_track(samples, track.kind, codec_mkv, track.codec_init_data.clone(), settings, TrackMeta::default())?;
    }

    Ok(mb)
}

fn gcd_u64(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd_u64(b, a % b)
    }
}

/// Builds the sanitised stem of an output filename from a video title:
/// alphanumerics, `-`, and printable non-ASCII codepoints pass through
/// unchanged; space and underscore collapse to underscore; everything else
/// is dropped. Mirrors `YTVideo._choose_fn`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || (c as u32 > 127 && !c.is_control()) {
                Some(c)
            } else if c == ' ' || c == '_' {
                Some('_')
            } else {
                None
            }
        })
        .collect()
}

/// Builds the final output filename `yt_<sanitised>.[<vid>][<fmt>].<ext>`.
pub fn output_filename(title: &str, vid: &str, fmt: &str, ext: &str) -> String {
    format!("yt_{}.[{}][{}].{}", sanitize_title(title), vid, fmt, ext)
}

/// A single video to process: its demuxable body, the chosen output path,
/// and any subtitle inputs to embed.
pub struct VideoJob {
    /// Path to the already-downloaded source video body.
    pub source_path: PathBuf,
    /// Container format of `source_path`.
    pub format: SourceFormat,
    /// Destination path for the muxed Matroska output.
    pub output_path: PathBuf,
    /// Subtitle tracks to embed, if any.
    pub subtitles: Vec<SubtitleInput>,
}

/// Processes every job in turn, logging and continuing past any individual
/// failure rather than aborting the batch. Returns `true` iff every job
/// succeeded — callers use this to choose the process exit code (§6).
pub fn process_all(jobs: Vec<VideoJob>, write_app: &str) -> bool {
    let mut all_ok = true;

    for job in jobs {
        info!("processing {}", job.source_path.display());
        match process_one(&job, write_app) {
            Ok(()) => info!("wrote {}", job.output_path.display()),
            Err(e) => {
                warn!("failed to process {}: {e}", job.source_path.display());
                all_ok = false;
            }
        }
    }

    all_ok
}

fn process_one(job: &VideoJob, write_app: &str) -> Result<()> {
    let mb = build(&job.source_path, job.format, write_app, job.subtitles_clone())?;
    let mut out = fs::File::create(&job.output_path)?;
    mb.write_to_file(&mut out)?;
    Ok(())
}

impl VideoJob {
    // `build` consumes `subtitles`, but `process_one` only has `&VideoJob`;
    // subtitle documents are cheap to clone (small text buffers), so this
    // avoids requiring callers to hand over an owned `VideoJob` per attempt.
    fn subtitles_clone(&self) -> Vec<SubtitleInput> {
        self.subtitles
            .iter()
            .map(|s| SubtitleInput { doc: s.doc.clone(), name: s.name.clone(), lang: s.lang.clone() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_spaces_and_drops_punctuation() {
        assert_eq!(sanitize_title("Hello, World!"), "Hello_World");
    }

    #[test]
    fn keeps_hyphens_and_collapses_underscore() {
        assert_eq!(sanitize_title("foo-bar_baz"), "foo-bar_baz");
    }

    #[test]
    fn builds_expected_filename_pattern() {
        assert_eq!(output_filename("My Video", "abc123", "mkv", "mkv"), "yt_My_Video.[abc123][mkv].mkv");
    }
}
