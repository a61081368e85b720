//! MP4/ISO-BMFF container demuxer.
//!
//! Grounded on `original_source/mcde_mp4.py`'s `MovBox` tree and
//! `MovBoxMovie.make_mkvb`. Box trees are parsed once into an in-memory `Atom`
//! tree (see [`boxes`]); [`Track::get_sample_data`] then walks the sample
//! tables lazily against the open file.

pub mod boxes;
pub mod sample_table;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::codec::{Codec, TrackKind};
use crate::dataref::DataRef;
use boxes::{Atom, AtomBody, HdlrBox, ParseCtx, SampleEntry, StszBox, TkhdBox};

/// Errors produced while demuxing an MP4/ISO-BMFF stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A box's declared size ran past the end of its containing buffer or file.
    #[error("MP4 box truncated or overran its container")]
    Truncated,
    /// A required box was missing from its expected location.
    #[error("missing required box: {0}")]
    MissingBox(&'static str),
    /// A full box's version field selected a layout this crate doesn't parse.
    #[error("unsupported box version {0}")]
    UnsupportedVersion(u8),
    /// The sample tables disagreed about sample/chunk counts partway through a walk.
    #[error("sample table entries are inconsistent with each other")]
    SampleTableMismatch,
    /// A track carried an edit list (`edts`), which this demuxer doesn't support.
    #[error("tracks with edit lists are not supported")]
    EditListUnsupported,
    /// A track's sample entry fourcc has no known Matroska encapsulation.
    #[error("unknown MP4 sample format {0:?}")]
    UnknownFormat([u8; 4]),
    /// A track's handler type is neither `vide` nor `soun`; such tracks are
    /// skipped rather than muxed, matching `make_mkvb`'s `continue`.
    #[error("unsupported track handler {0:?}")]
    UnsupportedTrackHandler([u8; 4]),
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for MP4 parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Maps an MP4 sample description fourcc to a codec, per `MovBoxMovie.CODEC_MAP_MKV`.
///
/// The original only ever encapsulates these two; any other fourcc is a track
/// `make_mkvb` can't mux and skips via `MovParserError`, represented here as `None`.
pub fn codec_for_format(format: [u8; 4]) -> Option<Codec> {
    match &format {
        b"avc1" => Some(Codec::AVC),
        b"mp4a" => Some(Codec::Aac),
        _ => None,
    }
}

/// A demuxed MP4 track: its media properties plus everything needed to walk its
/// sample table.
pub struct Track {
    /// The track's persistent ID (`tkhd.track_ID`).
    pub track_id: u32,
    /// Video or audio, from the track's `hdlr`. Tracks of any other handler type
    /// are skipped during movie construction, matching `make_mkvb`'s `continue`.
    pub kind: TrackKind,
    /// The codec this track's samples are encoded with.
    pub codec: Codec,
    /// Codec-specific initialization data (`avcC` for AVC; always `None` for AAC,
    /// since the original tool never extracts `esds`).
    pub codec_init_data: Option<Vec<u8>>,
    /// Video pixel dimensions, if this is a video track.
    pub video_dimensions: Option<(u16, u16)>,
    /// `(sample_rate_hz, channel_count)`, if this is an audio track.
    pub audio_params: Option<(u32, u8)>,
    /// This track's own media timescale (`mdhd.timescale`).
    pub media_time_scale: u32,
    /// This track's media duration in its own timescale.
    pub media_duration: u64,
    has_edts: bool,
    stts: Vec<(u32, u32)>,
    stsc_pp: Vec<(Option<u32>, u32)>,
    stsz: StszBox,
    stco: Vec<u64>,
    stss: Option<Vec<u32>>,
}

impl Track {
    fn build(trak: &Atom) -> Result<Self> {
        let trak_children = container_children(trak)?;
        let has_edts = boxes::find(trak_children, b"edts").is_some();
        let track_id = match &boxes::find(trak_children, b"tkhd").ok_or(Error::MissingBox("tkhd"))?.body {
            AtomBody::Tkhd(TkhdBox { track_id }) => *track_id,
            _ => return Err(Error::MissingBox("tkhd")),
        };

        let mdia = boxes::find(trak_children, b"mdia").ok_or(Error::MissingBox("mdia"))?;
        let mdia_children = container_children(mdia)?;

        let mdhd = match &boxes::find(mdia_children, b"mdhd").ok_or(Error::MissingBox("mdhd"))?.body {
            AtomBody::Mdhd(m) => *m,
            _ => return Err(Error::MissingBox("mdhd")),
        };

        let hdlr: &HdlrBox = match &boxes::find(mdia_children, b"hdlr").ok_or(Error::MissingBox("hdlr"))?.body {
            AtomBody::Hdlr(h) => h,
            _ => return Err(Error::MissingBox("hdlr")),
        };
        let kind = match &hdlr.handler_type {
            b"vide" => TrackKind::Video,
            b"soun" => TrackKind::Audio,
            other => return Err(Error::UnsupportedTrackHandler(*other)),
        };

        let minf = boxes::find(mdia_children, b"minf").ok_or(Error::MissingBox("minf"))?;
        let minf_children = container_children(minf)?;
        let stbl = boxes::find(minf_children, b"stbl").ok_or(Error::MissingBox("stbl"))?;
        let stbl_children = container_children(stbl)?;

        let stsd = boxes::find(stbl_children, b"stsd").ok_or(Error::MissingBox("stsd"))?;
        let sample_entry: &SampleEntry = match &stsd.body {
            AtomBody::Stsd(entries) => entries.first().ok_or(Error::MissingBox("stsd entry"))?,
            _ => return Err(Error::MissingBox("stsd")),
        };

        let format = sample_entry.format();
        let codec = codec_for_format(format).ok_or(Error::UnknownFormat(format))?;

        let (codec_init_data, video_dimensions, audio_params) = match sample_entry {
            SampleEntry::Video(v) => (v.avcc.clone(), Some((v.width, v.height)), None),
            SampleEntry::Audio(a) => (None, None, Some((a.sample_rate.round() as u32, a.channel_count as u8))),
            SampleEntry::Other { .. } => (None, None, None),
        };

        let stts = match &boxes::find(stbl_children, b"stts").ok_or(Error::MissingBox("stts"))?.body {
            AtomBody::Stts(entries) => entries.clone(),
            _ => return Err(Error::MissingBox("stts")),
        };
        let stsc_raw = match &boxes::find(stbl_children, b"stsc").ok_or(Error::MissingBox("stsc"))?.body {
            AtomBody::Stsc(entries) => entries.clone(),
            _ => return Err(Error::MissingBox("stsc")),
        };
        let stsz = match &boxes::find(stbl_children, b"stsz").ok_or(Error::MissingBox("stsz"))?.body {
            AtomBody::Stsz(s) => s.clone(),
            _ => return Err(Error::MissingBox("stsz")),
        };
        let stco = match &stbl_children
            .iter()
            .find(|a| &a.box_type == b"stco" || &a.box_type == b"co64")
            .ok_or(Error::MissingBox("stco/co64"))?
            .body
        {
            AtomBody::Stco(offsets) => offsets.clone(),
            _ => return Err(Error::MissingBox("stco/co64")),
        };
        let stss = boxes::find(stbl_children, b"stss").and_then(|a| match &a.body {
            AtomBody::Stss(s) => Some(s.clone()),
            _ => None,
        });

        Ok(Track {
            track_id,
            kind,
            codec,
            codec_init_data,
            video_dimensions,
            audio_params,
            media_time_scale: mdhd.time_scale,
            media_duration: mdhd.duration,
            has_edts,
            stts,
            stsc_pp: boxes::preprocess_stsc(&stsc_raw),
            stsz,
            stco,
            stss,
        })
    }

    /// Greatest common divisor of this track's sample deltas, used to pick a
    /// shared builder timescale across tracks. Mirrors `get_sample_delta_gcd`.
    pub fn sample_delta_gcd(&self) -> u32 {
        sample_table::sample_delta_gcd(&self.stts)
    }

    /// Walks this track's sample tables, yielding `(timestamp, data, is_sync)` triples.
    ///
    /// `time_mult` rescales the track's native `mdhd` timescale into the builder's
    /// shared timescale; see `tcs_from_secdiv` in the Matroska builder.
    pub fn get_sample_data(&self, file: Arc<Mutex<File>>, time_mult: f64) -> Result<Vec<(u64, DataRef, bool)>> {
        if self.has_edts {
            return Err(Error::EditListUnsupported);
        }
        sample_table::sample_data(file, &self.stsz, &self.stsc_pp, &self.stco, &self.stts, self.stss.as_deref(), time_mult)
    }
}

fn container_children(atom: &Atom) -> Result<&[Atom]> {
    match &atom.body {
        AtomBody::Container(children) => Ok(children),
        _ => Err(Error::MissingBox("container box")),
    }
}

/// The parsed `moov` box: movie-wide timing plus every usable track.
pub struct MovieBox {
    /// The movie's shared timescale (`mvhd.timescale`).
    pub time_scale: u32,
    /// The movie's duration in `time_scale` units.
    pub duration: u64,
    /// Every track found under `moov`, in file order, whose handler type this
    /// crate understands (`vide`/`soun`) and whose sample format has a known codec.
    pub tracks: Vec<Track>,
}

impl MovieBox {
    /// Movie duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration as f64 / self.time_scale as f64
    }
}

/// Reads the `moov` box of an MP4 file and holds the shared file handle that
/// tracks' `DataRef`s read sample bytes from.
pub struct Mp4Reader {
    file: Arc<Mutex<File>>,
}

impl Mp4Reader {
    /// Opens `path` for MP4 demuxing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Mp4Reader { file: Arc::new(Mutex::new(file)) })
    }

    /// The shared file handle backing this reader's tracks' `DataRef`s.
    pub fn file_handle(&self) -> Arc<Mutex<File>> {
        self.file.clone()
    }

    /// Parses the `moov` box, skipping over `mdat` and any other top-level box
    /// without reading its body (sample data is read lazily through `DataRef`s
    /// pointing at absolute file offsets recorded in `stco`/`co64`).
    pub fn parse_movie(&self) -> Result<MovieBox> {
        let moov_body = {
            let mut file = self.file.lock().expect("MP4 file lock poisoned");
            let len = file.seek(SeekFrom::End(0))?;
            file.seek(SeekFrom::Start(0))?;

            let mut found = None;
            let mut pos = 0u64;
            while pos < len {
                file.seek(SeekFrom::Start(pos))?;
                let mut header = [0u8; 8];
                if file.read(&mut header)? < 8 {
                    break;
                }
                let size32 = u32::from_be_bytes(header[0..4].try_into().unwrap());
                let box_type: [u8; 4] = header[4..8].try_into().unwrap();
                let (size, header_len) = if size32 == 1 {
                    let mut ext = [0u8; 8];
                    file.read_exact(&mut ext)?;
                    (u64::from_be_bytes(ext), 16u64)
                } else if size32 == 0 {
                    (len - pos, 8u64)
                } else {
                    (size32 as u64, 8u64)
                };
                if size < header_len || pos + size > len {
                    return Err(Error::Truncated);
                }
                if &box_type == b"moov" {
                    let body_len = (size - header_len) as usize;
                    let mut buf = vec![0u8; body_len];
                    file.seek(SeekFrom::Start(pos + header_len))?;
                    file.read_exact(&mut buf)?;
                    found = Some(buf);
                    break;
                }
                pos += size;
            }
            found
        };

        let moov_body = moov_body.ok_or(Error::MissingBox("moov"))?;
        let mut ctx = ParseCtx::new();
        let children = boxes::parse_atoms(&moov_body, &mut ctx)?;

        let mvhd = match &boxes::find(&children, b"mvhd").ok_or(Error::MissingBox("mvhd"))?.body {
            AtomBody::Mvhd(m) => *m,
            _ => return Err(Error::MissingBox("mvhd")),
        };

        let mut tracks = Vec::new();
        for trak in boxes::find_all(&children, b"trak") {
            match Track::build(trak) {
                Ok(track) => tracks.push(track),
                Err(Error::UnsupportedTrackHandler(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(MovieBox { time_scale: mvhd.time_scale, duration: mvhd.duration, tracks })
    }
}
