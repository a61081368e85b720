//! ISO-BMFF box tree: header parsing and the payload types this crate cares about.
//!
//! Grounded on `original_source/mcde_mp4.py`'s `MovBox`/`MovBoxBranch`/`MovFullBox`
//! hierarchy. Rather than mirror the original's per-class-registry dispatch, boxes
//! are parsed eagerly out of an in-memory buffer (the `moov` body, which is always
//! small relative to the media itself) into a flat `Atom` tree.

use crate::codec::TrackKind;
use crate::mp4::{Error, Result};

/// A parsed box. Unrecognised box types keep their raw body for anyone who still
/// wants to dig through them (e.g. `avcC`, reached by name from a video sample entry).
#[derive(Debug, Clone)]
pub struct Atom {
    /// The box's four-character type code.
    pub box_type: [u8; 4],
    /// The parsed payload, or raw bytes for box types this crate doesn't interpret.
    pub body: AtomBody,
}

/// A box's parsed payload.
#[derive(Debug, Clone)]
pub enum AtomBody {
    /// A branch box: `moov`, `trak`, `mdia`, `minf`, `stbl`, `udta`, `edts`.
    Container(Vec<Atom>),
    /// `ftyp`.
    Ftyp(FtypBox),
    /// `mvhd`.
    Mvhd(MvhdBox),
    /// `tkhd`.
    Tkhd(TkhdBox),
    /// `mdhd`.
    Mdhd(MdhdBox),
    /// `hdlr`.
    Hdlr(HdlrBox),
    /// `stsd`.
    Stsd(Vec<SampleEntry>),
    /// `stts`: (sample_count, sample_delta) pairs.
    Stts(Vec<(u32, u32)>),
    /// `stsc`: (first_chunk, samples_per_chunk, sample_description_index) triples.
    Stsc(Vec<(u32, u32, u32)>),
    /// `stsz`.
    Stsz(StszBox),
    /// `stco`/`co64`, normalised to `u64` offsets.
    Stco(Vec<u64>),
    /// `stss`: sync sample numbers, as stored (no 1-based/0-based adjustment is
    /// applied, matching the original's direct comparison against a 0-based counter).
    Stss(Vec<u32>),
    /// Anything else: kept as raw bytes so a parent can still hunt for a specific
    /// child by type (e.g. `avcC` under `avc1`).
    Raw(Vec<u8>),
}

/// Parser state threaded through a `moov` subtree: which track kind the nearest
/// enclosing `hdlr` declared, consumed when an `stsd`'s sample entries are parsed.
///
/// Mirrors `MovContext._track_type`.
pub struct ParseCtx {
    pub(crate) track_kind: Option<TrackKind>,
}

impl ParseCtx {
    pub fn new() -> Self {
        ParseCtx { track_kind: None }
    }
}

impl Default for ParseCtx {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a flat sequence of boxes out of `buf`.
pub fn parse_atoms(buf: &[u8], ctx: &mut ParseCtx) -> Result<Vec<Atom>> {
    let mut atoms = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= buf.len() {
        let size32 = u32::from_be_bytes(buf[pos..pos + 4].try_into().unwrap());
        let box_type: [u8; 4] = buf[pos + 4..pos + 8].try_into().unwrap();
        let (size, header_len) = if size32 == 1 {
            if pos + 16 > buf.len() {
                return Err(Error::Truncated);
            }
            let sz = u64::from_be_bytes(buf[pos + 8..pos + 16].try_into().unwrap());
            (sz as usize, 16usize)
        } else if size32 == 0 {
            (buf.len() - pos, 8usize)
        } else {
            (size32 as usize, 8usize)
        };
        if size < header_len || pos + size > buf.len() {
            return Err(Error::Truncated);
        }
        let body = &buf[pos + header_len..pos + size];
        let parsed = parse_one_atom(box_type, body, ctx)?;
        atoms.push(Atom { box_type, body: parsed });
        pos += size;
    }
    Ok(atoms)
}

fn parse_one_atom(box_type: [u8; 4], body: &[u8], ctx: &mut ParseCtx) -> Result<AtomBody> {
    Ok(match &box_type {
        b"ftyp" => AtomBody::Ftyp(FtypBox::parse(body)?),
        b"mvhd" => AtomBody::Mvhd(MvhdBox::parse(body)?),
        b"tkhd" => AtomBody::Tkhd(TkhdBox::parse(body)?),
        b"mdhd" => AtomBody::Mdhd(MdhdBox::parse(body)?),
        b"hdlr" => {
            let hdlr = HdlrBox::parse(body)?;
            ctx.track_kind = match &hdlr.handler_type {
                b"vide" => Some(TrackKind::Video),
                b"soun" => Some(TrackKind::Audio),
                _ => None,
            };
            AtomBody::Hdlr(hdlr)
        }
        b"stsd" => AtomBody::Stsd(parse_stsd(body, ctx)?),
        b"stts" => AtomBody::Stts(parse_u32_pairs(body)?),
        b"stsc" => AtomBody::Stsc(parse_stsc(body)?),
        b"stsz" => AtomBody::Stsz(StszBox::parse(body)?),
        b"stco" => AtomBody::Stco(parse_u32_list(body)?.into_iter().map(u64::from).collect()),
        b"co64" => AtomBody::Stco(parse_u64_list(body)?),
        b"stss" => AtomBody::Stss(parse_u32_list(body)?),
        b"mdia" => {
            ctx.track_kind = None;
            let children = parse_atoms(body, ctx)?;
            ctx.track_kind = None;
            AtomBody::Container(children)
        }
        b"moov" | b"trak" | b"minf" | b"stbl" | b"udta" | b"edts" => {
            AtomBody::Container(parse_atoms(body, ctx)?)
        }
        _ => AtomBody::Raw(body.to_vec()),
    })
}

/// Finds the first direct child of `atoms` with type `want`.
pub fn find<'a>(atoms: &'a [Atom], want: &[u8; 4]) -> Option<&'a Atom> {
    atoms.iter().find(|a| &a.box_type == want)
}

/// Collects every direct child of `atoms` with type `want`.
pub fn find_all<'a>(atoms: &'a [Atom], want: &[u8; 4]) -> Vec<&'a Atom> {
    atoms.iter().filter(|a| &a.box_type == want).collect()
}

/// Walks into an unparsed (`Raw`) child box tree looking for a box of type `want`,
/// returning its body bytes. Used to reach `avcC` under an `avc1` sample entry.
fn find_raw_child(buf: &[u8], want: &[u8; 4]) -> Result<Option<Vec<u8>>> {
    let mut pos = 0usize;
    while pos + 8 <= buf.len() {
        let size = u32::from_be_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
        let box_type: [u8; 4] = buf[pos + 4..pos + 8].try_into().unwrap();
        if size < 8 || pos + size > buf.len() {
            return Err(Error::Truncated);
        }
        if &box_type == want {
            return Ok(Some(buf[pos + 8..pos + size].to_vec()));
        }
        pos += size;
    }
    Ok(None)
}

fn body_after_fullbox(body: &[u8]) -> Result<&[u8]> {
    body.get(4..).ok_or(Error::Truncated)
}

/// `ftyp`: major/minor brand. Not consulted downstream, kept for completeness.
#[derive(Debug, Clone)]
pub struct FtypBox {
    /// The major brand four-character code.
    pub major_brand: [u8; 4],
    /// The minor version number.
    pub minor_version: u32,
}

impl FtypBox {
    fn parse(body: &[u8]) -> Result<Self> {
        if body.len() < 8 {
            return Err(Error::Truncated);
        }
        Ok(FtypBox {
            major_brand: body[0..4].try_into().unwrap(),
            minor_version: u32::from_be_bytes(body[4..8].try_into().unwrap()),
        })
    }
}

/// `mvhd`: movie-wide timescale and duration.
#[derive(Debug, Clone, Copy)]
pub struct MvhdBox {
    /// Units per second that `duration` (and all track/media durations) are expressed in.
    pub time_scale: u32,
    /// Movie duration in `time_scale` units.
    pub duration: u64,
}

impl MvhdBox {
    fn parse(body: &[u8]) -> Result<Self> {
        let version = *body.first().ok_or(Error::Truncated)?;
        let rest = body_after_fullbox(body)?;
        match version {
            0 => {
                if rest.len() < 16 {
                    return Err(Error::Truncated);
                }
                Ok(MvhdBox {
                    time_scale: u32::from_be_bytes(rest[8..12].try_into().unwrap()),
                    duration: u32::from_be_bytes(rest[12..16].try_into().unwrap()) as u64,
                })
            }
            1 => {
                if rest.len() < 28 {
                    return Err(Error::Truncated);
                }
                Ok(MvhdBox {
                    time_scale: u32::from_be_bytes(rest[16..20].try_into().unwrap()),
                    duration: u64::from_be_bytes(rest[20..28].try_into().unwrap()),
                })
            }
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration as f64 / self.time_scale as f64
    }
}

/// `tkhd`: only the track ID is needed downstream.
#[derive(Debug, Clone, Copy)]
pub struct TkhdBox {
    /// The track's persistent ID, referenced by `tref`/`edts` (neither parsed here).
    pub track_id: u32,
}

impl TkhdBox {
    fn parse(body: &[u8]) -> Result<Self> {
        let version = *body.first().ok_or(Error::Truncated)?;
        let rest = body_after_fullbox(body)?;
        let track_id = match version {
            0 => {
                if rest.len() < 12 {
                    return Err(Error::Truncated);
                }
                u32::from_be_bytes(rest[8..12].try_into().unwrap())
            }
            1 => {
                if rest.len() < 20 {
                    return Err(Error::Truncated);
                }
                u32::from_be_bytes(rest[16..20].try_into().unwrap())
            }
            other => return Err(Error::UnsupportedVersion(other)),
        };
        Ok(TkhdBox { track_id })
    }
}

/// `mdhd`: per-track timescale and duration.
#[derive(Debug, Clone, Copy)]
pub struct MdhdBox {
    /// Units per second that this track's sample deltas are expressed in.
    pub time_scale: u32,
    /// Track duration in `time_scale` units.
    pub duration: u64,
}

impl MdhdBox {
    fn parse(body: &[u8]) -> Result<Self> {
        let version = *body.first().ok_or(Error::Truncated)?;
        let rest = body_after_fullbox(body)?;
        match version {
            0 => {
                if rest.len() < 16 {
                    return Err(Error::Truncated);
                }
                Ok(MdhdBox {
                    time_scale: u32::from_be_bytes(rest[8..12].try_into().unwrap()),
                    duration: u32::from_be_bytes(rest[12..16].try_into().unwrap()) as u64,
                })
            }
            1 => {
                if rest.len() < 28 {
                    return Err(Error::Truncated);
                }
                Ok(MdhdBox {
                    time_scale: u32::from_be_bytes(rest[16..20].try_into().unwrap()),
                    duration: u64::from_be_bytes(rest[20..28].try_into().unwrap()),
                })
            }
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration as f64 / self.time_scale as f64
    }
}

/// `hdlr`: which kind of media a track carries, plus its free-text name.
#[derive(Debug, Clone)]
pub struct HdlrBox {
    /// The four-character handler type, e.g. `vide` or `soun`.
    pub handler_type: [u8; 4],
    /// The null-terminated handler name.
    pub name: String,
}

impl HdlrBox {
    fn parse(body: &[u8]) -> Result<Self> {
        if body.len() < 24 {
            return Err(Error::Truncated);
        }
        let handler_type: [u8; 4] = body[8..12].try_into().unwrap();
        let name_bytes = &body[24..];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        Ok(HdlrBox {
            handler_type,
            name: String::from_utf8_lossy(&name_bytes[..end]).into_owned(),
        })
    }
}

/// A decoded `stsd` sample entry, specialised by the handler type in effect when
/// it was parsed. Only `avc1` (video) and `mp4a` (audio) carry codec init data;
/// every other fourcc lands in `Other`, matching the original tool's coverage.
#[derive(Debug, Clone)]
pub enum SampleEntry {
    /// A video sample description.
    Video(VideoSampleEntry),
    /// An audio sample description.
    Audio(AudioSampleEntry),
    /// A sample description this crate doesn't specialise.
    Other {
        /// The sample entry's format fourcc.
        format: [u8; 4],
    },
}

impl SampleEntry {
    /// The format fourcc, regardless of variant.
    pub fn format(&self) -> [u8; 4] {
        match self {
            SampleEntry::Video(v) => v.format,
            SampleEntry::Audio(a) => a.format,
            SampleEntry::Other { format } => *format,
        }
    }
}

/// A `vide`-handler sample entry (`avc1` and friends).
#[derive(Debug, Clone)]
pub struct VideoSampleEntry {
    /// The sample entry's format fourcc.
    pub format: [u8; 4],
    /// Pixel width.
    pub width: u16,
    /// Pixel height.
    pub height: u16,
    /// Bit depth.
    pub depth: u16,
    /// The `AVCDecoderConfigurationRecord` body, present only for `avc1`.
    pub avcc: Option<Vec<u8>>,
}

/// A `soun`-handler sample entry (`mp4a` and friends).
///
/// The original tool never extracts AAC codec-private data (`esds`) from this
/// box — `MovSampleEntrySound` doesn't override `get_codec_init_data`, so it
/// always returns `None` even for `mp4a`. This crate keeps that limitation
/// rather than inventing an `esds` extraction the original never had.
#[derive(Debug, Clone)]
pub struct AudioSampleEntry {
    /// The sample entry's format fourcc.
    pub format: [u8; 4],
    /// Channel count.
    pub channel_count: u16,
    /// Sample size in bits.
    pub sample_size: u16,
    /// Sample rate in Hz, decoded from a 16.16 fixed-point field.
    pub sample_rate: f64,
}

fn parse_stsd(body: &[u8], ctx: &mut ParseCtx) -> Result<Vec<SampleEntry>> {
    let rest = body_after_fullbox(body)?;
    if rest.len() < 4 {
        return Err(Error::Truncated);
    }
    let entry_count = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
    let mut pos = 4usize;
    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        if pos + 8 > rest.len() {
            return Err(Error::Truncated);
        }
        let size = u32::from_be_bytes(rest[pos..pos + 4].try_into().unwrap()) as usize;
        let format: [u8; 4] = rest[pos + 4..pos + 8].try_into().unwrap();
        if size < 8 || pos + size > rest.len() {
            return Err(Error::Truncated);
        }
        let entry_body = &rest[pos + 8..pos + size];
        entries.push(parse_sample_entry(format, entry_body, ctx)?);
        pos += size;
    }
    Ok(entries)
}

fn parse_sample_entry(format: [u8; 4], body: &[u8], ctx: &ParseCtx) -> Result<SampleEntry> {
    if body.len() < 8 {
        return Err(Error::Truncated);
    }
    let data = &body[8..]; // skip 6 reserved bytes + 2-byte data_reference_index
    match ctx.track_kind {
        Some(TrackKind::Video) => Ok(SampleEntry::Video(VideoSampleEntry::parse(format, data)?)),
        Some(TrackKind::Audio) => Ok(SampleEntry::Audio(AudioSampleEntry::parse(format, data)?)),
        _ => Ok(SampleEntry::Other { format }),
    }
}

impl VideoSampleEntry {
    fn parse(format: [u8; 4], data: &[u8]) -> Result<Self> {
        if data.len() < 70 {
            return Err(Error::Truncated);
        }
        let width = u16::from_be_bytes(data[16..18].try_into().unwrap());
        let height = u16::from_be_bytes(data[18..20].try_into().unwrap());
        let depth = u16::from_be_bytes(data[66..68].try_into().unwrap());
        let children = &data[70..];
        let avcc = if &format == b"avc1" { find_raw_child(children, b"avcC")? } else { None };
        Ok(VideoSampleEntry { format, width, height, depth, avcc })
    }
}

impl AudioSampleEntry {
    fn parse(format: [u8; 4], data: &[u8]) -> Result<Self> {
        if data.len() < 20 {
            return Err(Error::Truncated);
        }
        let channel_count = u16::from_be_bytes(data[8..10].try_into().unwrap());
        let sample_size = u16::from_be_bytes(data[10..12].try_into().unwrap());
        let sample_rate_fixed = u32::from_be_bytes(data[16..20].try_into().unwrap());
        Ok(AudioSampleEntry {
            format,
            channel_count,
            sample_size,
            sample_rate: sample_rate_fixed as f64 / 65536.0,
        })
    }
}

/// `stsz`: per-sample sizes, or a single size shared by every sample.
#[derive(Debug, Clone)]
pub struct StszBox {
    /// `Some(size)` when every sample shares one size; `None` when sizes vary
    /// (in which case they're in `entries`).
    pub sample_size: Option<u32>,
    /// Total sample count.
    pub sample_count: usize,
    entries: Vec<u32>,
}

impl StszBox {
    pub(crate) fn parse(body: &[u8]) -> Result<Self> {
        let rest = body_after_fullbox(body)?;
        if rest.len() < 8 {
            return Err(Error::Truncated);
        }
        let size_field = u32::from_be_bytes(rest[0..4].try_into().unwrap());
        let sample_count = u32::from_be_bytes(rest[4..8].try_into().unwrap()) as usize;
        let (sample_size, entries) = if size_field == 0 {
            let mut entries = Vec::with_capacity(sample_count);
            let mut pos = 8usize;
            for _ in 0..sample_count {
                if pos + 4 > rest.len() {
                    return Err(Error::Truncated);
                }
                entries.push(u32::from_be_bytes(rest[pos..pos + 4].try_into().unwrap()));
                pos += 4;
            }
            (None, entries)
        } else {
            (Some(size_field), Vec::new())
        };
        Ok(StszBox { sample_size, sample_count, entries })
    }

    /// The size of sample `i`, or `None` if `i` is out of range.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self.sample_size {
            Some(s) => (i < self.sample_count).then_some(s),
            None => self.entries.get(i).copied(),
        }
    }
}

fn parse_u32_pairs(body: &[u8]) -> Result<Vec<(u32, u32)>> {
    let rest = body_after_fullbox(body)?;
    if rest.len() < 4 {
        return Err(Error::Truncated);
    }
    let count = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(count);
    let mut pos = 4usize;
    for _ in 0..count {
        if pos + 8 > rest.len() {
            return Err(Error::Truncated);
        }
        let a = u32::from_be_bytes(rest[pos..pos + 4].try_into().unwrap());
        let b = u32::from_be_bytes(rest[pos + 4..pos + 8].try_into().unwrap());
        out.push((a, b));
        pos += 8;
    }
    Ok(out)
}

fn parse_stsc(body: &[u8]) -> Result<Vec<(u32, u32, u32)>> {
    let rest = body_after_fullbox(body)?;
    if rest.len() < 4 {
        return Err(Error::Truncated);
    }
    let count = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(count);
    let mut pos = 4usize;
    for _ in 0..count {
        if pos + 12 > rest.len() {
            return Err(Error::Truncated);
        }
        let fc = u32::from_be_bytes(rest[pos..pos + 4].try_into().unwrap());
        let spc = u32::from_be_bytes(rest[pos + 4..pos + 8].try_into().unwrap());
        let sdi = u32::from_be_bytes(rest[pos + 8..pos + 12].try_into().unwrap());
        out.push((fc, spc, sdi));
        pos += 12;
    }
    Ok(out)
}

fn parse_u32_list(body: &[u8]) -> Result<Vec<u32>> {
    let rest = body_after_fullbox(body)?;
    if rest.len() < 4 {
        return Err(Error::Truncated);
    }
    let count = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(count);
    let mut pos = 4usize;
    for _ in 0..count {
        if pos + 4 > rest.len() {
            return Err(Error::Truncated);
        }
        out.push(u32::from_be_bytes(rest[pos..pos + 4].try_into().unwrap()));
        pos += 4;
    }
    Ok(out)
}

fn parse_u64_list(body: &[u8]) -> Result<Vec<u64>> {
    let rest = body_after_fullbox(body)?;
    if rest.len() < 4 {
        return Err(Error::Truncated);
    }
    let count = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(count);
    let mut pos = 4usize;
    for _ in 0..count {
        if pos + 8 > rest.len() {
            return Err(Error::Truncated);
        }
        out.push(u64::from_be_bytes(rest[pos..pos + 8].try_into().unwrap()));
        pos += 8;
    }
    Ok(out)
}

/// Preprocesses raw `stsc` triples into runs of `(chunk_run_length, samples_per_chunk)`,
/// with the last run's length left as `None` (it extends to the last chunk in `stco`).
///
/// Mirrors `MovBoxSampleToChunk._init2`'s `entry_data_pp`.
pub fn preprocess_stsc(entries: &[(u32, u32, u32)]) -> Vec<(Option<u32>, u32)> {
    let mut fc_l: u32 = 1;
    let mut spc_l: u32 = 0;
    let mut ed_pp = Vec::new();
    for &(fc, spc, _sdi) in entries {
        if fc > fc_l {
            ed_pp.push((Some(fc - fc_l), spc_l));
        }
        fc_l = fc;
        spc_l = spc;
    }
    ed_pp.push((None, spc_l));
    ed_pp
}
