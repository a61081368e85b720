//! FLV container demuxer.
//!
//! Grounded on `original_source/mcde_flv.py`'s `FLVReader`/`FLVAudioData`/`FLVVideoData`/
//! `FLVScriptData`/`ASParser`.

pub mod amf;
pub mod tag;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use crate::dataref::DataRef;
use tag::{AudioTag, ScriptTag, Tag, TagBody, VideoTag};

fn read_u8(file: &mut File) -> Result<u8> {
    let mut buf = [0u8; 1];
    file.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u24(file: &mut File) -> Result<u32> {
    let mut buf = [0u8; 3];
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes([0, buf[0], buf[1], buf[2]]))
}

fn read_u32(file: &mut File) -> Result<u32> {
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Errors produced while demuxing an FLV stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file didn't start with the `FLV` signature.
    #[error("FLV header didn't start with the 'FLV' signature")]
    BadMagic,
    /// The first tag-size entry following the header was nonzero.
    #[error("FLV header followed by nonzero tag-size entry {0}")]
    NonzeroLeadingTagSize(u32),
    /// A tag header was truncated.
    #[error("truncated FLV tag header")]
    ShortTagHeader,
    /// A tag's header-derived size didn't match the trailing back-pointer.
    #[error("tag header-derived size {header_derived} != {trailing} trailing size")]
    TagSizeMismatch {
        /// Size computed from the tag header.
        header_derived: u32,
        /// Size read from the trailing back-pointer.
        trailing: u32,
    },
    /// A tag body ended before all of its fixed fields could be read.
    #[error("FLV tag body too short for its fixed fields")]
    TagBodyTooShort,
    /// An `AVCDecoderConfigurationRecord` had an unsupported config version.
    #[error("incompatible AVC config version {0}")]
    IncompatibleAvcConfigVersion(u8),
    /// An H.264 NALU length-prefix sequence was malformed.
    #[error("NAL unit init sequence mismatch")]
    NaluSequenceMismatch,
    /// An Action-Script value failed to parse.
    #[error("Action-Script parse error: {0}")]
    Amf(#[from] amf::Error),
    /// Two tags belonging to the same elementary stream disagreed about codec
    /// or format parameters (codec ID, sample rate/size, channel count).
    #[error("stream metadata inconsistency within a single FLV elementary stream")]
    StreamInconsistency,
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for FLV parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// The fixed FLV file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    /// The FLV version byte.
    pub version: u8,
    /// Whether the file's `TypeFlags` claim a video track is present.
    pub has_video: bool,
    /// Whether the file's `TypeFlags` claim an audio track is present.
    pub has_audio: bool,
    /// Byte offset of the first tag, relative to the start of the file.
    pub data_offset: u32,
}

/// Reads FLV tags from a shared, seekable file.
pub struct FlvReader {
    file: Arc<Mutex<File>>,
}

impl FlvReader {
    /// Opens `path` for FLV demuxing.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(FlvReader {
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Parses the file header and validates the leading zero tag-size entry.
    pub fn parse_header(&self) -> Result<FlvHeader> {
        let mut file = self.file.lock().expect("FLV file lock poisoned");
        file.seek(SeekFrom::Start(0))?;

        let mut sig = [0u8; 3];
        file.read_exact(&mut sig)?;
        if &sig != b"FLV" {
            return Err(Error::BadMagic);
        }
        let version = read_u8(&mut file)?;
        let flags = read_u8(&mut file)?;
        let data_offset = read_u32(&mut file)?;

        let has_video = flags & 0x01 != 0;
        let has_audio = flags & 0x02 != 0;

        file.seek(SeekFrom::Start(data_offset as u64))?;
        let mut ts0 = [0u8; 4];
        match file.read(&mut ts0)? {
            0 => {}
            4 => {
                let value = u32::from_be_bytes(ts0);
                if value != 0 {
                    return Err(Error::NonzeroLeadingTagSize(value));
                }
            }
            _ => return Err(Error::ShortTagHeader),
        }

        Ok(FlvHeader {
            version,
            has_video,
            has_audio,
            data_offset,
        })
    }

    /// Parses every tag following the header into memory.
    ///
    /// Mirrors `FLVReader.parse_tags`: each tag is read via its header-derived size,
    /// and the trailing 4-byte back-pointer is checked for consistency.
    pub fn tags(&self, header: &FlvHeader) -> Result<Vec<Tag>> {
        const TAG_HEADER_LEN: u64 = 11;

        let mut out = Vec::new();
        let mut offset = header.data_offset as u64 + 4; // past the leading zero tag-size

        loop {
            let mut file = self.file.lock().expect("FLV file lock poisoned");
            file.seek(SeekFrom::Start(offset))?;

            let mut probe = [0u8; 1];
            if file.read(&mut probe)? == 0 {
                break;
            }
            let tag_type = probe[0];

            let body_size = read_u24(&mut file)?;
            let ts_low = read_u24(&mut file)?;
            let ts_ext = read_u8(&mut file)?;
            let mut stream_id = [0u8; 3];
            file.read_exact(&mut stream_id)?;

            let timestamp = ((ts_ext as i32) << 24) | ts_low as i32;
            let tag_size = TAG_HEADER_LEN + body_size as u64;
            let body_data = DataRef::from_file(self.file.clone(), offset + TAG_HEADER_LEN, body_size as u64);

            drop(file);
            let body = match tag_type {
                8 => TagBody::Audio(AudioTag::parse(body_data, body_size)?),
                9 => TagBody::Video(VideoTag::parse(body_data, body_size)?),
                18 => TagBody::Script(ScriptTag { data: body_data }),
                other => TagBody::Other {
                    tag_type: other,
                    data: body_data,
                },
            };

            let mut file = self.file.lock().expect("FLV file lock poisoned");
            file.seek(SeekFrom::Start(offset + tag_size))?;
            let trailing = read_u32(&mut file)?;
            if trailing as u64 != tag_size {
                return Err(Error::TagSizeMismatch {
                    header_derived: tag_size as u32,
                    trailing,
                });
            }

            out.push(Tag { timestamp, body });
            offset += tag_size + 4;
        }

        Ok(out)
    }
}
