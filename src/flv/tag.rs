//! FLV tag bodies: audio, video, and script data.

use crate::dataref::DataRef;
use crate::flv::amf;
use crate::flv::Error;

/// A parsed FLV tag: a timestamp plus a type-specific body.
#[derive(Debug, Clone)]
pub struct Tag {
    /// The tag's timestamp in milliseconds, as stored in the FLV stream (before any
    /// composition-time adjustment video tags apply).
    pub timestamp: i32,
    /// The type-specific tag body.
    pub body: TagBody,
}

impl Tag {
    /// The effective presentation timestamp, after applying the video composition-time offset.
    pub fn presentation_timestamp(&self) -> i32 {
        match &self.body {
            TagBody::Video(video) => self.timestamp + video.composition_time_offset.unwrap_or(0),
            _ => self.timestamp,
        }
    }
}

/// The body of an FLV tag.
#[derive(Debug, Clone)]
pub enum TagBody {
    /// An audio data tag.
    Audio(AudioTag),
    /// A video data tag.
    Video(VideoTag),
    /// A script data (metadata) tag.
    Script(ScriptTag),
    /// A tag of a type this crate doesn't interpret further.
    Other {
        /// The raw FLV tag type byte.
        tag_type: u8,
        /// The tag's undecoded body.
        data: DataRef,
    },
}

/// Maps an FLV video `CodecID` nibble to a Matroska `CodecID` string, per `FLVReader`'s
/// `VIDEO_CODEC_MKV_MAP`.
pub fn video_codec_matroska_id(codec_id: u8) -> Option<&'static str> {
    match codec_id {
        7 => Some("V_MPEG4/ISO/AVC"),
        _ => None,
    }
}

/// Maps an FLV audio `SoundFormat` nibble to a Matroska `CodecID` string, per `FLVReader`'s
/// `AUDIO_CODEC_MKV_MAP`.
pub fn audio_codec_matroska_id(codec_id: u8) -> Option<&'static str> {
    match codec_id {
        2 | 14 => Some("A_MPEG/L3"),
        10 => Some("A_AAC"),
        _ => None,
    }
}

/// The four sample rates an FLV `SoundRate` 2-bit field can select.
const AUDIO_SAMPLE_RATE_TABLE: [u32; 4] = [5500, 11000, 22000, 44000];

/// An audio tag body (`AUDIODATA`).
#[derive(Debug, Clone)]
pub struct AudioTag {
    /// The tag's encoded sample data (excluding the flags byte and, for AAC, the packet-type byte).
    pub data: DataRef,
    /// The raw FLV `SoundFormat` codec identifier.
    pub codec_id: u8,
    /// The sample rate in Hz, decoded from the 2-bit `SoundRate` field.
    pub sample_rate: u32,
    /// `true` if samples are 16-bit, `false` if 8-bit (`SoundSize`).
    pub is_16_bit: bool,
    /// Channel count (1 = mono, 2 = stereo).
    pub channels: u8,
    /// For AAC (`codec_id == 10`), the `AACPacketType` byte (0 = sequence header, 1 = raw).
    pub aac_packet_type: Option<u8>,
}

impl AudioTag {
    /// `true` for an AAC sequence header (codec initialization data), `false` for a raw frame,
    /// `None` for non-AAC codecs (which have no such distinction).
    pub fn is_header(&self) -> Option<bool> {
        self.aac_packet_type.map(|pt| pt == 0)
    }

    /// Two audio tags describe the same logical stream if their codec, sample rate/size, and
    /// channel count all agree.
    pub fn stream_matches(&self, other: &AudioTag) -> bool {
        self.codec_id == other.codec_id
            && self.is_16_bit == other.is_16_bit
            && self.channels == other.channels
    }

    pub(crate) fn parse(data: DataRef, data_size: u32) -> Result<Self, Error> {
        let flags = data_flags_byte(&data)?;
        let codec_id = (flags & 0xF0) >> 4;
        let sound_rate = (flags & 0x0C) >> 2;
        let is_16_bit = (flags & 0x02) != 0;
        let channels = (flags & 0x01) + 1;

        let mut body_offset = 1;
        let mut body_size = data_size.checked_sub(1).ok_or(Error::TagBodyTooShort)?;
        let aac_packet_type = if codec_id == 10 {
            let bytes = data.get_data()?;
            let pt = *bytes.get(1).ok_or(Error::TagBodyTooShort)?;
            body_offset += 1;
            body_size = body_size.checked_sub(1).ok_or(Error::TagBodyTooShort)?;
            Some(pt)
        } else {
            None
        };

        Ok(AudioTag {
            data: data.sub(body_offset, body_size)?,
            codec_id,
            sample_rate: AUDIO_SAMPLE_RATE_TABLE[sound_rate as usize],
            is_16_bit,
            channels,
            aac_packet_type,
        })
    }
}

/// A video tag body (`VIDEODATA`).
#[derive(Debug, Clone)]
pub struct VideoTag {
    /// The tag's encoded frame data (excluding the flags byte and, for AVC, the 4-byte AVC header).
    pub data: DataRef,
    /// `true` if this is a keyframe (`FrameType` 1 or 5).
    pub is_keyframe: bool,
    /// `true` if this frame is disposable and may be dropped without affecting later frames
    /// (`FrameType` 3).
    pub disposable: bool,
    /// The raw FLV `CodecID`.
    pub codec_id: u8,
    /// For AVC (`codec_id == 7`), the `AVCPacketType` byte (0 = sequence header, 1 = NALU).
    pub avc_packet_type: Option<u8>,
    /// For AVC, the signed 24-bit composition-time offset in milliseconds.
    pub composition_time_offset: Option<i32>,
}

impl VideoTag {
    /// `true` for an AVC sequence header (codec initialization data), `false` for a frame,
    /// `None` for non-AVC codecs.
    pub fn is_header(&self) -> Option<bool> {
        self.avc_packet_type.map(|pt| pt == 0)
    }

    /// Two video tags describe the same logical stream if their codec agrees.
    pub fn stream_matches(&self, other: &VideoTag) -> bool {
        self.codec_id == other.codec_id
    }

    pub(crate) fn parse(data: DataRef, data_size: u32) -> Result<Self, Error> {
        let flags = data_flags_byte(&data)?;
        let frame_type = (flags & 0xF0) >> 4;
        let codec_id = flags & 0x0F;

        let is_keyframe = matches!(frame_type, 1 | 5);
        let disposable = frame_type == 3;

        let mut body_offset = 1;
        let mut body_size = data_size.checked_sub(1).ok_or(Error::TagBodyTooShort)?;
        let (avc_packet_type, composition_time_offset) = if codec_id == 7 {
            let bytes = data.get_data()?;
            let header = bytes.get(1..5).ok_or(Error::TagBodyTooShort)?;
            let avc_pt = header[0];
            // Composition time offset is a signed 24-bit big-endian int; sign-extend to i32.
            let raw = ((header[1] as i32) << 16) | ((header[2] as i32) << 8) | (header[3] as i32);
            let ct_off = if header[1] & 0x80 != 0 {
                raw | !0x00FF_FFFFi32
            } else {
                raw
            };
            body_offset += 4;
            body_size = body_size.checked_sub(4).ok_or(Error::TagBodyTooShort)?;
            (Some(avc_pt), Some(ct_off))
        } else {
            (None, None)
        };

        Ok(VideoTag {
            data: data.sub(body_offset, body_size)?,
            is_keyframe,
            disposable,
            codec_id,
            avc_packet_type,
            composition_time_offset,
        })
    }
}

/// A script data tag (`onMetaData` and similar).
#[derive(Debug, Clone)]
pub struct ScriptTag {
    /// The tag's undecoded Action-Script payload.
    pub data: DataRef,
}

impl ScriptTag {
    /// Parses the tag body as exactly two Action-Script values and, if the first is the string
    /// `"onMetaData"`, returns the second as the metadata object's entries.
    pub fn get_metadata(&self) -> Result<Option<Vec<(String, amf::Value)>>, Error> {
        let bytes = self.data.get_data()?;
        let (key, value) = amf::parse_script_data(&bytes)?;
        if key != amf::Value::String("onMetaData".to_string()) {
            return Ok(None);
        }
        Ok(match value {
            amf::Value::Object(entries) | amf::Value::EcmaArray(entries) => Some(entries),
            _ => None,
        })
    }
}

fn data_flags_byte(data: &DataRef) -> Result<u8, Error> {
    let bytes = data.get_data()?;
    bytes.first().copied().ok_or(Error::TagBodyTooShort)
}

/// Extracts the H.264 NALU length-prefix size from an `AVCDecoderConfigurationRecord`
/// (the AVC sequence header payload), per `_h264_id_get_ls`.
pub fn avc_config_length_size(config: &[u8]) -> Result<u8, Error> {
    let config_version = *config.first().ok_or(Error::TagBodyTooShort)?;
    if config_version != 1 {
        return Err(Error::IncompatibleAvcConfigVersion(config_version));
    }
    let length_size_minus_one = config.get(4).ok_or(Error::TagBodyTooShort)? & 0x03;
    Ok(length_size_minus_one + 1)
}

/// Splits a length-prefixed H.264 NALU stream (`AVCPacketType == 1` payload) into its
/// individual NAL unit type codes. Picture-order-count reconstruction, present in the
/// original tool, is intentionally not ported — nothing downstream of this crate's
/// Matroska builder consumes POC information.
pub fn h264_nalu_types(data: &[u8], length_size: u8) -> Result<Vec<u8>, Error> {
    let length_size = length_size as usize;
    let mut rv = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        if rest.len() < length_size + 1 {
            return Err(Error::TagBodyTooShort);
        }
        let mut lbuf = [0u8; 4];
        lbuf[4 - length_size..].copy_from_slice(&rest[..length_size]);
        let body_size = u32::from_be_bytes(lbuf) as usize;
        let nal_b1 = rest[length_size];
        if nal_b1 >= 128 {
            return Err(Error::NaluSequenceMismatch);
        }
        rv.push(nal_b1 & 0x1F);
        let skip = (length_size + body_size).min(rest.len());
        rest = &rest[skip..];
    }
    Ok(rv)
}

trait DataRefExt {
    fn sub(&self, offset: u32, size: u32) -> Result<DataRef, Error>;
}

impl DataRefExt for DataRef {
    fn sub(&self, offset: u32, size: u32) -> Result<DataRef, Error> {
        match self {
            DataRef::File { file, offset: base, .. } => Ok(DataRef::from_file(
                file.clone(),
                *base + offset as u64,
                size as u64,
            )),
            DataRef::Owned(bytes) => {
                let start = offset as usize;
                let end = start + size as usize;
                let slice = bytes.get(start..end).ok_or(Error::TagBodyTooShort)?;
                Ok(DataRef::Owned(slice.into()))
            }
            DataRef::Borrowed(bytes, range) => {
                let start = range.start + offset as usize;
                let end = start + size as usize;
                DataRef::from_borrowed(bytes.clone(), start..end).map_err(|_| Error::TagBodyTooShort)
            }
        }
    }
}
