//! Leaf (non-master) Matroska/EBML element types.
//!
//! The upstream crate this module is adapted from generates one concrete
//! tuple-struct per element from a vendored copy of the EBML/Matroska
//! specification XML, via a `build.rs` code generator. That XML file isn't
//! part of this crate's inputs, so the generated types are written here by
//! hand instead, using a small family of declarative macros that produce the
//! exact same shape the generator would have (struct, `Deref`, `Element`,
//! `Default`) for each of the four leaf kinds: unsigned integer, signed
//! integer, float, text and binary.

use crate::element::Element;
use crate::functional::*;
use std::ops::Deref;

macro_rules! leaf_uint {
    ($name:ident, $id:expr) => {
        leaf_uint!(@impl $name, $id, 0u64, false);
    };
    ($name:ident, $id:expr, $default:expr) => {
        leaf_uint!(@impl $name, $id, $default, true);
    };
    (@impl $name:ident, $id:expr, $default:expr, $has_default:expr) => {
        #[doc = concat!("`", stringify!($name), "` unsigned-integer element.")]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl Deref for $name {
            type Target = u64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Element for $name {
            const ID: crate::base::VInt64 = crate::base::VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_default;

            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.is_empty() {
                    return Ok(Self($default));
                }
                if buf.len() > 8 {
                    return Err(crate::Error::UnderDecode(Self::ID));
                }
                let len = buf.len();
                let mut value = [0u8; 8];
                value[8 - len..].copy_from_slice(&buf[..len]);
                buf.advance(len);
                Ok(Self(u64::from_be_bytes(value)))
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let bytes = self.0.to_be_bytes();
                let first_non_zero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
                buf.append_slice(&bytes[first_non_zero..]);
                Ok(())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default)
            }
        }
    };
}

macro_rules! leaf_sint {
    ($name:ident, $id:expr) => {
        leaf_sint!(@impl $name, $id, 0i64, false);
    };
    ($name:ident, $id:expr, $default:expr) => {
        leaf_sint!(@impl $name, $id, $default, true);
    };
    (@impl $name:ident, $id:expr, $default:expr, $has_default:expr) => {
        #[doc = concat!("`", stringify!($name), "` signed-integer element.")]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl Deref for $name {
            type Target = i64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Element for $name {
            const ID: crate::base::VInt64 = crate::base::VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_default;

            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.is_empty() {
                    return Ok(Self($default));
                }
                if buf.len() > 8 {
                    return Err(crate::Error::UnderDecode(Self::ID));
                }
                let len = buf.len();
                let is_neg = (buf[0] & 0x80) != 0;
                let mut value = if is_neg { [0xFFu8; 8] } else { [0u8; 8] };
                value[8 - len..].copy_from_slice(&buf[..len]);
                buf.advance(len);
                Ok(Self(i64::from_be_bytes(value)))
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let bytes = self.0.to_be_bytes();
                if self.0 >= 0 {
                    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
                    buf.append_slice(&bytes[first..]);
                } else {
                    let first = bytes.iter().position(|&b| b != 0xFF).unwrap_or(bytes.len() - 1);
                    buf.append_slice(&bytes[first..]);
                }
                Ok(())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default)
            }
        }
    };
}

macro_rules! leaf_float {
    ($name:ident, $id:expr) => {
        leaf_float!(@impl $name, $id, 0.0f64, false);
    };
    ($name:ident, $id:expr, $default:expr) => {
        leaf_float!(@impl $name, $id, $default, true);
    };
    (@impl $name:ident, $id:expr, $default:expr, $has_default:expr) => {
        #[doc = concat!("`", stringify!($name), "` float element.")]
        #[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
        pub struct $name(pub f64);

        impl Deref for $name {
            type Target = f64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Element for $name {
            const ID: crate::base::VInt64 = crate::base::VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_default;

            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                match buf.len() {
                    0 => Ok(Self($default)),
                    4 => {
                        let mut value = [0u8; 4];
                        value.copy_from_slice(&buf[..4]);
                        buf.advance(4);
                        Ok(Self(f32::from_be_bytes(value) as f64))
                    }
                    8 => {
                        let mut value = [0u8; 8];
                        value.copy_from_slice(&buf[..8]);
                        buf.advance(8);
                        Ok(Self(f64::from_be_bytes(value)))
                    }
                    _ => Err(crate::Error::UnderDecode(Self::ID)),
                }
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                fn fits_f32(value: f64) -> bool {
                    if value.is_infinite() || value.is_nan() {
                        return false;
                    }
                    (value as f32) as f64 == value
                }
                if fits_f32(self.0) {
                    buf.append_slice(&(self.0 as f32).to_be_bytes());
                } else {
                    buf.append_slice(&self.0.to_be_bytes());
                }
                Ok(())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default)
            }
        }
    };
}

macro_rules! leaf_text {
    ($name:ident, $id:expr) => {
        leaf_text!(@impl $name, $id, "", false);
    };
    ($name:ident, $id:expr, $default:expr) => {
        leaf_text!(@impl $name, $id, $default, true);
    };
    (@impl $name:ident, $id:expr, $default:expr, $has_default:expr) => {
        #[doc = concat!("`", stringify!($name), "` string element.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Element for $name {
            const ID: crate::base::VInt64 = crate::base::VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_default;

            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let first_zero = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
                let result = Self(String::from_utf8_lossy(&buf[..first_zero]).to_string());
                buf.advance(buf.len());
                Ok(result)
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(self.0.as_bytes());
                Ok(())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default.to_string())
            }
        }
    };
}

macro_rules! leaf_bin {
    ($name:ident, $id:expr) => {
        #[doc = concat!("`", stringify!($name), "` binary element.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub Vec<u8>);

        impl Deref for $name {
            type Target = [u8];
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Element for $name {
            const ID: crate::base::VInt64 = crate::base::VInt64::from_encoded($id);

            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let result = Self(buf.to_vec());
                buf.advance(buf.len());
                Ok(result)
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(&self.0);
                Ok(())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(Vec::new())
            }
        }
    };
}

macro_rules! leaf_date {
    ($name:ident, $id:expr) => {
        #[doc = concat!("`", stringify!($name), "` date element (nanoseconds since 2001-01-01T00:00:00 UTC).")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl Deref for $name {
            type Target = i64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Element for $name {
            const ID: crate::base::VInt64 = crate::base::VInt64::from_encoded($id);

            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.len() != 8 {
                    return Err(crate::Error::UnderDecode(Self::ID));
                }
                let value = i64::from_be_bytes(buf[..8].try_into().unwrap());
                buf.advance(8);
                Ok(Self(value))
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(&self.0.to_be_bytes());
                Ok(())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(0)
            }
        }
    };
}

/// Seconds between the Unix epoch (1970-01-01) and the EBML Date epoch (2001-01-01).
pub const DATE_EPOCH_OFFSET_SECS: i64 = 978_307_200;

impl DateUtc {
    /// Seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> f64 {
        (self.0 as f64 / 1_000_000_000.0) + DATE_EPOCH_OFFSET_SECS as f64
    }

    /// Build from seconds since the Unix epoch.
    pub fn from_unix_seconds(secs: f64) -> Self {
        Self(((secs - DATE_EPOCH_OFFSET_SECS as f64) * 1_000_000_000.0).round() as i64)
    }
}

// ---------------------------------------------------------------- EBML header leaves
leaf_uint!(EbmlVersion, 0x4286, 1);
leaf_uint!(EbmlReadVersion, 0x42F7, 1);
leaf_uint!(EbmlMaxIdLength, 0x42F2, 4);
leaf_uint!(EbmlMaxSizeLength, 0x42F3, 8);
leaf_text!(DocType, 0x4282);
leaf_uint!(DocTypeVersion, 0x4287, 1);
leaf_uint!(DocTypeReadVersion, 0x4285, 1);

// ---------------------------------------------------------------- SeekHead
leaf_bin!(SeekId, 0x53AB);
leaf_uint!(SeekPosition, 0x53AC);

// ---------------------------------------------------------------- Info
leaf_bin!(SegmentUuid, 0x73A4);
leaf_text!(SegmentFilename, 0x7384);
leaf_bin!(PrevUuid, 0x3CB923);
leaf_text!(PrevFilename, 0x3C83AB);
leaf_bin!(NextUuid, 0x3EB923);
leaf_text!(NextFilename, 0x3E83BB);
leaf_bin!(SegmentFamily, 0x4444);
leaf_bin!(ChapterTranslateId, 0x69A5);
leaf_uint!(ChapterTranslateCodec, 0x69BF);
leaf_uint!(ChapterTranslateEditionUid, 0x69FC);
leaf_uint!(TimestampScale, 0x2AD7B1, 1_000_000);
leaf_float!(Duration, 0x4489);
leaf_date!(DateUtc, 0x4461);
leaf_text!(Title, 0x7BA9);
leaf_text!(MuxingApp, 0x4D80);
leaf_text!(WritingApp, 0x5741);

// ---------------------------------------------------------------- Cluster / Block
leaf_uint!(Timestamp, 0xE7);
leaf_uint!(Position, 0xA7);
leaf_uint!(PrevSize, 0xAB);
leaf_bin!(SimpleBlock, 0xA3);
leaf_bin!(Block, 0xA1);
leaf_bin!(BlockAdditional, 0xA5);
leaf_uint!(BlockAddId, 0xEE, 1);
leaf_uint!(BlockDuration, 0x9B);
leaf_uint!(ReferencePriority, 0xFA);
leaf_sint!(ReferenceBlock, 0xFB);
leaf_bin!(CodecState, 0xA4);
leaf_sint!(DiscardPadding, 0x75A2);

// ---------------------------------------------------------------- Tracks
leaf_uint!(TrackNumber, 0xD7);
leaf_uint!(TrackUid, 0x73C5);
leaf_uint!(TrackType, 0x83);
leaf_uint!(FlagEnabled, 0xB9, 1);
leaf_uint!(FlagDefault, 0x88, 1);
leaf_uint!(FlagLacing, 0x9C, 1);
leaf_uint!(DefaultDuration, 0x23E383);
leaf_float!(TrackTimecodeScale, 0x23314F, 1.0);
leaf_text!(Name, 0x536E);
leaf_text!(Language, 0x22B59C, "eng");
leaf_text!(CodecId, 0x86);
leaf_bin!(CodecPrivate, 0x63A2);
leaf_text!(CodecName, 0x258688);
leaf_bin!(TrackTranslateTrackId, 0x66A5);
leaf_uint!(TrackTranslateCodec, 0x66BF);
leaf_uint!(TrackTranslateEditionUid, 0x66FC);

leaf_uint!(PixelWidth, 0xB0);
leaf_uint!(PixelHeight, 0xBA);
leaf_uint!(DisplayWidth, 0x54B0);
leaf_uint!(DisplayHeight, 0x54BA);

leaf_float!(SamplingFrequency, 0xB5, 8000.0);
leaf_float!(OutputSamplingFrequency, 0x78B5);
leaf_uint!(Channels, 0x9F, 1);
leaf_uint!(BitDepth, 0x6264);

leaf_uint!(ContentEncodingOrder, 0x5031);
leaf_uint!(ContentEncodingScope, 0x5032, 1);
leaf_uint!(ContentEncodingType, 0x5033);
leaf_uint!(ContentCompAlgo, 0x4254);
leaf_bin!(ContentCompSettings, 0x4255);

// ---------------------------------------------------------------- Cues
leaf_uint!(CueTime, 0xB3);
leaf_uint!(CueTrack, 0xF7);
leaf_uint!(CueClusterPosition, 0xF1);
leaf_uint!(CueBlockNumber, 0x5378, 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_roundtrip() {
        let cases: [(Vec<u8>, u64); 4] =
            [(vec![1], 1), (vec![0xFF], 255), (vec![1, 0], 256), (vec![], 0)];
        for (encoded, value) in cases {
            let decoded = TrackNumber::decode_body(&mut &encoded[..]).unwrap();
            assert_eq!(*decoded, value);
            let mut out = vec![];
            TrackNumber(value).encode_body(&mut out).unwrap();
            if !encoded.is_empty() {
                assert_eq!(out, encoded);
            }
        }
    }

    #[test]
    fn sint_roundtrip() {
        // -1 with length 1 is 0xBF once the VInt marker is applied elsewhere;
        // the leaf body itself is just the two's-complement byte 0xFF.
        let decoded = ReferenceBlock::decode_body(&mut &[0xFFu8][..]).unwrap();
        assert_eq!(*decoded, -1);
        let mut out = vec![];
        ReferenceBlock(-1).encode_body(&mut out).unwrap();
        assert_eq!(out, vec![0xFF]);
    }

    #[test]
    fn date_epoch_conversion() {
        let d = DateUtc::from_unix_seconds(0.0);
        assert_eq!(*d, -DATE_EPOCH_OFFSET_SECS * 1_000_000_000);
        assert_eq!(d.unix_seconds(), 0.0);
    }

    #[test]
    fn text_defaults() {
        assert_eq!(&*Language::default(), "eng");
        assert_eq!(*FlagDefault::default(), 1);
    }
}
