//! The codec registry: opaque codec identifiers and their Matroska `CodecID` strings.

use std::fmt;

/// The kind of track a codec belongs to, used to validate codec/track pairings
/// and to report [`crate::Error::CodecEncapsulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// A video track.
    Video,
    /// An audio track.
    Audio,
    /// A subtitle track.
    Subtitle,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Subtitle => write!(f, "subtitle"),
        }
    }
}

/// A codec known to this crate's demuxers and builder.
///
/// Mirrors the `CODEC_ID_*` constants in `mcio_codecs.py`: codec identity is
/// opaque to the demuxers (they only ever compare/forward it), and the
/// builder is the only place a `Codec` is turned into a Matroska `CodecID`
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// MPEG-1 video.
    Mpeg1,
    /// MPEG-2 video.
    Mpeg2,
    /// MPEG-4 Part 2 video, a.k.a. DivX.
    Mpeg4Part2,
    /// H.264 / AVC / MPEG-4 Part 10 video.
    H264,
    /// Snow video (FFmpeg experimental codec).
    Snow,
    /// Theora video.
    Theora,
    /// Flash Screen Video.
    FlashSv,
    /// Sorenson Spark / H.263 variant used by Flash Video.
    Flv1,
    /// On2 VP6 video.
    Vp6,
    /// On2 VP6 video with alpha channel.
    Vp6a,
    /// VP8 video.
    Vp8,
    /// Advanced Audio Coding.
    Aac,
    /// Dolby Digital (AC-3) audio.
    Ac3,
    /// DTS audio.
    Dts,
    /// Free Lossless Audio Codec.
    Flac,
    /// MPEG-1 Audio Layer I.
    Mp1,
    /// MPEG-1 Audio Layer II.
    Mp2,
    /// MPEG-1 Audio Layer III.
    Mp3,
    /// Speex audio.
    Speex,
    /// Vorbis audio.
    Vorbis,
    /// Pseudo-codec: Microsoft Video for Windows (VFW) wrapping for Matroska.
    MsVfw,
    /// Pseudo-codec: Microsoft Audio Compression Manager (ACM) wrapping for Matroska.
    MsAcm,
}

impl Codec {
    /// The kind of track this codec can appear on.
    pub fn track_kind(&self) -> TrackKind {
        use Codec::*;
        match self {
            Mpeg1 | Mpeg2 | Mpeg4Part2 | H264 | Snow | Theora | FlashSv | Flv1 | Vp6 | Vp6a
            | Vp8 | MsVfw => TrackKind::Video,
            Aac | Ac3 | Dts | Flac | Mp1 | Mp2 | Mp3 | Speex | Vorbis | MsAcm => TrackKind::Audio,
        }
    }

    /// Alias for `Mpeg4Part2`, matching `mcio_codecs.py`'s `CODEC_ID_DIVX` alias.
    pub const DIVX: Codec = Codec::Mpeg4Part2;
    /// Alias for `H264`, matching `mcio_codecs.py`'s `CODEC_ID_AVC` alias.
    pub const AVC: Codec = Codec::H264;

    /// The Matroska `CodecID` string for this codec, e.g. `"V_MPEG4/ISO/AVC"`.
    ///
    /// Returns `None` for the MS-compatibility pseudo-codecs, whose `CodecID`
    /// depends on the wrapped FourCC/tag rather than being a fixed string; the
    /// builder constructs those directly.
    pub fn matroska_codec_id(&self) -> Option<&'static str> {
        use Codec::*;
        Some(match self {
            Mpeg1 => "V_MPEG1",
            Mpeg2 => "V_MPEG2",
            Mpeg4Part2 => "V_MPEG4/ISO/ASP",
            H264 => "V_MPEG4/ISO/AVC",
            Snow => "V_SNOW",
            Theora => "V_THEORA",
            FlashSv => "V_FLASHSV",
            Flv1 => "V_FLV1",
            Vp6 => "V_VP6",
            Vp6a => "V_VP6A",
            Vp8 => "V_VP8",
            Aac => "A_AAC",
            Ac3 => "A_AC3",
            Dts => "A_DTS",
            Flac => "A_FLAC",
            Mp1 => "A_MPEG/L1",
            Mp2 => "A_MPEG/L2",
            Mp3 => "A_MPEG/L3",
            Speex => "A_SPEEX",
            Vorbis => "A_VORBIS",
            MsVfw | MsAcm => return None,
        })
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matroska_ids_match_known_strings() {
        assert_eq!(Codec::H264.matroska_codec_id(), Some("V_MPEG4/ISO/AVC"));
        assert_eq!(Codec::Vorbis.matroska_codec_id(), Some("A_VORBIS"));
        assert_eq!(Codec::MsVfw.matroska_codec_id(), None);
    }

    #[test]
    fn track_kinds_partition_video_and_audio() {
        assert_eq!(Codec::H264.track_kind(), TrackKind::Video);
        assert_eq!(Codec::Aac.track_kind(), TrackKind::Audio);
    }

    #[test]
    fn aliases_resolve_to_canonical_variant() {
        assert_eq!(Codec::DIVX, Codec::Mpeg4Part2);
        assert_eq!(Codec::AVC, Codec::H264);
    }
}
