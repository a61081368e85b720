use crate::Error;
use crate::base::*;
use crate::element::*;
use crate::functional::*;
use crate::leaf::*;
use crate::supplement::*;

/// An EBML element that was not recognised while decoding a Master element.
///
/// Kept instead of discarded so that decode followed by encode reproduces the
/// element rather than silently losing data that this crate doesn't model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownElement {
    /// The element's EBML ID, as encountered (not necessarily one this crate knows).
    pub id: VInt64,
    /// The raw, undecoded element body.
    pub body: Vec<u8>,
}

impl Encode for UnknownElement {
    fn encode<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        let header = Header {
            id: self.id,
            size: VInt64::new(self.body.len() as u64),
        };
        header.encode(buf)?;
        buf.append_slice(&self.body);
        Ok(())
    }
}

// A helper for generating nested elements.
/* example:
nested! {
    required: [ EbmlMaxIdLength, EbmlMaxSizeLength ],
    optional: [ EbmlVersion, EbmlReadVersion, DocType, DocTypeVersion, DocTypeReadVersion ],
    multiple: [ ],
};
*/
macro_rules! nested {
    (required: [$($required:ident),*$(,)?], optional: [$($optional:ident),*$(,)?], multiple: [$($multiple:ident),*$(,)?],) => {
        paste::paste! {
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let crc32 = Option::<Crc32>::decode(buf).ok().flatten();
                $( let mut [<$required:snake>] = None;)*
                $( let mut [<$optional:snake>] = None;)*
                $( let mut [<$multiple:snake>] = Vec::new();)*
                let mut void: Option<Void> = None;
                let mut unknown = Vec::new();

                while let Ok(Some(header)) = Option::<Header>::decode(buf) {
                    match header.id {
                        $( $required::ID => {
                            if [<$required:snake>].is_some() {
                                return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                            } else {
                                [<$required:snake>] = Some($required::decode_element(&header, buf)?)
                            }
                        } )*
                        $( $optional::ID => {
                            if [<$optional:snake>].is_some() {
                                return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                            } else {
                                [<$optional:snake>] = Some($optional::decode_element(&header, buf)?)
                            }
                        } )*
                        $( $multiple::ID => {
                            [<$multiple:snake>].push($multiple::decode_element(&header, buf)?);
                        } )*
                        Void::ID => {
                            let v = Void::decode_element(&header, buf)?;
                            if let Some(previous) = void {
                                void = Some(Void { size: previous.size + v.size });
                            } else {
                                void = Some(v);
                            }
                            log::info!("Skipping Void element in Element {}, size: {}B", Self::ID, *header.size);
                        }
                        _ => {
                            let size = *header.size as usize;
                            if buf.remaining() < size {
                                return Err(Error::OutOfBounds);
                            }
                            let body = buf.slice(size).to_vec();
                            buf.advance(size);
                            log::warn!("Unknown element {}({}b) in Element({}), preserving opaquely", header.id, size, Self::ID);
                            unknown.push(UnknownElement { id: header.id, body });
                        }
                    }
                }

                if buf.has_remaining() {
                    return Err(Error::ShortRead);
                }

                Ok(Self {
                    crc32,
                    $( [<$required:snake>]: [<$required:snake>].or(if $required::HAS_DEFAULT_VALUE { Some($required::default()) } else { None }).ok_or(Error::MissingElement($required::ID))?, )*
                    $( [<$optional:snake>], )*
                    $( [<$multiple:snake>], )*
                    void,
                    unknown,
                })
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                self.crc32.encode(buf)?;

                $( self.[<$required:snake>].encode(buf)?; )*
                $( self.[<$optional:snake>].encode(buf)?; )*
                $( self.[<$multiple:snake>].encode(buf)?; )*

                self.void.encode(buf)?;
                self.unknown.encode(buf)?;

                Ok(())
            }
        }
    };
}

/// EBML element, the first top-level element in a Matroska file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ebml {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// EBMLVersion element, indicates the version of EBML used.
    pub ebml_version: Option<EbmlVersion>,
    /// EBMLReadVersion element, indicates the minimum version of EBML required to read the file.
    pub ebml_read_version: Option<EbmlReadVersion>,
    /// EBMLMaxIDLength element, indicates the maximum length of an EBML ID in bytes.
    pub ebml_max_id_length: EbmlMaxIdLength,
    /// EBMLMaxSizeLength element, indicates the maximum length of an EBML size in bytes.
    pub ebml_max_size_length: EbmlMaxSizeLength,
    /// DocType element, indicates the type of document. For Matroska files, this is usually "matroska" or "webm".
    pub doc_type: Option<DocType>,
    /// DocTypeVersion element, indicates the version of the document type.
    pub doc_type_version: Option<DocTypeVersion>,
    /// DocTypeReadVersion element, indicates the minimum version of the document type required to read the file.
    pub doc_type_read_version: Option<DocTypeReadVersion>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Ebml {
    const ID: VInt64 = VInt64::from_encoded(0x1A45_DFA3);
    nested! {
        required: [ EbmlMaxIdLength, EbmlMaxSizeLength ],
        optional: [ EbmlVersion, EbmlReadVersion, DocType, DocTypeVersion, DocTypeReadVersion ],
        multiple: [ ],
    }
}

/// The Root Element that contains all other Top-Level Elements; see data-layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains seeking information of Top-Level Elements; see data-layout.
    pub seek_head: Vec<SeekHead>,
    /// Contains general information about the Segment.
    pub info: Info,
    /// A Top-Level Element of information with many tracks described.
    pub tracks: Option<Tracks>,
    /// A Top-Level Element to speed seeking access. All entries are local to the Segment. This Element **SHOULD** be set when the Segment is not transmitted as a live stream (see #livestreaming).
    pub cues: Option<Cues>,
    /// The Top-Level Element containing the (monolithic) Block structure.
    pub cluster: Vec<Cluster>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Segment {
    const ID: VInt64 = VInt64::from_encoded(0x18538067);
    nested! {
      required: [ Info ],
      optional: [ Tracks, Cues ],
      multiple: [ SeekHead, Cluster ],
    }
}

/// Contains seeking information of Top-Level Elements; see data-layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeekHead {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains a single seek entry to an EBML Element.
    pub seek: Vec<Seek>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for SeekHead {
    const ID: VInt64 = VInt64::from_encoded(0x114D9B74);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ Seek ],
    }
}

/// Contains a single seek entry to an EBML Element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seek {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The binary EBML ID of a Top-Level Element.
    pub seek_id: SeekId,
    /// The Segment Position (segment-position) of a Top-Level Element.
    pub seek_position: SeekPosition,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Seek {
    const ID: VInt64 = VInt64::from_encoded(0x4DBB);
    nested! {
      required: [ SeekId, SeekPosition ],
      optional: [ ],
      multiple: [ ],
    }
}

/// Contains general information about the Segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A randomly generated unique ID to identify the Segment amongst many others (128 bits).
    pub segment_uuid: Option<SegmentUuid>,
    /// A filename corresponding to this Segment.
    pub segment_filename: Option<SegmentFilename>,
    /// An ID to identify the previous Segment of a Linked Segment.
    pub prev_uuid: Option<PrevUuid>,
    /// A filename corresponding to the file of the previous Linked Segment.
    pub prev_filename: Option<PrevFilename>,
    /// An ID to identify the next Segment of a Linked Segment.
    pub next_uuid: Option<NextUuid>,
    /// A filename corresponding to the file of the next Linked Segment.
    pub next_filename: Option<NextFilename>,
    /// A unique ID that all Segments of a Linked Segment **MUST** share (128 bits).
    pub segment_family: Vec<SegmentFamily>,
    /// The mapping between this `Segment` and a segment value in the given Chapter Codec.
    pub chapter_translate: Vec<ChapterTranslate>,
    /// Base unit for Segment Ticks and Track Ticks, in nanoseconds.
    pub timestamp_scale: TimestampScale,
    /// Duration of the Segment, expressed in Segment Ticks which is based on TimestampScale.
    pub duration: Option<Duration>,
    /// The date and time that the Segment was created by the muxing application or library.
    pub date_utc: Option<DateUtc>,
    /// General name of the Segment
    pub title: Option<Title>,
    /// Muxing application or library (example: "libmatroska-0.4.3").
    pub muxing_app: MuxingApp,
    /// Writing application (example: "mkvmerge-0.3.3").
    pub writing_app: WritingApp,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Info {
    const ID: VInt64 = VInt64::from_encoded(0x1549A966);
    nested! {
      required: [ TimestampScale, MuxingApp, WritingApp ],
      optional: [ SegmentUuid, SegmentFilename, PrevUuid, PrevFilename, NextUuid, NextFilename, Duration, DateUtc, Title ],
      multiple: [ SegmentFamily, ChapterTranslate ],
    }
}

/// The mapping between this `Segment` and a segment value in the given Chapter Codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTranslate {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The binary value used to represent this Segment in the chapter codec data.
    pub chapter_translate_id: ChapterTranslateId,
    /// This `ChapterTranslate` applies to this chapter codec of the given chapter edition(s).
    pub chapter_translate_codec: ChapterTranslateCodec,
    /// Specify a chapter edition UID on which this `ChapterTranslate` applies.
    pub chapter_translate_edition_uid: Vec<ChapterTranslateEditionUid>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for ChapterTranslate {
    const ID: VInt64 = VInt64::from_encoded(0x6924);
    nested! {
        required: [ ChapterTranslateId, ChapterTranslateCodec ],
        optional: [ ],
        multiple: [ ChapterTranslateEditionUid ],
    }
}

/// A Top-Level Element of information with many tracks described.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tracks {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Describes a track with all Elements.
    pub track_entry: Vec<TrackEntry>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Tracks {
    const ID: VInt64 = VInt64::from_encoded(0x1654AE6B);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ TrackEntry ],
    }
}

/// Describes a track with all Elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackEntry {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The track number as used in the Block Header.
    pub track_number: TrackNumber,
    /// A unique ID to identify the Track.
    pub track_uid: TrackUid,
    /// The `TrackType` defines the type of the track, e.g. video, audio or subtitle.
    pub track_type: TrackType,
    /// Set if the track is usable. It is possible to turn a track that is not usable into a usable track using chapter codecs or control tracks.
    pub flag_enabled: FlagEnabled,
    /// Set if that track (audio, video or subs) is eligible for automatic selection by the player.
    pub flag_default: FlagDefault,
    /// Set if the track **MAY** use lacing.
    pub flag_lacing: FlagLacing,
    /// Number of nanoseconds per frame, expressed in Matroska Ticks -- i.e., in nanoseconds.
    pub default_duration: Option<DefaultDuration>,
    /// The scale to apply on this track to work at normal speed in relation with other tracks (mostly used to adjust video speed when the audio length differs).
    pub track_timecode_scale: Option<TrackTimecodeScale>,
    /// A human-readable track name.
    pub name: Option<Name>,
    /// The language of the track, in the Matroska languages form.
    pub language: Language,
    /// An ID corresponding to the codec, see [the Matroska codec RFC](https://www.matroska.org/technical/codec_specs.html) for more info.
    pub codec_id: CodecId,
    /// Private data only known to the codec.
    pub codec_private: Option<CodecPrivate>,
    /// A human-readable string specifying the codec.
    pub codec_name: Option<CodecName>,
    /// Mapping between this `TrackEntry` and a track value in the given Chapter Codec.
    pub track_translate: Vec<TrackTranslate>,
    /// Video settings.
    pub video: Option<Video>,
    /// Audio settings.
    pub audio: Option<Audio>,
    /// Settings for several content encoding mechanisms like compression or encryption.
    pub content_encodings: Option<ContentEncodings>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for TrackEntry {
    const ID: VInt64 = VInt64::from_encoded(0xAE);
    nested! {
      required: [ TrackNumber, TrackUid, TrackType, FlagEnabled, FlagDefault, FlagLacing, Language, CodecId ],
      optional: [ DefaultDuration, TrackTimecodeScale, Name, CodecPrivate, CodecName, Video, Audio, ContentEncodings ],
      multiple: [ TrackTranslate ],
    }
}

/// Mapping between this `TrackEntry` and a track value in the given Chapter Codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTranslate {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The binary value used to represent this Track in the chapter codec data.
    pub track_translate_track_id: TrackTranslateTrackId,
    /// This `TrackTranslate` applies to this chapter codec of the given chapter edition(s).
    pub track_translate_codec: TrackTranslateCodec,
    /// Specify a chapter edition UID on which this `TrackTranslate` applies.
    pub track_translate_edition_uid: Vec<TrackTranslateEditionUid>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for TrackTranslate {
    const ID: VInt64 = VInt64::from_encoded(0x6624);
    nested! {
        required: [ TrackTranslateTrackId, TrackTranslateCodec ],
        optional: [ ],
        multiple: [ TrackTranslateEditionUid ],
    }
}

/// Video settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Video {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Width of the encoded video frames in pixels.
    pub pixel_width: PixelWidth,
    /// Height of the encoded video frames in pixels.
    pub pixel_height: PixelHeight,
    /// Width of the video frames to display.
    pub display_width: Option<DisplayWidth>,
    /// Height of the video frames to display.
    pub display_height: Option<DisplayHeight>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Video {
    const ID: VInt64 = VInt64::from_encoded(0xE0);
    nested! {
      required: [ PixelWidth, PixelHeight ],
      optional: [ DisplayWidth, DisplayHeight ],
      multiple: [ ],
    }
}

/// Audio settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Audio {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Sampling frequency in Hz.
    pub sampling_frequency: SamplingFrequency,
    /// Real output sampling frequency in Hz (used for SBR techniques).
    pub output_sampling_frequency: Option<OutputSamplingFrequency>,
    /// Numbers of channels in the track.
    pub channels: Channels,
    /// Bits per sample, mostly used for PCM.
    pub bit_depth: Option<BitDepth>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Audio {
    const ID: VInt64 = VInt64::from_encoded(0xE1);
    nested! {
      required: [ SamplingFrequency, Channels ],
      optional: [ OutputSamplingFrequency, BitDepth ],
      multiple: [ ],
    }
}

/// Settings for several content encoding mechanisms like compression or encryption.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentEncodings {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Settings for one content encoding mechanism.
    pub content_encoding: Vec<ContentEncoding>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for ContentEncodings {
    const ID: VInt64 = VInt64::from_encoded(0x6D80);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ ContentEncoding ],
    }
}

/// Settings for one content encoding mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentEncoding {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Tells when this modification was used during encoding/muxing starting with 0, and counting upwards.
    pub content_encoding_order: ContentEncodingOrder,
    /// A bit field that describes which Elements have been modified in this way.
    pub content_encoding_scope: ContentEncodingScope,
    /// A value describing what kind of transformation is applied.
    pub content_encoding_type: ContentEncodingType,
    /// Settings describing the compression used.
    pub content_compression: Option<ContentCompression>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for ContentEncoding {
    const ID: VInt64 = VInt64::from_encoded(0x6240);
    nested! {
      required: [ ContentEncodingOrder, ContentEncodingScope, ContentEncodingType ],
      optional: [ ContentCompression ],
      multiple: [ ],
    }
}

/// Settings describing the compression used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentCompression {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The compression algorithm used.
    pub content_comp_algo: ContentCompAlgo,
    /// Settings that might be needed by the decompressor.
    pub content_comp_settings: Option<ContentCompSettings>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for ContentCompression {
    const ID: VInt64 = VInt64::from_encoded(0x5034);
    nested! {
      required: [ ContentCompAlgo ],
      optional: [ ContentCompSettings ],
      multiple: [ ],
    }
}

/// A Top-Level Element to speed seeking access. All entries are local to the Segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cues {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains all information relative to a seek point in the Segment.
    pub cue_point: Vec<CuePoint>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Cues {
    const ID: VInt64 = VInt64::from_encoded(0x1C53BB6B);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ CuePoint ],
    }
}

/// Contains all information relative to a seek point in the Segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CuePoint {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Absolute timestamp of the seek point, expressed in Segment Ticks which is based on TimestampScale.
    pub cue_time: CueTime,
    /// Contain positions for different tracks corresponding to the timestamp.
    pub cue_track_positions: Vec<CueTrackPositions>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for CuePoint {
    const ID: VInt64 = VInt64::from_encoded(0xBB);
    nested! {
      required: [ CueTime ],
      optional: [ ],
      multiple: [ CueTrackPositions ],
    }
}

/// Contain positions for different tracks corresponding to the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CueTrackPositions {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The track for which a position is given.
    pub cue_track: CueTrack,
    /// The Segment Position of the Cluster containing the associated Block.
    pub cue_cluster_position: CueClusterPosition,
    /// Number of the Block in the specified Cluster.
    pub cue_block_number: Option<CueBlockNumber>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for CueTrackPositions {
    const ID: VInt64 = VInt64::from_encoded(0xB7);
    nested! {
      required: [ CueTrack, CueClusterPosition ],
      optional: [ CueBlockNumber ],
      multiple: [ ],
    }
}

/// The Top-Level Element containing the (monolithic) Block structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cluster {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Absolute timestamp of the cluster, expressed in Segment Ticks which is based on TimestampScale; see timestamp-ticks. This element **SHOULD** be the first child element of the Cluster it belongs to, or the second if that Cluster contains a CRC-32 element (crc-32).
    pub timestamp: Timestamp,
    /// The Segment Position of the Cluster in the Segment (0 in live streams). It might help to resynchronise offset on damaged streams.
    pub position: Option<Position>,
    /// Size of the previous Cluster, in octets. Can be useful for backward playing.
    pub prev_size: Option<PrevSize>,
    /// The Block structures contained in this Cluster, either `SimpleBlock` or `BlockGroup`, in the order they appeared.
    pub blocks: Vec<crate::frame::ClusterBlock>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for Cluster {
    const ID: VInt64 = VInt64::from_encoded(0x1F43B675);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let crc32 = Option::<Crc32>::decode(buf).ok().flatten();
        let mut timestamp = None;
        let mut position = None;
        let mut prev_size = None;
        let mut blocks = Vec::new();
        let mut void: Option<Void> = None;
        let mut unknown = Vec::new();

        while let Ok(Some(header)) = Option::<Header>::decode(buf) {
            match header.id {
                Timestamp::ID => {
                    if timestamp.is_some() {
                        return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                    }
                    timestamp = Some(Timestamp::decode_element(&header, buf)?);
                }
                Position::ID => {
                    if position.is_some() {
                        return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                    }
                    position = Some(Position::decode_element(&header, buf)?);
                }
                PrevSize::ID => {
                    if prev_size.is_some() {
                        return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                    }
                    prev_size = Some(PrevSize::decode_element(&header, buf)?);
                }
                SimpleBlock::ID => {
                    blocks.push(crate::frame::ClusterBlock::Simple(SimpleBlock::decode_element(
                        &header, buf,
                    )?));
                }
                BlockGroup::ID => {
                    blocks.push(crate::frame::ClusterBlock::Group(BlockGroup::decode_element(
                        &header, buf,
                    )?));
                }
                Void::ID => {
                    let v = Void::decode_element(&header, buf)?;
                    if let Some(previous) = void {
                        void = Some(Void { size: previous.size + v.size });
                    } else {
                        void = Some(v);
                    }
                }
                _ => {
                    let size = *header.size as usize;
                    if buf.remaining() < size {
                        return Err(Error::OutOfBounds);
                    }
                    let body = buf.slice(size).to_vec();
                    buf.advance(size);
                    log::warn!("Unknown element {}({}b) in Element({}), preserving opaquely", header.id, size, Self::ID);
                    unknown.push(UnknownElement { id: header.id, body });
                }
            }
        }

        if buf.has_remaining() {
            return Err(Error::ShortRead);
        }

        Ok(Self {
            crc32,
            timestamp: timestamp.ok_or(Error::MissingElement(Timestamp::ID))?,
            position,
            prev_size,
            blocks,
            void,
            unknown,
        })
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        self.crc32.encode(buf)?;
        self.timestamp.encode(buf)?;
        self.position.encode(buf)?;
        self.prev_size.encode(buf)?;
        self.blocks.encode(buf)?;
        self.void.encode(buf)?;
        self.unknown.encode(buf)?;
        Ok(())
    }
}

/// Basic container of information containing a single Block and information specific to that Block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockGroup {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Block containing the actual data to be rendered and a timestamp relative to the Cluster Timestamp; see [basics](https://www.matroska.org/technical/basics.html#block-structure) on Block Structure.
    pub block: Block,
    /// Contain additional binary data to complete the main one; see Codec BlockAdditions section of [Matroska codec RFC](https://www.matroska.org/technical/codec_specs.html) for more information. An EBML parser that has no knowledge of the Block structure could still see and use/skip these data.
    pub block_additions: Option<BlockAdditions>,
    /// The duration of the Block, expressed in Track Ticks; see timestamp-ticks.
    pub block_duration: Option<BlockDuration>,
    /// This frame is referenced and has the specified cache priority. In cache only a frame of the same or higher priority can replace this frame. A value of 0 means the frame is not referenced.
    pub reference_priority: ReferencePriority,
    /// A timestamp value, relative to the timestamp of the Block in this BlockGroup, expressed in Track Ticks; see timestamp-ticks.
    pub reference_block: Vec<ReferenceBlock>,
    /// The new codec state to use. Data interpretation is private to the codec. This information **SHOULD** always be referenced by a seek entry.
    pub codec_state: Option<CodecState>,
    /// Duration of the silent data added to the Block, expressed in Matroska Ticks -- i.e., in nanoseconds; see timestamp-ticks (padding at the end of the Block for positive value, at the beginning of the Block for negative value).
    pub discard_padding: Option<DiscardPadding>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for BlockGroup {
    const ID: VInt64 = VInt64::from_encoded(0xA0);
    nested! {
      required: [ Block, ReferencePriority ],
      optional: [ BlockAdditions, BlockDuration, CodecState, DiscardPadding ],
      multiple: [ ReferenceBlock ],
    }
}
/// Contain additional binary data to complete the main one; see Codec BlockAdditions section of [Matroska codec RFC](https://www.matroska.org/technical/codec_specs.html) for more information. An EBML parser that has no knowledge of the Block structure could still see and use/skip these data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockAdditions {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contain the BlockAdditional and some parameters.
    pub block_more: Vec<BlockMore>,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for BlockAdditions {
    const ID: VInt64 = VInt64::from_encoded(0x75A1);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ BlockMore ],
    }
}

/// Contain the BlockAdditional and some parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockMore {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Interpreted by the codec as it wishes (using the BlockAddID).
    pub block_additional: BlockAdditional,
    /// An ID to identify how to interpret the BlockAdditional data; see Codec BlockAdditions section of [Matroska codec RFC](https://www.matroska.org/technical/codec_specs.html) for more information.
    pub block_add_id: BlockAddId,
    /// Elements not recognised while decoding, preserved verbatim.
    pub unknown: Vec<UnknownElement>,
}

impl Element for BlockMore {
    const ID: VInt64 = VInt64::from_encoded(0xA6);
    nested! {
      required: [ BlockAdditional, BlockAddId ],
      optional: [ ],
      multiple: [ ],
    }
}
