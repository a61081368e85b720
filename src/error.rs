use crate::base::VInt64;

/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid variable-length integer encoding, incidicates a vint longer than 8 bytes.
    #[error("Invalid variable-length integer encoding, 8 leading zeros found...")]
    InvalidVInt,

    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read past the end of the buffer")]
    OutOfBounds,

    /// Attempted to read past the end of the buffer during element body decoding.
    #[error("Element body over decode, ID: {0}")]
    OverDecode(VInt64),

    /// Not all bytes were consumed in a element body
    #[error("Short read: not all bytes were consumed")]
    ShortRead,

    /// Not all bytes were consumed in a element body during element body decoding.
    #[error("Element body under decode, ID: {0}")]
    UnderDecode(VInt64),

    /// Missing element.
    #[error("Missing element, ID: {0}")]
    MissingElement(VInt64),

    /// Duplicate element in a master element.
    #[error("Duplicate element {id} in master element {parent}")]
    DuplicateElement {
        /// The duplicate element ID.
        id: VInt64,
        /// The parent master element ID.
        parent: VInt64,
    },

    /// Element body size is unknown.
    #[error("Element body size is unknown, ID: {0}")]
    ElementBodySizeUnknown(VInt64),

    /// Malformed lacing data.
    #[error("Malformed lacing data")]
    MalformedLacingData,

    /// FLV container-parse error.
    #[error("FLV error: {0}")]
    Flv(#[from] crate::flv::Error),

    /// MP4/ISO-BMFF container-parse error.
    #[error("MP4 error: {0}")]
    Mp4(#[from] crate::mp4::Error),

    /// Subtitle production error (malformed annotation or timed-text XML).
    #[error("subtitle error: {0}")]
    Subtitle(#[from] crate::subtitle::Error),

    /// A codec has no Matroska encapsulation, or isn't valid for the track kind it was found on.
    #[error("codec {codec} cannot be encapsulated on a {track_type} track")]
    CodecEncapsulation {
        /// The codec with no available encapsulation.
        codec: crate::codec::Codec,
        /// The track kind it was found on.
        track_type: crate::codec::TrackKind,
    },

    /// The builder produced output that violates one of its own invariants
    /// (e.g. a reserved Cues size was exceeded, or a written size didn't match
    /// what was reserved). Unrecoverable: never caught and retried.
    #[error("output invariant violated: {0}")]
    OutputInvariant(String),

    /// A resumed download's overlap with the previously-downloaded tail didn't match.
    #[error("resume mismatch at offset {offset}")]
    ResumeMismatch {
        /// The byte offset at which the mismatch was detected.
        offset: u64,
    },

    /// Opaque upstream-refused-delivery error, surfaced unchanged from the
    /// (out-of-scope) network retrieval layer.
    #[error("retrieval failed: {0}")]
    Retrieval(String),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
