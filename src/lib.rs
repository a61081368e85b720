#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Error types for this crate.
mod error;
mod functional;
pub use error::*;

/// I/O utilities.
pub mod io;

/// base types for Matroska elements. ie. `VInt64`, `Header`, etc.
mod base;
/// The codec registry: opaque codec identifiers and Matroska `CodecID` strings.
pub mod codec;
/// Polymorphic byte-range handles used by the demuxers.
pub mod dataref;
/// FLV container demuxer.
pub mod flv;
mod frame;
/// Frame lacing and delacing for Block/SimpleBlock payloads.
mod lacer;
/// MP4/ISO-BMFF container demuxer.
pub mod mp4;
/// Leaf elements in Matroska.
mod leaf;
/// Master elements in Matroska.
mod master;
/// Matroska builder: assembles a Segment from demuxed sample streams.
pub mod mux;
/// Wires demuxers, the builder, and the subtitle producer into output files.
pub mod orchestrator;
/// Subtitle production: annotation/timed-text XML to SSA/ASS, standalone or embedded.
pub mod subtitle;
/// Supplementary elements in Matroska. Void elements, CRC-32, etc.
///
/// These elements are not from the Matroska specification, but Matroska specifications inherit them from EBML specifications.
mod supplement;
// Element body definitions and traits.
mod element;
/// A lazily-parsed view over a Matroska file, skipping Cluster bodies.
pub mod view;

pub use lacer::Lacer;

/// A prelude for common types and traits.
pub mod prelude {
    pub use crate::base::*;
    pub use crate::codec::{Codec, TrackKind};
    pub use crate::dataref::DataRef;
    pub use crate::element::*;
    pub use crate::frame::*;
    pub use crate::lacer::Lacer;
    pub use crate::leaf::*;
    pub use crate::master::*;
    pub use crate::mp4::{MovieBox, Mp4Reader, Track};
    pub use crate::mux::{MatroskaBuilder, TrackMeta, TrackSettings};
    pub use crate::subtitle::Document as SubtitleDocument;
    pub use crate::supplement::*;
}
