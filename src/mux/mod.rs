//! Matroska muxer: assembles an EBML Header plus a Segment (Info, Tracks,
//! Cues, Clusters) from one or more demuxed sample streams.
//!
//! Grounded on `original_source/mcio_matroska.py`'s `MatroskaBuilder` for the
//! basics -- cluster allocation (`TLEN_CLUSTER`/`TOFF_CLUSTER`) and
//! `TrackEntry` assembly (`_build_track`) are ported directly. The original
//! never builds a Cues index, never laces frames, never emits a `BlockGroup`,
//! and never merges tracks by timecode -- it appends each track's blocks to
//! its own clusters in one pass, track by track. Those five pieces are built
//! fresh here against this crate's own EBML type system
//! ([`crate::master`], [`crate::leaf`], [`crate::lacer`]), following the
//! layout `Segment`'s own [`crate::master::Segment`] `nested!` declaration
//! prescribes (`Info`, `Tracks`, `Cues`, then `Cluster*`).

pub mod timecode;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::Write;

use rand::RngCore;

use crate::base::{Header, VInt64};
use crate::codec::TrackKind;
use crate::dataref::DataRef;
use crate::element::Element;
use crate::frame::ClusterBlock;
use crate::functional::Encode;
use crate::lacer::Lacer;
use crate::leaf::*;
use crate::master::*;
use crate::{Error, Result};

pub use timecode::tcs_from_secdiv;

const TRACKTYPE_VIDEO: u64 = 0x01;
const TRACKTYPE_AUDIO: u64 = 0x02;
/// Matroska's `TrackType` value for subtitle tracks, for callers building
/// `TrackSettings::None` subtitle entries. This crate's demuxers never
/// produce subtitle samples themselves (§4.6 synthesizes them separately),
/// but the constant is kept alongside its video/audio siblings for symmetry
/// with the original's `TRACKTYPE_*` trio.
pub const TRACKTYPE_SUB: u64 = 0x11;

fn track_type_value(kind: TrackKind) -> u64 {
    match kind {
        TrackKind::Video => TRACKTYPE_VIDEO,
        TrackKind::Audio => TRACKTYPE_AUDIO,
        TrackKind::Subtitle => TRACKTYPE_SUB,
    }
}

/// The cluster-relative timestamp range a block can express (`i16`).
const TLEN_CLUSTER: u64 = 1 << 16;
/// Clusters are allocated centered on their timestamp slot, matching the
/// original's `TOFF_CLUSTER` -- this keeps the common case of small negative
/// relative timestamps (slightly-reordered samples) within `i16` range too.
const TOFF_CLUSTER: u64 = 1 << 15;
/// Cap on how many frames a single lace may fold together.
const MAX_LACED_FRAMES: usize = 32;

/// Per-track settings that accompany a `TrackEntry`'s `Video`/`Audio` sub-element.
pub enum TrackSettings {
    /// Video track: pixel dimensions.
    Video {
        /// Width of the encoded frames, in pixels.
        width: u16,
        /// Height of the encoded frames, in pixels.
        height: u16,
    },
    /// Audio track: sampling frequency and channel count.
    Audio {
        /// Sampling frequency in Hz.
        sample_rate: f64,
        /// Channel count.
        channels: u8,
    },
    /// No settings sub-element (e.g. a subtitle track).
    None,
}

/// Track-level metadata that isn't tied to a particular codec/kind: display
/// name, language (already translated to ISO-639-2, see
/// [`crate::subtitle::to_iso_639_2`]), the default-track flag, and whether
/// this track should appear in the Cues index. Defaults to `flag_default:
/// true`, matching every track the original builder itself constructs (which
/// never sets `FlagDefault`, leaving its element-default of `1`); subtitle
/// tracks explicitly override it to `false` per `spec.md` §4.6.
/// `cue_eligible: None` defers to `add_track`'s own default (video tracks
/// are cued, audio and subtitle tracks are not), matching the end-to-end
/// scenario of a single `CuePoint` at time 0 pointing at the video track.
pub struct TrackMeta {
    /// Track display name.
    pub name: Option<String>,
    /// ISO-639-2 language code.
    pub language: Option<String>,
    /// Whether this is the default track for its kind.
    pub flag_default: bool,
    /// Whether this track's keyframes should be indexed in the Segment's
    /// Cues. `None` defers to the kind-based default (video only).
    pub cue_eligible: Option<bool>,
}

impl Default for TrackMeta {
    fn default() -> Self {
        TrackMeta { name: None, language: None, flag_default: true, cue_eligible: None }
    }
}

/// The three historical-compatibility knobs `spec.md` §9 calls out, carried
/// as constructor parameters (not globals) so a caller can opt a file out of
/// them. `Default` picks the most-compatible setting for all three, matching
/// what a player built against an older/pickier Matroska implementation
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatFlags {
    /// Align the very first cluster's base timecode to its first frame
    /// instead of offsetting it by `TOFF_CLUSTER`, so the first cluster
    /// never needs negative relative timecodes.
    pub align_first_cluster_base: bool,
    /// Cap cluster duration at roughly 5 seconds of Segment Ticks instead of
    /// the full `i16` relative-timecode range.
    pub cluster_duration_cap: bool,
    /// Disable lacing on every track that isn't audio, working around
    /// players that mishandle laced video/subtitle blocks.
    pub lacing_bug_compat: bool,
}

impl Default for CompatFlags {
    fn default() -> Self {
        CompatFlags { align_first_cluster_base: true, cluster_duration_cap: true, lacing_bug_compat: true }
    }
}

/// A track registered with [`MatroskaBuilder::add_track`] but not yet
/// assigned to clusters -- that only happens once every track is known, so
/// frames from all tracks can be merged by absolute timecode.
struct PendingTrack {
    track_number: u64,
    kind: TrackKind,
    cue_eligible: bool,
    samples: Vec<(u64, DataRef, bool)>,
}

/// One resolved Cues entry, carrying its target cluster by index until
/// `write_to_file`'s second pass knows that cluster's Segment-relative
/// byte offset.
struct CueSpec {
    time: u64,
    track_number: u64,
    cluster_idx: usize,
    block_number: u64,
}

/// Incrementally assembles a Matroska `Segment` from one or more demuxed tracks.
///
/// Construct once per output file with [`MatroskaBuilder::new`], call
/// [`MatroskaBuilder::add_track`] once per input track, then
/// [`MatroskaBuilder::write_to_file`].
pub struct MatroskaBuilder {
    info: Info,
    tracks: Tracks,
    compat: CompatFlags,
    pending: Vec<PendingTrack>,
}

impl MatroskaBuilder {
    /// `tcs` is the Matroska `TimestampScale` (nanoseconds per tick) every
    /// track added to this builder has already been rescaled into; see
    /// [`tcs_from_secdiv`]. `date_utc_unix_secs` is stamped onto the Segment's
    /// `DateUTC` -- the original defaults this to `time.time()` when absent,
    /// but every caller in this crate has a concrete capture/retrieval
    /// timestamp on hand, so this port always takes one explicitly.
    pub fn new(write_app: &str, tcs: u64, date_utc_unix_secs: f64, compat: CompatFlags) -> Self {
        let mut uid = [0u8; 16];
        rand::rng().fill_bytes(&mut uid);

        let info = Info {
            segment_uuid: Some(SegmentUuid(uid.to_vec())),
            timestamp_scale: TimestampScale(tcs),
            date_utc: Some(DateUtc::from_unix_seconds(date_utc_unix_secs)),
            muxing_app: MuxingApp(Self::muxapp().to_string()),
            writing_app: WritingApp(write_app.to_string()),
            ..Default::default()
        };

        MatroskaBuilder { info, tracks: Tracks::default(), compat, pending: Vec::new() }
    }

    fn muxapp() -> &'static str {
        "mkremux pre-versioning-version"
    }

    /// The Matroska `TimestampScale` (nanoseconds per tick) this builder was
    /// constructed with; callers adding further tracks after construction
    /// (e.g. embedding a subtitle track) rescale into this value.
    pub fn timestamp_scale(&self) -> u64 {
        *self.info.timestamp_scale
    }

    fn lacing_allowed_for(&self, kind: TrackKind) -> bool {
        !self.compat.lacing_bug_compat || kind == TrackKind::Audio
    }

    fn build_track(&mut self, kind: TrackKind, codec_id: &str, codec_init_data: Option<Vec<u8>>, settings: TrackSettings, meta: &TrackMeta) -> u64 {
        let track_num = self.tracks.track_entry.len() as u64 + 1;

        let (video, audio) = match settings {
            TrackSettings::Video { width, height } => (
                Some(Video {
                    pixel_width: PixelWidth(width as u64),
                    pixel_height: PixelHeight(height as u64),
                    ..Default::default()
                }),
                None,
            ),
            TrackSettings::Audio { sample_rate, channels } => (
                None,
                Some(Audio {
                    sampling_frequency: SamplingFrequency(sample_rate),
                    channels: Channels(channels as u64),
                    ..Default::default()
                }),
            ),
            TrackSettings::None => (None, None),
        };

        let entry = TrackEntry {
            track_number: TrackNumber(track_num),
            track_uid: TrackUid(track_num),
            track_type: TrackType(track_type_value(kind)),
            flag_default: FlagDefault(meta.flag_default as u64),
            flag_lacing: FlagLacing(self.lacing_allowed_for(kind) as u64),
            codec_id: CodecId(codec_id.to_string()),
            codec_private: codec_init_data.map(CodecPrivate),
            name: meta.name.clone().map(Name),
            language: meta.language.clone().map(Language).unwrap_or_default(),
            video,
            audio,
            ..Default::default()
        };

        self.tracks.track_entry.push(entry);
        track_num
    }

    /// Registers a track and its demuxed samples. `samples` is the
    /// `(timestamp, data, is_keyframe)` triples a demuxer's sample-table walk
    /// produces, already rescaled into this builder's shared `TimestampScale`
    /// (the `time_mult` argument threaded through
    /// `Track::get_sample_data`/`FlvReader`'s equivalent). The `TrackEntry` is
    /// built immediately; the samples themselves are only assigned to
    /// clusters and blocks once every track is known, so
    /// [`MatroskaBuilder::write_to_file`] can merge all tracks' frames by
    /// absolute timecode before packing clusters.
    pub fn add_track(
        &mut self,
        samples: Vec<(u64, DataRef, bool)>,
        kind: TrackKind,
        codec_id: &str,
        codec_init_data: Option<Vec<u8>>,
        settings: TrackSettings,
        meta: TrackMeta,
    ) -> Result<()> {
        let cue_eligible = meta.cue_eligible.unwrap_or(kind == TrackKind::Video);
        let track_number = self.build_track(kind, codec_id, codec_init_data, settings, &meta);
        self.pending.push(PendingTrack { track_number, kind, cue_eligible, samples });
        Ok(())
    }

    /// Returns the `(track index, sample index)` pairs of every pending
    /// track's samples, merged into one ascending-timecode order with ties
    /// broken by the smaller track number -- `spec.md` §4.3's cluster
    /// packer. A k-way merge over the (already materialized) per-track
    /// sample lists, seeded with each track's first sample and popping the
    /// smallest `(timecode, track_number)` each step.
    fn merge_order(tracks: &[PendingTrack]) -> Vec<(usize, usize)> {
        let mut heap = BinaryHeap::new();
        let mut next = vec![0usize; tracks.len()];
        for (ti, t) in tracks.iter().enumerate() {
            if let Some((tc, _, _)) = t.samples.first() {
                heap.push(Reverse((*tc, t.track_number, ti)));
            }
        }

        let mut order = Vec::new();
        while let Some(Reverse((_, _, ti))) = heap.pop() {
            let si = next[ti];
            order.push((ti, si));
            next[ti] += 1;
            if let Some((tc, _, _)) = tracks[ti].samples.get(next[ti]) {
                heap.push(Reverse((*tc, tracks[ti].track_number, ti)));
            }
        }
        order
    }

    /// The gap, in ticks, between sample `idx` and the one after it on the
    /// same track, or `None` if `idx` is the track's last sample.
    fn sample_gap(samples: &[(u64, DataRef, bool)], idx: usize) -> Option<u64> {
        samples.get(idx + 1).map(|(next, _, _)| next - samples[idx].0)
    }

    fn cluster_length(&self) -> u64 {
        if self.compat.cluster_duration_cap {
            let tcs = (*self.info.timestamp_scale).max(1);
            (5_000_000_000u64 / tcs).clamp(1, TLEN_CLUSTER)
        } else {
            TLEN_CLUSTER
        }
    }

    /// Walks the merged frame order, folding eligible runs into laced
    /// blocks, choosing `SimpleBlock` vs `BlockGroup` per `spec.md` §4.3's
    /// "Block vs BlockGroup" rule, packing clusters (capped at
    /// `cluster_length`/`TOFF_CLUSTER`-offset base timecodes), and recording
    /// one `CueSpec` per keyframe of a cue-eligible track.
    fn assemble(&self) -> Result<(Vec<Cluster>, Vec<CueSpec>)> {
        let order = Self::merge_order(&self.pending);
        let cluster_len = self.cluster_length();

        let mut clusters: Vec<Cluster> = Vec::new();
        // Each cluster's acceptance window, `[defining frame's time, + cluster_len
        // - 1]` -- kept alongside `clusters` rather than re-derived from a
        // cluster's `tb`, since `align_first_cluster_base` makes the first
        // cluster's `tb` equal to its defining frame's own time instead of
        // `t + TOFF_CLUSTER`, and re-deriving `[tb - TOFF_CLUSTER, ..]` from
        // that would shift the window off of the frame that opened it.
        let mut windows: Vec<(i64, i64)> = Vec::new();
        let mut cues: Vec<CueSpec> = Vec::new();

        let mut i = 0;
        while i < order.len() {
            let (ti, si) = order[i];
            let track = &self.pending[ti];
            let (t, _, is_kf) = track.samples[si];

            let fits_current = windows.last().is_some_and(|&(lower, upper)| (t as i64) >= lower && (t as i64) <= upper);
            if !fits_current {
                let tb = if clusters.is_empty() && self.compat.align_first_cluster_base { t } else { t + TOFF_CLUSTER };
                clusters.push(Cluster { timestamp: Timestamp(tb), ..Default::default() });
                windows.push((t as i64, t as i64 + cluster_len as i64 - 1));
            }

            let cluster_idx = clusters.len() - 1;
            let cluster_upper = windows[cluster_idx].1;

            // Extend the run while frames stay on this track, immediately
            // follow in both the merged order and the track's own sample
            // list, share a keyframe status, share the same inter-frame gap
            // as the run's first pair, and still fall within this cluster
            // (a lace's sub-frame timecodes are implicit, so every member
            // must land in the same cluster as the block's own timecode).
            let mut run_len = 1usize;
            if self.lacing_allowed_for(track.kind) {
                if let Some(gap) = Self::sample_gap(&track.samples, si) {
                    let mut j = i + 1;
                    while run_len < MAX_LACED_FRAMES && j < order.len() {
                        let (tj, sj) = order[j];
                        if tj != ti || sj != si + run_len {
                            break;
                        }
                        if track.samples[sj].2 != is_kf {
                            break;
                        }
                        if Self::sample_gap(&track.samples, sj - 1) != Some(gap) {
                            break;
                        }
                        if track.samples[sj].0 as i64 > cluster_upper {
                            break;
                        }
                        run_len += 1;
                        j += 1;
                    }
                }
            }

            let tb = *clusters[cluster_idx].timestamp;
            let rel: i16 = i64::try_from(t)
                .ok()
                .and_then(|t| i64::try_from(tb).ok().map(|base| t - base))
                .and_then(|rel| i16::try_from(rel).ok())
                .ok_or_else(|| Error::OutputInvariant(format!("timestamp {t} falls outside its cluster's range")))?;

            let mut payloads: Vec<Vec<u8>> = Vec::with_capacity(run_len);
            for k in 0..run_len {
                payloads.push(track.samples[si + k].1.get_data()?);
            }

            let (lace_bits, payload) = if run_len == 1 {
                (0u8, payloads.into_iter().next().expect("run_len == 1"))
            } else {
                let refs: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
                let fixed_size = refs.windows(2).all(|w| w[0].len() == w[1].len());
                if fixed_size {
                    (0x04u8, Lacer::FixedSize.lace(&refs))
                } else {
                    let xiph = Lacer::Xiph.lace(&refs);
                    let ebml = Lacer::Ebml.lace(&refs);
                    if ebml.len() < xiph.len() {
                        (0x06u8, ebml)
                    } else {
                        (0x02u8, xiph)
                    }
                }
            };

            let has_back_reference = si > 0;
            let use_simple = is_kf || !has_back_reference;

            if use_simple {
                let mut body = Vec::with_capacity(payload.len() + 8);
                VInt64::new(track.track_number).encode(&mut body)?;
                rel.encode(&mut body)?;
                let flags: u8 = lace_bits | if is_kf { 0x80 } else { 0 };
                flags.encode(&mut body)?;
                body.extend_from_slice(&payload);
                clusters[cluster_idx].blocks.push(ClusterBlock::Simple(SimpleBlock(body)));
            } else {
                let mut body = Vec::with_capacity(payload.len() + 8);
                VInt64::new(track.track_number).encode(&mut body)?;
                rel.encode(&mut body)?;
                lace_bits.encode(&mut body)?;
                body.extend_from_slice(&payload);

                let prev_t = track.samples[si - 1].0;
                let reference_block = vec![ReferenceBlock(prev_t as i64 - t as i64)];
                let block_duration = track.samples.get(si + run_len).map(|(next_t, _, _)| BlockDuration(next_t - t));

                clusters[cluster_idx].blocks.push(ClusterBlock::Group(BlockGroup {
                    block: Block(body),
                    reference_priority: ReferencePriority(0),
                    reference_block,
                    block_duration,
                    ..Default::default()
                }));
            }

            if is_kf && track.cue_eligible {
                cues.push(CueSpec {
                    time: t,
                    track_number: track.track_number,
                    cluster_idx,
                    block_number: clusters[cluster_idx].blocks.len() as u64,
                });
            }

            i += run_len;
        }

        Ok((clusters, cues))
    }

    /// Builds the final `Cues` element bytes, resolving each `CueClusterPosition`
    /// to its target cluster's Segment-relative byte offset.
    ///
    /// Cues sits directly after Tracks and before the first Cluster (see
    /// `Segment`'s field order), but a cluster's own offset isn't known until
    /// Cues itself has been sized -- so this writes a placeholder Cues with
    /// worst-case (`u64::MAX`) positions first, measures it, computes every
    /// cluster's offset assuming that placeholder length, re-encodes Cues
    /// with the real offsets, and pads the (guaranteed non-negative)
    /// difference back in as a `Void` so the reserved span doesn't move.
    fn resolve_cues(cues: &[CueSpec], cues_offset: u64, cluster_bytes: &[Vec<u8>]) -> Result<Option<Vec<u8>>> {
        if cues.is_empty() {
            return Ok(None);
        }

        let build_points = |offsets: &[u64]| -> Vec<CuePoint> {
            cues.iter()
                .map(|c| CuePoint {
                    cue_time: CueTime(c.time),
                    cue_track_positions: vec![CueTrackPositions {
                        cue_track: CueTrack(c.track_number),
                        cue_cluster_position: CueClusterPosition(offsets[c.cluster_idx]),
                        cue_block_number: Some(CueBlockNumber(c.block_number)),
                        ..Default::default()
                    }],
                    ..Default::default()
                })
                .collect()
        };

        let worst_case_offsets = vec![u64::MAX; cluster_bytes.len()];
        let placeholder = Cues { cue_point: build_points(&worst_case_offsets), void: Some(crate::supplement::Void { size: 2 }), ..Default::default() };
        let mut placeholder_buf = Vec::new();
        placeholder.encode(&mut placeholder_buf)?;
        let placeholder_len = placeholder_buf.len() as u64;

        let mut cluster_offsets = Vec::with_capacity(cluster_bytes.len());
        let mut offset = cues_offset + placeholder_len;
        for cb in cluster_bytes {
            cluster_offsets.push(offset);
            offset += cb.len() as u64;
        }

        let resolved = Cues { cue_point: build_points(&cluster_offsets), void: None, ..Default::default() };
        let mut resolved_buf = Vec::new();
        resolved.encode(&mut resolved_buf)?;

        let remaining = placeholder_len
            .checked_sub(resolved_buf.len() as u64)
            .ok_or_else(|| Error::OutputInvariant("resolved Cues grew past its reserved placeholder size".to_string()))?;
        let padded = Cues { void: Some(crate::supplement::Void::new_by_size(remaining)?), ..resolved };
        let mut final_buf = Vec::new();
        padded.encode(&mut final_buf)?;

        if final_buf.len() as u64 != placeholder_len {
            return Err(Error::OutputInvariant("resolved Cues did not reoccupy its reserved size".to_string()));
        }

        Ok(Some(final_buf))
    }

    /// Writes the EBML Header followed by the Segment (Info, Tracks, Cues, Clusters).
    pub fn write_to_file<W: Write>(&self, w: &mut W) -> Result<()> {
        let header = Ebml {
            doc_type: Some(DocType("matroska".to_string())),
            doc_type_version: Some(DocTypeVersion(2)),
            ..Default::default()
        };

        let (clusters, cues) = self.assemble()?;

        let mut info_bytes = Vec::new();
        self.info.encode(&mut info_bytes)?;

        let mut tracks_bytes = Vec::new();
        self.tracks.encode(&mut tracks_bytes)?;

        let cluster_bytes: Vec<Vec<u8>> = clusters
            .iter()
            .map(|c| {
                let mut b = Vec::new();
                c.encode(&mut b)?;
                Ok::<_, Error>(b)
            })
            .collect::<Result<_>>()?;

        let cues_offset = info_bytes.len() as u64 + tracks_bytes.len() as u64;
        let cues_bytes = Self::resolve_cues(&cues, cues_offset, &cluster_bytes)?;

        let mut body = Vec::new();
        body.extend_from_slice(&info_bytes);
        body.extend_from_slice(&tracks_bytes);
        if let Some(cues_bytes) = &cues_bytes {
            body.extend_from_slice(cues_bytes);
        }
        for cb in &cluster_bytes {
            body.extend_from_slice(cb);
        }

        let segment_header = Header { id: Segment::ID, size: VInt64::new(body.len() as u64) };

        let mut buf = Vec::new();
        header.encode(&mut buf)?;
        segment_header.encode(&mut buf)?;
        buf.extend_from_slice(&body);
        w.write_all(&buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::Decode;

    fn view_of(mb: &MatroskaBuilder) -> crate::view::MatroskaView {
        let mut out = Vec::new();
        mb.write_to_file(&mut out).unwrap();
        let mut cursor = std::io::Cursor::new(out);
        crate::view::MatroskaView::new(&mut cursor).unwrap()
    }

    #[test]
    fn single_video_track_roundtrips_through_encode() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        let samples = vec![
            (0u64, DataRef::from_owned(vec![1, 2, 3]), true),
            (40u64, DataRef::from_owned(vec![4, 5, 6]), false),
        ];
        mb.add_track(
            samples,
            TrackKind::Video,
            "V_MPEG4/ISO/AVC",
            Some(vec![0xAA]),
            TrackSettings::Video { width: 1920, height: 1080 },
            TrackMeta::default(),
        )
        .unwrap();

        assert_eq!(mb.tracks.track_entry.len(), 1);

        let mut out = Vec::new();
        mb.write_to_file(&mut out).unwrap();
        assert!(!out.is_empty());

        let view = view_of(&mb);
        assert_eq!(view.segments[0].tracks.as_ref().unwrap().track_entry.len(), 1);
        assert!(view.segments[0].cues.is_some());
        assert_eq!(view.segments[0].cues.as_ref().unwrap().cue_point.len(), 1);
    }

    #[test]
    fn samples_spanning_multiple_clusters_allocate_sequentially() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        let samples = vec![(0u64, DataRef::from_owned(vec![0u8]), true), (TLEN_CLUSTER + 5, DataRef::from_owned(vec![1u8]), true)];
        mb.add_track(samples, TrackKind::Audio, "A_AAC", None, TrackSettings::Audio { sample_rate: 44_100.0, channels: 2 }, TrackMeta::default())
            .unwrap();

        let (clusters, _) = mb.assemble().unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].blocks.len(), 1);
        assert_eq!(clusters[1].blocks.len(), 1);
    }

    #[test]
    fn track_numbers_increment_per_track() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        mb.add_track(vec![], TrackKind::Video, "V_MPEG4/ISO/AVC", None, TrackSettings::Video { width: 640, height: 480 }, TrackMeta::default()).unwrap();
        mb.add_track(vec![], TrackKind::Audio, "A_AAC", None, TrackSettings::Audio { sample_rate: 48_000.0, channels: 2 }, TrackMeta::default())
            .unwrap();

        assert_eq!(*mb.tracks.track_entry[0].track_number, 1);
        assert_eq!(*mb.tracks.track_entry[1].track_number, 2);
    }

    #[test]
    fn track_meta_sets_name_language_and_default_flag() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        let meta = TrackMeta { name: Some("English".to_string()), language: Some("eng".to_string()), flag_default: false, cue_eligible: None };
        mb.add_track(vec![], TrackKind::Subtitle, "S_TEXT/ASS", None, TrackSettings::None, meta).unwrap();

        let entry = &mb.tracks.track_entry[0];
        assert_eq!(entry.name, Some(Name("English".to_string())));
        assert_eq!(*entry.language, "eng");
        assert_eq!(*entry.flag_default, 0);
    }

    #[test]
    fn keyframe_and_non_keyframe_video_frames_produce_one_cue_each() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        let samples = vec![
            (0u64, DataRef::from_owned(vec![1]), true),
            (10u64, DataRef::from_owned(vec![2]), false),
            (20u64, DataRef::from_owned(vec![3]), true),
        ];
        mb.add_track(samples, TrackKind::Video, "V_MPEG4/ISO/AVC", None, TrackSettings::Video { width: 64, height: 64 }, TrackMeta::default())
            .unwrap();

        let (clusters, cues) = mb.assemble().unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].time, 0);
        assert_eq!(cues[1].time, 20);
        // The middle frame has a back-reference and isn't a keyframe, so it
        // must be carried as a BlockGroup, not a SimpleBlock.
        assert!(matches!(clusters[0].blocks[1], ClusterBlock::Group(_)));
    }

    #[test]
    fn three_consecutive_equal_gap_audio_frames_lace_into_one_block() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        let samples = vec![
            (0u64, DataRef::from_owned(vec![1, 1]), true),
            (20u64, DataRef::from_owned(vec![2, 2]), true),
            (40u64, DataRef::from_owned(vec![3, 3]), true),
        ];
        mb.add_track(samples, TrackKind::Audio, "A_AAC", None, TrackSettings::Audio { sample_rate: 44_100.0, channels: 2 }, TrackMeta::default())
            .unwrap();

        let (clusters, _) = mb.assemble().unwrap();
        assert_eq!(clusters[0].blocks.len(), 1);
        assert!(matches!(clusters[0].blocks[0], ClusterBlock::Simple(_)));
    }

    #[test]
    fn audio_track_is_not_cued_by_default() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        mb.add_track(
            vec![(0u64, DataRef::from_owned(vec![1]), true)],
            TrackKind::Audio,
            "A_AAC",
            None,
            TrackSettings::Audio { sample_rate: 44_100.0, channels: 2 },
            TrackMeta::default(),
        )
        .unwrap();

        let (_, cues) = mb.assemble().unwrap();
        assert!(cues.is_empty());
    }

    #[test]
    fn frames_from_two_tracks_interleave_by_timecode_within_a_cluster() {
        let mut mb = MatroskaBuilder::new("mkremux test", 1_000_000, 1_700_000_000.0, CompatFlags::default());
        mb.add_track(
            vec![(0u64, DataRef::from_owned(vec![1]), true), (20u64, DataRef::from_owned(vec![2]), true)],
            TrackKind::Video,
            "V_MPEG4/ISO/AVC",
            None,
            TrackSettings::Video { width: 64, height: 64 },
            TrackMeta::default(),
        )
        .unwrap();
        mb.add_track(
            vec![(10u64, DataRef::from_owned(vec![9]), true)],
            TrackKind::Audio,
            "A_AAC",
            None,
            TrackSettings::Audio { sample_rate: 44_100.0, channels: 2 },
            TrackMeta::default(),
        )
        .unwrap();

        let (clusters, _) = mb.assemble().unwrap();
        assert_eq!(clusters[0].blocks.len(), 3);
        // Video(0), Audio(10), Video(20): ordered by absolute timecode even
        // though the whole audio track was registered after the video track.
        let track_number_of = |b: &ClusterBlock| match b {
            ClusterBlock::Simple(sb) => VInt64::decode(&mut &sb.0[..]).unwrap().value,
            ClusterBlock::Group(bg) => VInt64::decode(&mut &bg.block.0[..]).unwrap().value,
        };
        assert_eq!(track_number_of(&clusters[0].blocks[0]), 1);
        assert_eq!(track_number_of(&clusters[0].blocks[1]), 2);
        assert_eq!(track_number_of(&clusters[0].blocks[2]), 1);
    }
}
