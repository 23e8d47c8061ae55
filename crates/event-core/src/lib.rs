//! Inkframe Event Core
//!
//! Turns per-frame detection results of a recorded battle into events:
//! - **Segments:** debounce noisy per-frame verdicts into contiguous runs
//! - **Monitors:** stateful predicates for counts, balance, deaths and lamp states
//! - **Identity:** correlate OCR'd names across frames and tracker IDs with the roster
//! - **Creators:** one worker per event kind, joined by the battle pipeline
//!
//! Frame decoding and recognition stay behind the traits in
//! [`collaborators`]; everything else is pure computation over data.

pub mod collaborators;
pub mod consensus;
pub mod creators;
pub mod identity;
pub mod monitor;
pub mod pipeline;
pub mod segment;
pub mod similarity;

pub use collaborators::{
    LampInspector, NoReinspection, OcrFont, RecordedLampInspector, RecordedOcr, RegionOcr,
};
pub use creators::{CreatorTask, EventCreator};
pub use identity::{IdentityCorrelator, NameSample};
pub use pipeline::{BattleAnalyzer, BattleReport};
pub use segment::{find_segment, segments, FramePredicate, Segment, SegmentStream, Verdict};
