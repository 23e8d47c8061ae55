//! Inkframe Battle Model
//!
//! Defines the core data contracts shared by the extraction engine:
//! - **Frames:** Frame-indexed prediction payloads and ordered sequences
//! - **Predictions:** Notification, lamp, indicator and OCR payloads
//! - **Players:** Sides, rules, loadouts and the battle roster
//! - **Events:** The typed events produced per battle, with JSONL I/O
//! - **Bundle:** A directory of recorded upstream results
//!
//! Payloads are produced by external inference stages and are treated as
//! frozen, read-only input.

pub mod bundle;
pub mod event;
pub mod frame;
pub mod player;
pub mod prediction;

pub use bundle::*;
pub use event::*;
pub use frame::*;
pub use player::*;
pub use prediction::*;
