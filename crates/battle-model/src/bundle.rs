//! Recorded upstream results for one battle, stored as a directory.
//!
//! Layout:
//! ```text
//! battle/
//!   roster.json          (required)
//!   notifications.json   (required)
//!   lamps.json
//!   indicators.json
//!   ocr.json             recorded OCR readings, replayed by the analyzer
//!   lamps_dense.json     dense lamp detections used for re-inspection
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::frame::{FrameIndex, FrameSeq};
use crate::player::Roster;
use crate::prediction::{BBox, IndicatorFrame, LampFrame, NotificationFrame, RecognizedChar};

pub const ROSTER_FILE: &str = "roster.json";
pub const NOTIFICATIONS_FILE: &str = "notifications.json";
pub const LAMPS_FILE: &str = "lamps.json";
pub const INDICATORS_FILE: &str = "indicators.json";
pub const OCR_FILE: &str = "ocr.json";
pub const DENSE_LAMPS_FILE: &str = "lamps_dense.json";

/// One recorded OCR reading of a frame region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrRecord {
    pub frame: FrameIndex,
    pub bbox: BBox,
    pub chars: Vec<RecognizedChar>,
}

/// All upstream results of one battle loaded from disk.
#[derive(Debug, Clone)]
pub struct BattleBundle {
    pub root: PathBuf,
    pub roster: Roster,
    pub notifications: FrameSeq<NotificationFrame>,
    pub lamps: Option<FrameSeq<LampFrame>>,
    pub indicators: Option<FrameSeq<IndicatorFrame>>,
    pub ocr: Vec<OcrRecord>,
    pub dense_lamps: Option<FrameSeq<LampFrame>>,
}

impl BattleBundle {
    /// Load a bundle from its directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ModelError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ModelError::ValidationError {
                message: format!("{} is not a directory", root.display()),
            });
        }

        let roster: Roster = read_json(&root.join(ROSTER_FILE))?;
        let notifications = read_json(&root.join(NOTIFICATIONS_FILE))?;
        let lamps = read_optional_json(&root.join(LAMPS_FILE))?;
        let indicators = read_optional_json(&root.join(INDICATORS_FILE))?;
        let ocr = read_optional_json(&root.join(OCR_FILE))?.unwrap_or_default();
        let dense_lamps = read_optional_json(&root.join(DENSE_LAMPS_FILE))?;

        let bundle = Self {
            root,
            roster: roster.normalized(),
            notifications,
            lamps,
            indicators,
            ocr,
            dense_lamps,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check ordering invariants of every sequence.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_ordered(NOTIFICATIONS_FILE, &self.notifications)?;
        if let Some(lamps) = &self.lamps {
            check_ordered(LAMPS_FILE, lamps)?;
        }
        if let Some(indicators) = &self.indicators {
            check_ordered(INDICATORS_FILE, indicators)?;
        }
        if let Some(dense) = &self.dense_lamps {
            check_ordered(DENSE_LAMPS_FILE, dense)?;
        }
        if self.roster.is_empty() {
            return Err(ModelError::ValidationError {
                message: "roster has no players".to_string(),
            });
        }
        Ok(())
    }

    /// Frame range covered by the notification stream.
    pub fn frame_range(&self) -> Option<(FrameIndex, FrameIndex)> {
        Some((
            self.notifications.first_index()?,
            self.notifications.last_index()?,
        ))
    }
}

fn check_ordered<T>(name: &str, seq: &FrameSeq<T>) -> Result<(), ModelError> {
    if let Some(pair) = seq.frames().windows(2).find(|w| w[0].index >= w[1].index) {
        return Err(ModelError::ValidationError {
            message: format!(
                "{name}: frame indices must be strictly increasing ({} then {})",
                pair[0].index, pair[1].index
            ),
        });
    }
    Ok(())
}

/// Read and parse one JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ModelError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ModelError> {
    if path.exists() {
        read_json(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Errors raised while loading model files.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid battle bundle: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const ROSTER: &str = r#"{ "team": [ { "name": "Alpha", "lamp_ord": 0 } ], "enemy": [] }"#;

    #[test]
    fn test_load_minimal_bundle() {
        let dir = temp_dir("inkframe_test_bundle_minimal");
        write(&dir, ROSTER_FILE, ROSTER);
        write(
            &dir,
            NOTIFICATIONS_FILE,
            r#"{ "interval": 2, "frames": [ { "frame": 0 }, { "frame": 2, "notifications": [] } ] }"#,
        );

        let bundle = BattleBundle::load(&dir).unwrap();
        assert_eq!(bundle.notifications.len(), 2);
        assert!(bundle.lamps.is_none());
        assert!(bundle.ocr.is_empty());
        assert_eq!(bundle.frame_range(), Some((0, 2)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_roster_is_io_error() {
        let dir = temp_dir("inkframe_test_bundle_no_roster");
        let err = BattleBundle::load(&dir).unwrap_err();
        assert!(matches!(err, ModelError::IoError { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unordered_frames_rejected() {
        let dir = temp_dir("inkframe_test_bundle_unordered");
        write(&dir, ROSTER_FILE, ROSTER);
        write(
            &dir,
            NOTIFICATIONS_FILE,
            r#"{ "frames": [ { "frame": 4 }, { "frame": 4 } ] }"#,
        );
        let err = BattleBundle::load(&dir).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
