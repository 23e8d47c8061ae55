//! Analyzer configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{InkframeError, InkframeResult};

/// Global analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Frame rate of the analyzed recording.
    pub frame_rate: u32,

    /// Debounce budgets, confidence floors and similarity thresholds.
    pub thresholds: EventThresholds,

    /// Per-rule hysteresis for count monitors.
    pub count_epsilon: CountEpsilon,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Tunables for every event creator.
///
/// Exit budgets are counted in evaluated frames of the upstream sequence,
/// not in video frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventThresholds {
    pub kill_exit_frames: usize,
    /// Kill notifications below this detection confidence are not read.
    pub kill_min_confidence: f32,
    /// Trailing text of a kill notification after the victim name.
    pub kill_suffix: String,
    pub kill_suffix_min_ratio: f64,

    pub death_exit_frames: usize,
    pub death_min_frames: usize,
    pub death_notification_exit_frames: usize,
    /// A death reason line ending with one of these particles is trimmed.
    pub death_reason_particles: Vec<char>,
    /// Chars removed from the end of such a line.
    pub death_reason_trim_chars: usize,
    pub death_reason_min_ratio: f64,
    /// Label of the rainmaker shot, matched as a death reason.
    pub hoko_shot_label: String,

    pub drop_exit_frames: usize,
    /// A disconnect needs more than this many `drop` frames.
    pub drop_min_frames: usize,
    /// Frames before a disconnect in which death lamps are not trusted.
    pub drop_false_range: u64,

    pub special_exit_frames: usize,
    /// Minimum consecutive `sp` frames before re-inspection is skipped.
    pub special_min_frames: usize,

    pub open_exit_frames: usize,
    pub open_min_plates: usize,
    /// Window after the opening used to count players.
    pub player_count_window_secs: f64,

    pub end_exit_frames: usize,
    /// An ending frame shows more than this many battle-end notifications.
    pub end_min_notifications: usize,

    pub result_exit_frames: usize,

    pub count_exit_frames: usize,
    pub balance_exit_frames: usize,

    /// Acceptance ratio for the majority player of a name set.
    pub likely_player_ratio: f64,
    /// Acceptance ratio for a single name sample.
    pub sample_player_ratio: f64,
}

/// Hysteresis epsilon per battle rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountEpsilon {
    pub area: u32,
    pub hoko: u32,
    pub yagura: u32,
    pub asari: u32,
    pub nawabari: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "inkframe_event_core=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Level for the event creators, overriding `level` for them only.
    pub creator_level: Option<String>,

    /// Append logs to this file instead of stdout.
    pub file: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            thresholds: EventThresholds::default(),
            count_epsilon: CountEpsilon::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EventThresholds {
    fn default() -> Self {
        Self {
            kill_exit_frames: 5,
            kill_min_confidence: 0.8,
            kill_suffix: "をたおした。".to_string(),
            kill_suffix_min_ratio: 0.5,
            death_exit_frames: 2,
            death_min_frames: 2,
            death_notification_exit_frames: 30,
            death_reason_particles: vec!['で', 'て'],
            death_reason_trim_chars: 2,
            death_reason_min_ratio: 0.3,
            hoko_shot_label: "ホコショット".to_string(),
            drop_exit_frames: 30,
            drop_min_frames: 10,
            drop_false_range: 30,
            special_exit_frames: 5,
            special_min_frames: 2,
            open_exit_frames: 30,
            open_min_plates: 2,
            player_count_window_secs: 60.0,
            end_exit_frames: 30,
            end_min_notifications: 10,
            result_exit_frames: 30,
            count_exit_frames: 1,
            balance_exit_frames: 1,
            likely_player_ratio: 0.3,
            sample_player_ratio: 0.2,
        }
    }
}

impl Default for CountEpsilon {
    fn default() -> Self {
        Self {
            area: 10,
            hoko: 10,
            yagura: 10,
            asari: 80,
            nawabari: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            creator_level: None,
            file: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load config from `path`, falling back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_strict(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Load config from `path`, failing on a missing or malformed file.
    pub fn load_strict(path: impl AsRef<Path>) -> InkframeResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InkframeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| InkframeError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Reject values the segment logic cannot work with.
    pub fn validate(&self) -> InkframeResult<()> {
        if self.frame_rate == 0 {
            return Err(InkframeError::config("frame_rate must be positive"));
        }
        let t = &self.thresholds;
        let budgets = [
            ("kill_exit_frames", t.kill_exit_frames),
            ("death_exit_frames", t.death_exit_frames),
            ("death_notification_exit_frames", t.death_notification_exit_frames),
            ("drop_exit_frames", t.drop_exit_frames),
            ("special_exit_frames", t.special_exit_frames),
            ("open_exit_frames", t.open_exit_frames),
            ("end_exit_frames", t.end_exit_frames),
            ("result_exit_frames", t.result_exit_frames),
            ("count_exit_frames", t.count_exit_frames),
            ("balance_exit_frames", t.balance_exit_frames),
        ];
        if let Some((name, _)) = budgets.iter().find(|(_, budget)| *budget == 0) {
            return Err(InkframeError::config(format!("{name} must be positive")));
        }
        if t.special_min_frames == 0 {
            return Err(InkframeError::config("special_min_frames must be positive"));
        }
        Ok(())
    }
}
