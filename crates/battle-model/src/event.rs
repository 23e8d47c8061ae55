//! Battle event types.
//!
//! Events are written as JSONL, one tagged object per line, optionally
//! preceded by a `#`-prefixed header line. Every event carries the video
//! frame range over which it was observed.

use serde::{Deserialize, Serialize};

use crate::frame::FrameIndex;
use crate::player::{Player, Rule, Side, WinLose};

/// The battle started: rule announcement and name plates on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOpenEvent {
    pub rule: Rule,
    /// Players present on each side shortly after the opening.
    #[serde(default)]
    pub team_count: Option<usize>,
    #[serde(default)]
    pub enemy_count: Option<usize>,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

/// The battle-end banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEndEvent {
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResultEvent {
    pub win_lose: WinLose,
    /// Final count or percentage; knockouts read as 100.
    #[serde(default)]
    pub team_count: Option<f64>,
    #[serde(default)]
    pub enemy_count: Option<f64>,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

/// A span during which one side's count stayed put.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEvent {
    /// Count held during the span.
    pub count: u32,
    /// Progress made by `side` so far.
    pub earned_value: u32,
    pub side: Side,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    /// Killer, when known. Kill banners are shown only for the main player.
    #[serde(default)]
    pub kill_player: Option<Player>,
    pub death_player: Player,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

/// What the death screen says the player was splatted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathReasonType {
    MainWeapon,
    SubWeapon,
    SpWeapon,
    HokoShoot,
    Other,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub death_player: Player,
    #[serde(default)]
    pub kill_player: Option<Player>,
    #[serde(default)]
    pub death_reason: String,
    pub reason_type: DeathReasonType,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialWeaponEventKind {
    FullyCharged,
    Triggered,
    /// The charge was lost to a death before use.
    Spoiled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialWeaponEvent {
    pub kind: SpecialWeaponEventKind,
    pub player: Player,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceState {
    Even,
    Advantage,
    Disadvantage,
}

impl BalanceState {
    pub fn from_numbers(team: usize, enemy: usize) -> Self {
        match team.cmp(&enemy) {
            std::cmp::Ordering::Greater => BalanceState::Advantage,
            std::cmp::Ordering::Less => BalanceState::Disadvantage,
            std::cmp::Ordering::Equal => BalanceState::Even,
        }
    }
}

/// A span during which the number of players on the field held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerNumberBalanceEvent {
    pub team_number: usize,
    pub enemy_number: usize,
    pub balance_state: BalanceState,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

/// Discriminated union of every event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    BattleOpen(BattleOpenEvent),
    BattleEnd(BattleEndEvent),
    BattleResult(BattleResultEvent),
    Count(CountEvent),
    Kill(KillEvent),
    Death(DeathEvent),
    SpecialWeapon(SpecialWeaponEvent),
    PlayerNumberBalance(PlayerNumberBalanceEvent),
}

impl BattleEvent {
    pub fn start_frame(&self) -> FrameIndex {
        self.span().0
    }

    pub fn end_frame(&self) -> FrameIndex {
        self.span().1
    }

    fn span(&self) -> (FrameIndex, FrameIndex) {
        match self {
            BattleEvent::BattleOpen(e) => (e.start_frame, e.end_frame),
            BattleEvent::BattleEnd(e) => (e.start_frame, e.end_frame),
            BattleEvent::BattleResult(e) => (e.start_frame, e.end_frame),
            BattleEvent::Count(e) => (e.start_frame, e.end_frame),
            BattleEvent::Kill(e) => (e.start_frame, e.end_frame),
            BattleEvent::Death(e) => (e.start_frame, e.end_frame),
            BattleEvent::SpecialWeapon(e) => (e.start_frame, e.end_frame),
            BattleEvent::PlayerNumberBalance(e) => (e.start_frame, e.end_frame),
        }
    }

    /// Short name used in logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            BattleEvent::BattleOpen(_) => "battle_open",
            BattleEvent::BattleEnd(_) => "battle_end",
            BattleEvent::BattleResult(_) => "battle_result",
            BattleEvent::Count(_) => "count",
            BattleEvent::Kill(_) => "kill",
            BattleEvent::Death(_) => "death",
            BattleEvent::SpecialWeapon(_) => "special_weapon",
            BattleEvent::PlayerNumberBalance(_) => "player_number_balance",
        }
    }
}

/// Metadata written as the first line of an event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time of the analysis run (ISO 8601).
    pub generated_at: String,

    /// Frame rate of the analyzed recording.
    pub frame_rate: u32,

    pub event_count: usize,
}

/// Current event log schema version.
pub const EVENT_SCHEMA_VERSION: &str = "1.0";

/// Parse events from JSONL content (one JSON object per line).
pub fn parse_events(jsonl: &str) -> Result<Vec<BattleEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[BattleEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}

/// Serialize events to JSONL with a leading `# {header}` line.
pub fn serialize_event_log(
    header: &EventLogHeader,
    events: &[BattleEvent],
) -> Result<String, serde_json::Error> {
    let mut output = format!("# {}\n", serde_json::to_string(header)?);
    output.push_str(&serialize_events(events)?);
    Ok(output)
}
