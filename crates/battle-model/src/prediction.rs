//! Upstream prediction payloads.
//!
//! These are the per-frame outputs of the detection, tracking and OCR
//! stages. Boxes are in pixel coordinates of the source video frame.

use serde::{Deserialize, Serialize};

use crate::player::{Rule, Side, WinLose};

/// Axis-aligned box `[x1, y1, x2, y2]` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl From<[i32; 4]> for BBox {
    fn from(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn center_x(&self) -> f64 {
        (self.x1 + self.x2) as f64 / 2.0
    }

    /// Number of pixel rows shared with `other` (0 when disjoint).
    pub fn vertical_overlap(&self, other: &BBox) -> i32 {
        (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0)
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Class of an on-screen notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// "<victim> was splatted" banner.
    Kill,
    /// Death screen line naming the weapon that killed the main player.
    DeathReason,
    /// Death screen gear of the killer.
    PlayerGear,
    /// Name plate.
    PlayerPlate,
    InkInsufficient,
    RuleNawabari,
    RuleArea,
    RuleYagura,
    RuleHoko,
    RuleAsari,
    RuleTricolor,
    BattleStart,
    BattleEnd,
    SpFullCharge,
    InkRefill,
}

impl NotificationKind {
    /// The battle rule announced by this notification, if any.
    ///
    /// Tricolor battles have no count rule and map to `None`.
    pub fn rule(&self) -> Option<Rule> {
        match self {
            NotificationKind::RuleNawabari => Some(Rule::Nawabari),
            NotificationKind::RuleArea => Some(Rule::Area),
            NotificationKind::RuleYagura => Some(Rule::Yagura),
            NotificationKind::RuleHoko => Some(Rule::Hoko),
            NotificationKind::RuleAsari => Some(Rule::Asari),
            _ => None,
        }
    }
}

/// One detected notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub bbox: BBox,
    pub confidence: f32,

    /// Tracker identifier; stable only while the tracker follows the box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u32>,
}

impl Notification {
    pub fn new(kind: NotificationKind, bbox: BBox, confidence: f32) -> Self {
        Self {
            kind,
            bbox,
            confidence,
            track_id: None,
        }
    }

    pub fn with_track(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }
}

/// All notifications detected on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationFrame {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl NotificationFrame {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self { notifications }
    }

    pub fn of_kind(&self, kind: NotificationKind) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(move |n| n.kind == kind)
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.of_kind(kind).count()
    }

    /// First notification announcing a count rule.
    pub fn rule_notification(&self) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.kind.rule().is_some())
    }
}

// ---------------------------------------------------------------------------
// Lamps
// ---------------------------------------------------------------------------

/// Status of one player lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LampState {
    Live,
    Death,
    /// Special weapon fully charged.
    Sp,
    /// Player disconnected.
    Drop,
}

impl LampState {
    /// Whether the player is on the field.
    pub fn is_alive(&self) -> bool {
        matches!(self, LampState::Live | LampState::Sp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lamp {
    pub state: LampState,
    #[serde(default)]
    pub confidence: f32,
}

impl Lamp {
    pub fn new(state: LampState) -> Self {
        Self {
            state,
            confidence: 1.0,
        }
    }
}

/// Lamp rows of both sides on one frame. A side is `None` when its row
/// was not detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LampFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<Lamp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy: Option<Vec<Lamp>>,
}

impl LampFrame {
    /// Build a frame from lamp states, one slice per side.
    pub fn from_states(team: Option<&[LampState]>, enemy: Option<&[LampState]>) -> Self {
        let row = |states: &[LampState]| states.iter().copied().map(Lamp::new).collect();
        Self {
            team: team.map(row),
            enemy: enemy.map(row),
        }
    }

    pub fn side(&self, side: Side) -> Option<&[Lamp]> {
        match side {
            Side::Team => self.team.as_deref(),
            Side::Enemy => self.enemy.as_deref(),
            Side::NoSide => None,
        }
    }

    pub fn lamp(&self, side: Side, lamp_ord: usize) -> Option<&Lamp> {
        self.side(side).and_then(|row| row.get(lamp_ord))
    }

    /// Players in `live` or `sp` state.
    pub fn alive_count(&self, side: Side) -> Option<usize> {
        self.side(side)
            .map(|row| row.iter().filter(|l| l.state.is_alive()).count())
    }

    /// Players not in `drop` state.
    pub fn present_count(&self, side: Side) -> Option<usize> {
        self.side(side)
            .map(|row| row.iter().filter(|l| l.state != LampState::Drop).count())
    }
}

// ---------------------------------------------------------------------------
// Battle indicator
// ---------------------------------------------------------------------------

/// Rule-specific count indicator at the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleIndicator {
    Area {
        #[serde(default)]
        team_count: Option<u32>,
        #[serde(default)]
        enemy_count: Option<u32>,
    },
    Yagura {
        #[serde(default)]
        team_count: Option<u32>,
        #[serde(default)]
        enemy_count: Option<u32>,
    },
    Hoko {
        #[serde(default)]
        team_count: Option<u32>,
        #[serde(default)]
        enemy_count: Option<u32>,
    },
    Asari {
        #[serde(default)]
        team_count: Option<u32>,
        #[serde(default)]
        enemy_count: Option<u32>,
    },
    /// Turf war shows the team's paint points only.
    Nawabari {
        #[serde(default)]
        paint_point: Option<u32>,
    },
}

impl RuleIndicator {
    pub fn rule(&self) -> Rule {
        match self {
            RuleIndicator::Area { .. } => Rule::Area,
            RuleIndicator::Yagura { .. } => Rule::Yagura,
            RuleIndicator::Hoko { .. } => Rule::Hoko,
            RuleIndicator::Asari { .. } => Rule::Asari,
            RuleIndicator::Nawabari { .. } => Rule::Nawabari,
        }
    }

    /// Count shown for `side`, if readable.
    pub fn count(&self, side: Side) -> Option<u32> {
        match (self, side) {
            (
                RuleIndicator::Area { team_count, .. }
                | RuleIndicator::Yagura { team_count, .. }
                | RuleIndicator::Hoko { team_count, .. }
                | RuleIndicator::Asari { team_count, .. },
                Side::Team,
            ) => *team_count,
            (
                RuleIndicator::Area { enemy_count, .. }
                | RuleIndicator::Yagura { enemy_count, .. }
                | RuleIndicator::Hoko { enemy_count, .. }
                | RuleIndicator::Asari { enemy_count, .. },
                Side::Enemy,
            ) => *enemy_count,
            (RuleIndicator::Nawabari { paint_point }, Side::Team) => *paint_point,
            _ => None,
        }
    }
}

/// Layout widgets of the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorWidgets {
    /// Occupancy bar spanning both teams.
    pub occupancy: BBox,
    /// "Lead" label, placed over the leading team's half.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_label: Option<BBox>,
}

/// Count box on the result screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultCount {
    pub bbox: BBox,
    #[serde(default)]
    pub is_percent: bool,
    #[serde(default)]
    pub is_knockout: bool,
}

/// Result screen overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_count: Option<ResultCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy_count: Option<ResultCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_lose: Option<WinLose>,
}

impl ResultOverlay {
    pub fn count(&self, side: Side) -> Option<&ResultCount> {
        match side {
            Side::Team => self.team_count.as_ref(),
            Side::Enemy => self.enemy_count.as_ref(),
            Side::NoSide => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct IndicatorFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<RuleIndicator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widgets: Option<IndicatorWidgets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultOverlay>,
}

// ---------------------------------------------------------------------------
// OCR
// ---------------------------------------------------------------------------

/// One character recognized by OCR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecognizedChar {
    pub value: char,
    pub bbox: BBox,
    #[serde(default)]
    pub confidence: f32,
}

impl RecognizedChar {
    pub fn new(value: char, bbox: BBox) -> Self {
        Self {
            value,
            bbox,
            confidence: 1.0,
        }
    }
}

/// Concatenate recognized characters into a string.
pub fn chars_to_string(chars: &[RecognizedChar]) -> String {
    chars.iter().map(|c| c.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_serializes_as_array() {
        let b = BBox::new(1, 2, 11, 22);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1,2,11,22]");
        assert_eq!(b.width(), 10);
        assert_eq!(b.height(), 20);
        assert!((b.center_x() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_overlap() {
        let a = BBox::new(0, 0, 10, 10);
        assert_eq!(a.vertical_overlap(&BBox::new(20, 5, 30, 15)), 5);
        assert_eq!(a.vertical_overlap(&BBox::new(0, 12, 10, 20)), 0);
    }

    #[test]
    fn test_rule_notification_skips_tricolor() {
        let frame = NotificationFrame::new(vec![
            Notification::new(NotificationKind::RuleTricolor, BBox::default(), 0.9),
            Notification::new(NotificationKind::PlayerPlate, BBox::default(), 0.9),
            Notification::new(NotificationKind::RuleHoko, BBox::default(), 0.9),
        ]);
        let n = frame.rule_notification().unwrap();
        assert_eq!(n.kind.rule(), Some(Rule::Hoko));
        assert_eq!(frame.count(NotificationKind::PlayerPlate), 1);
    }

    #[test]
    fn test_lamp_counts() {
        use LampState::*;
        let frame = LampFrame::from_states(Some(&[Live, Sp, Death, Drop]), None);
        assert_eq!(frame.alive_count(Side::Team), Some(2));
        assert_eq!(frame.present_count(Side::Team), Some(3));
        assert_eq!(frame.alive_count(Side::Enemy), None);
        assert_eq!(frame.lamp(Side::Team, 2).map(|l| l.state), Some(Death));
        assert!(frame.lamp(Side::Team, 4).is_none());
    }

    #[test]
    fn test_indicator_count_by_side() {
        let raw = r#"{ "indicator": { "rule": "yagura", "team_count": 72 } }"#;
        let frame: IndicatorFrame = serde_json::from_str(raw).unwrap();
        let ind = frame.indicator.unwrap();
        assert_eq!(ind.rule(), Rule::Yagura);
        assert_eq!(ind.count(Side::Team), Some(72));
        assert_eq!(ind.count(Side::Enemy), None);

        let nawabari = RuleIndicator::Nawabari {
            paint_point: Some(640),
        };
        assert_eq!(nawabari.count(Side::Team), Some(640));
        assert_eq!(nawabari.count(Side::Enemy), None);
    }

    #[test]
    fn test_chars_to_string() {
        let chars = vec![
            RecognizedChar::new('F', BBox::default()),
            RecognizedChar::new('o', BBox::default()),
        ];
        assert_eq!(chars_to_string(&chars), "Fo");
    }
}
