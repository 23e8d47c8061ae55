//! Death events from lamp transitions, enriched for the main player with
//! what the death screen says about the killer.

use std::sync::Arc;

use inkframe_battle_model::{
    chars_to_string, DeathEvent, DeathReasonType, Frame, FrameIndex, FrameSeq, LampFrame,
    LampState, Notification, NotificationFrame, NotificationKind, Player, Roster, Side,
};
use inkframe_common::{EventThresholds, FrameSpan, InkframeResult};

use super::{frames_in, required, EventCreator};
use crate::collaborators::{OcrFont, RegionOcr};
use crate::consensus::{likely_text, likely_value};
use crate::identity::{IdentityCorrelator, NameSample};
use crate::monitor::{DeathMonitor, LampStatePredicate};
use crate::segment::{segments, Verdict};
use crate::similarity::ratio;

/// What the death screen showed for one death of the main player.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathNotification {
    pub kill_player: Player,
    pub death_reason: String,
    pub reason_type: DeathReasonType,
    pub span: FrameSpan,
}

/// Emits a death event per player lamp going dark.
pub struct DeathEventCreator {
    roster: Arc<Roster>,
    ocr: Arc<dyn RegionOcr>,
    thresholds: EventThresholds,
    window: Option<FrameSpan>,
    notifications: Option<Arc<FrameSeq<NotificationFrame>>>,
    lamps: Option<Arc<FrameSeq<LampFrame>>>,
}

impl DeathEventCreator {
    pub fn new(roster: Arc<Roster>, ocr: Arc<dyn RegionOcr>, thresholds: EventThresholds) -> Self {
        Self {
            roster,
            ocr,
            thresholds,
            window: None,
            notifications: None,
            lamps: None,
        }
    }

    /// Restrict death detection to the battle window. Disconnects are
    /// still searched for over every lamp frame.
    pub fn with_window(mut self, window: FrameSpan) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_notifications(mut self, notifications: Arc<FrameSeq<NotificationFrame>>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_lamps(mut self, lamps: Arc<FrameSeq<LampFrame>>) -> Self {
        self.lamps = Some(lamps);
        self
    }

    /// First frame of the player's disconnect, if any.
    fn find_drop(&self, lamps: &FrameSeq<LampFrame>, player: &Player) -> Option<FrameIndex> {
        let dropped = LampStatePredicate::new(player.side, player.lamp_ord, LampState::Drop);
        segments(lamps.frames(), dropped, self.thresholds.drop_exit_frames, 1)
            .find(|seg| seg.len() > self.thresholds.drop_min_frames)
            .map(|seg| seg.first_frame())
    }

    /// Death notifications of the main player.
    pub fn death_notifications(
        &self,
        notifications: &FrameSeq<NotificationFrame>,
    ) -> Vec<DeathNotification> {
        let is_death_screen = |frame: &Frame<NotificationFrame>, _: bool| {
            let payload = &frame.payload;
            if payload.count(NotificationKind::DeathReason) == 1
                && payload.count(NotificationKind::PlayerPlate) == 1
                && payload.count(NotificationKind::PlayerGear) == 1
            {
                Verdict::Target
            } else {
                Verdict::NotTarget
            }
        };

        let correlator = IdentityCorrelator::new(&self.roster, Side::Enemy);
        let mut found = Vec::new();
        for segment in segments(
            notifications.frames(),
            is_death_screen,
            self.thresholds.death_notification_exit_frames,
            1,
        ) {
            let mut reasons = Vec::new();
            let mut killer_names = Vec::new();
            for frame in segment.frames {
                let (Some(reason), Some(plate)) = (
                    single(&frame.payload, NotificationKind::DeathReason),
                    single(&frame.payload, NotificationKind::PlayerPlate),
                ) else {
                    continue;
                };
                if let Some(text) = self.read_reason(frame.index, reason) {
                    reasons.push(text);
                }
                if let Some(name) = self.read_plate_name(frame.index, plate) {
                    let sample = NameSample::new(name, frame.index);
                    killer_names.push(match plate.track_id {
                        Some(track) => sample.with_track(track),
                        None => sample,
                    });
                }
            }

            let reason_text = likely_text(&reasons);
            let groups = correlator.resolve_groups(&killer_names, self.thresholds.likely_player_ratio);
            let killer = likely_value(groups.iter().map(|g| g.player.map(|p| p.lamp_ord)))
                .and_then(|ord| self.roster.player(Side::Enemy, ord));
            let Some(killer) = killer else {
                tracing::debug!(start = segment.first_frame(), "Death screen without a resolvable killer");
                continue;
            };

            let span = FrameSpan::new(segment.first_frame(), segment.last_frame());
            if let Some(notification) = self.classify(&reason_text, killer, span) {
                found.push(notification);
            }
        }
        found
    }

    /// Second-to-last line of the reason box, without a trailing particle.
    fn read_reason(&self, frame: FrameIndex, reason: &Notification) -> Option<String> {
        let lines = match self.ocr.recognize_lines(frame, &reason.bbox, OcrFont::Text) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(frame, error = %e, "Death reason unreadable");
                return None;
            }
        };
        let lines: Vec<_> = lines.into_iter().filter(|l| l.len() >= 4).collect();
        if lines.len() < 2 {
            return None;
        }

        let mut text: Vec<char> = lines[lines.len() - 2].iter().map(|c| c.value).collect();
        if text
            .last()
            .is_some_and(|c| self.thresholds.death_reason_particles.contains(c))
        {
            let keep = text.len().saturating_sub(self.thresholds.death_reason_trim_chars);
            text.truncate(keep);
        }
        let text: String = text.into_iter().collect();
        (!text.is_empty()).then_some(text)
    }

    /// Longest line on the killer's name plate.
    fn read_plate_name(&self, frame: FrameIndex, plate: &Notification) -> Option<String> {
        match self.ocr.recognize_lines(frame, &plate.bbox, OcrFont::Text) {
            Ok(lines) => lines
                .iter()
                .max_by_key(|l| l.len())
                .map(|l| chars_to_string(l))
                .filter(|name| !name.is_empty()),
            Err(e) => {
                tracing::debug!(frame, error = %e, "Killer plate unreadable");
                None
            }
        }
    }

    /// Match the reason text against the killer's weapons.
    fn classify(&self, reason_text: &str, killer: &Player, span: FrameSpan) -> Option<DeathNotification> {
        let Some(loadout) = killer.loadout.as_ref() else {
            tracing::debug!(killer = %killer.name, "Killer has no known loadout");
            return None;
        };

        let id_or_label = |id: &str, label: &str| {
            if id.is_empty() {
                label.to_string()
            } else {
                id.to_string()
            }
        };
        let candidates = [
            (
                loadout.main_label.as_str(),
                DeathReasonType::MainWeapon,
                id_or_label(&loadout.main_id, &loadout.main_label),
            ),
            (
                loadout.sub_label.as_str(),
                DeathReasonType::SubWeapon,
                id_or_label(&loadout.sub_id, &loadout.sub_label),
            ),
            (
                loadout.special_label.as_str(),
                DeathReasonType::SpWeapon,
                id_or_label(&loadout.special_id, &loadout.special_label),
            ),
            (
                self.thresholds.hoko_shot_label.as_str(),
                DeathReasonType::HokoShoot,
                "hoko_shoot".to_string(),
            ),
        ];

        let mut best: Option<(f64, &(&str, DeathReasonType, String))> = None;
        for candidate in &candidates {
            let score = ratio(reason_text, candidate.0);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, candidate));
            }
        }

        let (reason_type, death_reason) = match best {
            Some((score, (_, kind, id))) if score > self.thresholds.death_reason_min_ratio => {
                (*kind, id.clone())
            }
            _ => (DeathReasonType::Other, reason_text.to_string()),
        };

        Some(DeathNotification {
            kill_player: killer.clone(),
            death_reason,
            reason_type,
            span,
        })
    }

    fn make_event(&self, player: &Player, span: FrameSpan, notifications: &[DeathNotification]) -> DeathEvent {
        let is_main = player.side == Side::Team && self.roster.main_player_ord == Some(player.lamp_ord);
        let matched = is_main
            .then(|| notifications.iter().find(|n| n.span.overlaps(&span)))
            .flatten();

        match matched {
            Some(n) => DeathEvent {
                death_player: player.clone(),
                kill_player: Some(n.kill_player.clone()),
                death_reason: n.death_reason.clone(),
                reason_type: n.reason_type,
                start_frame: span.start,
                end_frame: span.end,
            },
            None => DeathEvent {
                death_player: player.clone(),
                kill_player: None,
                death_reason: String::new(),
                reason_type: DeathReasonType::Unknown,
                start_frame: span.start,
                end_frame: span.end,
            },
        }
    }
}

fn single(frame: &NotificationFrame, kind: NotificationKind) -> Option<&Notification> {
    let mut matching = frame.of_kind(kind);
    let first = matching.next()?;
    matching.next().is_none().then_some(first)
}

impl EventCreator for DeathEventCreator {
    type Output = Vec<DeathEvent>;

    fn name(&self) -> &'static str {
        "death"
    }

    fn run(&self) -> InkframeResult<Vec<DeathEvent>> {
        let notifications = required(&self.notifications, self.name(), "notifications")?;
        let lamps = required(&self.lamps, self.name(), "lamp detections")?;

        let death_notifications = self.death_notifications(notifications);
        tracing::debug!(count = death_notifications.len(), "Death notifications found");

        let frames = frames_in(lamps, self.window);
        let mut events = Vec::new();
        for player in self.roster.all() {
            let drop_start = self.find_drop(lamps, player);
            if let Some(drop_start) = drop_start {
                tracing::info!(player = %player.name, drop_start, "Player disconnected");
            }

            let monitor = DeathMonitor::new(player.side, player.lamp_ord)
                .with_drop(drop_start, self.thresholds.drop_false_range);
            for segment in segments(frames, monitor, self.thresholds.death_exit_frames, 1) {
                if segment.len() < self.thresholds.death_min_frames {
                    continue;
                }
                let span = FrameSpan::new(segment.first_frame(), segment.last_frame());
                events.push(self.make_event(player, span, &death_notifications));
            }
        }

        tracing::info!(events = events.len(), "Death events created");
        Ok(events)
    }
}
