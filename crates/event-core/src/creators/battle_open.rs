//! Battle open: the rule announcement shown over the players' name plates.

use std::sync::Arc;

use inkframe_battle_model::{
    BattleOpenEvent, Frame, FrameSeq, LampFrame, NotificationFrame, NotificationKind, Rule, Side,
};
use inkframe_common::{EventThresholds, FrameClock, InkframeResult};

use super::{required, EventCreator};
use crate::consensus::likely_value;
use crate::segment::{segments, Verdict};

/// Finds the rule announcement and the player counts shown with it.
pub struct BattleOpenEventCreator {
    thresholds: EventThresholds,
    clock: FrameClock,
    notifications: Option<Arc<FrameSeq<NotificationFrame>>>,
    lamps: Option<Arc<FrameSeq<LampFrame>>>,
}

impl BattleOpenEventCreator {
    pub fn new(thresholds: EventThresholds, frame_rate: u32) -> Self {
        Self {
            thresholds,
            clock: FrameClock::new(frame_rate),
            notifications: None,
            lamps: None,
        }
    }

    pub fn with_notifications(mut self, notifications: Arc<FrameSeq<NotificationFrame>>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Lamp results used to count players after the opening. Without them
    /// the event carries no counts.
    pub fn with_lamps(mut self, lamps: Arc<FrameSeq<LampFrame>>) -> Self {
        self.lamps = Some(lamps);
        self
    }

    fn count_players(&self, lamps: &FrameSeq<LampFrame>, from: u64) -> (Option<usize>, Option<usize>) {
        let until = from + self.clock.secs_to_frames(self.thresholds.player_count_window_secs);
        let window = lamps.window(from, until);
        let count = |side: Side| likely_value(window.iter().map(|f| f.payload.present_count(side)));
        (count(Side::Team), count(Side::Enemy))
    }
}

fn majority_rule(frames: &[Frame<NotificationFrame>]) -> Option<Rule> {
    likely_value(
        frames
            .iter()
            .map(|f| f.payload.rule_notification().and_then(|n| n.kind.rule())),
    )
}

impl EventCreator for BattleOpenEventCreator {
    type Output = Option<BattleOpenEvent>;

    fn name(&self) -> &'static str {
        "battle_open"
    }

    fn run(&self) -> InkframeResult<Option<BattleOpenEvent>> {
        let notifications = required(&self.notifications, self.name(), "notifications")?;
        let min_plates = self.thresholds.open_min_plates;

        let is_opening = |frame: &Frame<NotificationFrame>, _: bool| {
            let payload = &frame.payload;
            if payload.rule_notification().is_some()
                && payload.count(NotificationKind::PlayerPlate) >= min_plates
            {
                Verdict::Target
            } else {
                Verdict::NotTarget
            }
        };

        for segment in segments(
            notifications.frames(),
            is_opening,
            self.thresholds.open_exit_frames,
            1,
        ) {
            let Some(rule) = majority_rule(segment.frames) else {
                continue;
            };
            let (start_frame, end_frame) = (segment.first_frame(), segment.last_frame());

            let (team_count, enemy_count) = match self.lamps.as_deref() {
                Some(lamps) => match self.count_players(lamps, end_frame) {
                    (Some(team), Some(enemy)) => (Some(team), Some(enemy)),
                    _ => {
                        tracing::debug!(start_frame, end_frame, "Opening skipped: player counts unresolved");
                        continue;
                    }
                },
                None => (None, None),
            };

            tracing::info!(
                ?rule,
                start = %self.clock.timecode(start_frame),
                team_count,
                enemy_count,
                "Battle open found"
            );
            return Ok(Some(BattleOpenEvent {
                rule,
                team_count,
                enemy_count,
                start_frame,
                end_frame,
            }));
        }

        tracing::info!("No battle open found");
        Ok(None)
    }
}
