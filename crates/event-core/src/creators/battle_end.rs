//! Battle end: the finish banner, detected as a burst of end notifications.

use std::sync::Arc;

use inkframe_battle_model::{BattleEndEvent, Frame, FrameSeq, NotificationFrame, NotificationKind};
use inkframe_common::{EventThresholds, InkframeResult};

use super::{required, EventCreator};
use crate::segment::{find_segment, Verdict};

/// Finds the first burst of finish notifications.
pub struct BattleEndEventCreator {
    thresholds: EventThresholds,
    notifications: Option<Arc<FrameSeq<NotificationFrame>>>,
}

impl BattleEndEventCreator {
    pub fn new(thresholds: EventThresholds) -> Self {
        Self {
            thresholds,
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, notifications: Arc<FrameSeq<NotificationFrame>>) -> Self {
        self.notifications = Some(notifications);
        self
    }
}

impl EventCreator for BattleEndEventCreator {
    type Output = Option<BattleEndEvent>;

    fn name(&self) -> &'static str {
        "battle_end"
    }

    fn run(&self) -> InkframeResult<Option<BattleEndEvent>> {
        let notifications = required(&self.notifications, self.name(), "notifications")?;
        let min = self.thresholds.end_min_notifications;

        let mut is_end = |frame: &Frame<NotificationFrame>, _: bool| {
            if frame.payload.count(NotificationKind::BattleEnd) > min {
                Verdict::Target
            } else {
                Verdict::NotTarget
            }
        };

        let frames = notifications.frames();
        let event = find_segment(frames, &mut is_end, self.thresholds.end_exit_frames, 1).map(
            |(start, end)| BattleEndEvent {
                start_frame: frames[start].index,
                end_frame: frames[end].index,
            },
        );

        match &event {
            Some(e) => tracing::info!(start = e.start_frame, end = e.end_frame, "Battle end found"),
            None => tracing::info!("No battle end found"),
        }
        Ok(event)
    }
}
