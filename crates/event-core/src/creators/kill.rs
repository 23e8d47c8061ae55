//! Kill events: "<victim> was splatted" banners shown to the main player.

use std::sync::Arc;

use inkframe_battle_model::{
    chars_to_string, Frame, FrameIndex, FrameSeq, KillEvent, LampFrame, LampState, Notification,
    NotificationFrame, NotificationKind, Player, Roster, Side,
};
use inkframe_common::{EventThresholds, InkframeResult};

use super::{required, EventCreator};
use crate::collaborators::{OcrFont, RegionOcr};
use crate::identity::{IdentityCorrelator, NameSample};
use crate::segment::{segments, Verdict};
use crate::similarity::ratio;

/// Reads the victim of every kill banner shown to the main player.
pub struct KillEventCreator {
    roster: Arc<Roster>,
    ocr: Arc<dyn RegionOcr>,
    thresholds: EventThresholds,
    notifications: Option<Arc<FrameSeq<NotificationFrame>>>,
    lamps: Option<Arc<FrameSeq<LampFrame>>>,
}

impl KillEventCreator {
    pub fn new(roster: Arc<Roster>, ocr: Arc<dyn RegionOcr>, thresholds: EventThresholds) -> Self {
        Self {
            roster,
            ocr,
            thresholds,
            notifications: None,
            lamps: None,
        }
    }

    pub fn with_notifications(mut self, notifications: Arc<FrameSeq<NotificationFrame>>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_lamps(mut self, lamps: Arc<FrameSeq<LampFrame>>) -> Self {
        self.lamps = Some(lamps);
        self
    }

    /// Read the victim's name off one kill banner.
    fn read_victim_name(&self, frame: FrameIndex, notification: &Notification) -> Option<String> {
        if notification.confidence < self.thresholds.kill_min_confidence {
            return None;
        }

        let mut chars = match self.ocr.recognize(frame, &notification.bbox, OcrFont::Text) {
            Ok(chars) => chars,
            Err(e) => {
                tracing::debug!(frame, error = %e, "Kill banner unreadable");
                return None;
            }
        };
        let first = chars.first()?;
        // The kill icon left of the name is sometimes read as a char.
        if first.bbox.x1 < first.bbox.width() {
            chars.remove(0);
        }

        let suffix_len = self.thresholds.kill_suffix.chars().count();
        let split = chars.len().saturating_sub(suffix_len);
        let suffix = chars_to_string(&chars[split..]);
        if ratio(&suffix, &self.thresholds.kill_suffix) < self.thresholds.kill_suffix_min_ratio {
            tracing::trace!(frame, suffix = %suffix, "Kill banner suffix mismatch");
            return None;
        }

        let name = chars_to_string(&chars[..split]);
        (!name.is_empty()).then_some(name)
    }
}

/// Whether the player's lamp shows death anywhere in `[start, end]`.
fn died_within(lamps: &FrameSeq<LampFrame>, player: &Player, start: FrameIndex, end: FrameIndex) -> bool {
    lamps
        .window(start, end)
        .iter()
        .any(|f| matches!(f.payload.lamp(player.side, player.lamp_ord), Some(l) if l.state == LampState::Death))
}

impl EventCreator for KillEventCreator {
    type Output = Vec<KillEvent>;

    fn name(&self) -> &'static str {
        "kill"
    }

    fn run(&self) -> InkframeResult<Vec<KillEvent>> {
        let notifications = required(&self.notifications, self.name(), "notifications")?;
        let lamps = required(&self.lamps, self.name(), "lamp detections")?;

        let correlator = IdentityCorrelator::new(&self.roster, Side::Enemy).with_thresholds(
            self.thresholds.likely_player_ratio,
            self.thresholds.sample_player_ratio,
        );
        let kill_player = self.roster.main_player().cloned();

        let has_kill = |frame: &Frame<NotificationFrame>, _: bool| {
            if frame.payload.count(NotificationKind::Kill) > 0 {
                Verdict::Target
            } else {
                Verdict::NotTarget
            }
        };

        let mut events = Vec::new();
        for segment in segments(
            notifications.frames(),
            has_kill,
            self.thresholds.kill_exit_frames,
            1,
        ) {
            let mut samples = Vec::new();
            for frame in segment.frames {
                for notification in frame.payload.of_kind(NotificationKind::Kill) {
                    if let Some(name) = self.read_victim_name(frame.index, notification) {
                        let sample = NameSample::new(name, frame.index);
                        samples.push(match notification.track_id {
                            Some(track) => sample.with_track(track),
                            None => sample,
                        });
                    }
                }
            }

            let victims = correlator.merge_samples(&samples, |player, start, end| {
                died_within(lamps, player, start, end)
            });
            tracing::debug!(
                start = segment.first_frame(),
                samples = samples.len(),
                victims = victims.len(),
                "Kill segment resolved"
            );

            events.extend(victims.into_iter().map(|victim| KillEvent {
                kill_player: kill_player.clone(),
                death_player: victim.player,
                start_frame: victim.start_frame,
                end_frame: victim.end_frame,
            }));
        }

        tracing::info!(events = events.len(), "Kill events created");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RecordedOcr;
    use inkframe_battle_model::{BBox, RecognizedChar};

    const BANNER: BBox = BBox {
        x1: 1400,
        y1: 800,
        x2: 1800,
        y2: 840,
    };

    fn roster() -> Arc<Roster> {
        let team = (0..4).map(|i| Player::new(format!("Me{i}"), Side::Team, i)).collect();
        let enemy = vec![
            Player::new("Foo", Side::Enemy, 0),
            Player::new("Barbaz", Side::Enemy, 1),
            Player::new("Quux", Side::Enemy, 2),
            Player::new("Zed", Side::Enemy, 3),
        ];
        Arc::new(Roster::new(team, enemy).with_main_player(0))
    }

    fn kill_frame(index: u64, confidence: f32) -> Frame<NotificationFrame> {
        Frame::new(
            index,
            NotificationFrame::new(vec![
                Notification::new(NotificationKind::Kill, BANNER, confidence).with_track(3)
            ]),
        )
    }

    fn lamps(dead_enemy: Option<usize>, frames: std::ops::Range<u64>) -> Arc<FrameSeq<LampFrame>> {
        let lamps = frames
            .map(|i| {
                let mut enemy = [LampState::Live; 4];
                if let Some(ord) = dead_enemy {
                    enemy[ord] = LampState::Death;
                }
                Frame::new(i, LampFrame::from_states(Some(&[LampState::Live; 4]), Some(&enemy)))
            })
            .collect();
        Arc::new(FrameSeq::new(lamps, 1))
    }

    #[test]
    fn test_kill_event_from_banners() {
        let mut ocr = RecordedOcr::default();
        for (i, text) in ["Fooをたおした。", "F0oをたおした。", "Fooをたおした"].iter().enumerate() {
            ocr.insert_text(100 + i as u64, BANNER, text);
        }
        let notifications = (100..103).map(|i| kill_frame(i, 0.9)).collect();

        let events = KillEventCreator::new(roster(), Arc::new(ocr), EventThresholds::default())
            .with_notifications(Arc::new(FrameSeq::new(notifications, 1)))
            .with_lamps(lamps(Some(0), 90..110))
            .run()
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].death_player.name, "Foo");
        assert_eq!(events[0].death_player.side, Side::Enemy);
        assert_eq!(events[0].kill_player.as_ref().map(|p| p.name.as_str()), Some("Me0"));
        assert_eq!((events[0].start_frame, events[0].end_frame), (100, 102));
    }

    #[test]
    fn test_kill_requires_death_lamp() {
        let mut ocr = RecordedOcr::default();
        ocr.insert_text(100, BANNER, "Quuxをたおした。");
        let notifications = vec![kill_frame(100, 0.9)];

        let events = KillEventCreator::new(roster(), Arc::new(ocr), EventThresholds::default())
            .with_notifications(Arc::new(FrameSeq::new(notifications, 1)))
            .with_lamps(lamps(Some(0), 90..110))
            .run()
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_victim_name_reading() {
        let mut ocr = RecordedOcr::default();
        ocr.insert_text(1, BANNER, "Barbazをたおした。");
        ocr.insert_text(2, BANNER, "Barbaz was here");
        // Kill icon read as a leading char at the left edge of the banner.
        let mut with_icon = vec![RecognizedChar::new('x', BBox::new(0, 0, 30, 30))];
        with_icon.extend("Zedをたおした。".chars().enumerate().map(|(i, c)| {
            let x = 40 + 10 * i as i32;
            RecognizedChar::new(c, BBox::new(x, 0, x + 10, 30))
        }));
        ocr.insert_chars(3, BANNER, with_icon);

        let creator = KillEventCreator::new(roster(), Arc::new(ocr), EventThresholds::default());
        let banner = Notification::new(NotificationKind::Kill, BANNER, 0.95);
        assert_eq!(creator.read_victim_name(1, &banner).as_deref(), Some("Barbaz"));
        assert_eq!(creator.read_victim_name(2, &banner), None);
        assert_eq!(creator.read_victim_name(3, &banner).as_deref(), Some("Zed"));
        // Unrecorded frame: OCR failure is swallowed.
        assert_eq!(creator.read_victim_name(4, &banner), None);

        let faint = Notification::new(NotificationKind::Kill, BANNER, 0.5);
        assert_eq!(creator.read_victim_name(1, &faint), None);
    }

    #[test]
    fn test_missing_lamps_is_misuse() {
        let err = KillEventCreator::new(roster(), Arc::new(RecordedOcr::default()), EventThresholds::default())
            .with_notifications(Arc::new(FrameSeq::default()))
            .run()
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
