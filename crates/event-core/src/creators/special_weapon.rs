//! Special weapon events: charge, then use or loss of the charge.

use std::sync::Arc;

use inkframe_battle_model::{
    Frame, FrameIndex, FrameSeq, LampFrame, LampState, Player, Roster, SpecialWeaponEvent,
    SpecialWeaponEventKind,
};
use inkframe_common::{EventThresholds, FrameSpan, InkframeResult};

use super::{frames_in, required, EventCreator};
use crate::collaborators::LampInspector;
use crate::monitor::LampStatePredicate;
use crate::segment::{find_segment, segments};

/// Emits a charge event per special weapon lamp run, followed by its use or loss.
pub struct SpecialWeaponEventCreator {
    roster: Arc<Roster>,
    inspector: Arc<dyn LampInspector>,
    thresholds: EventThresholds,
    window: Option<FrameSpan>,
    lamps: Option<Arc<FrameSeq<LampFrame>>>,
}

impl SpecialWeaponEventCreator {
    pub fn new(roster: Arc<Roster>, inspector: Arc<dyn LampInspector>, thresholds: EventThresholds) -> Self {
        Self {
            roster,
            inspector,
            thresholds,
            window: None,
            lamps: None,
        }
    }

    pub fn with_window(mut self, window: FrameSpan) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_lamps(mut self, lamps: Arc<FrameSeq<LampFrame>>) -> Self {
        self.lamps = Some(lamps);
        self
    }

    fn sp_predicate(player: &Player) -> LampStatePredicate {
        LampStatePredicate::new(player.side, player.lamp_ord, LampState::Sp).requiring_both_rows()
    }

    /// Whether dense detection shows the player charged over all of `[start, end]`.
    fn charged_throughout(&self, player: &Player, start: FrameIndex, end: FrameIndex) -> bool {
        if end < start {
            return false;
        }
        let frames = match self.inspector.inspect(start, end) {
            Ok(Some(frames)) => frames,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(player = %player.name, start, end, error = %e, "Lamp re-inspection failed");
                return false;
            }
        };
        match find_segment(&frames, &mut Self::sp_predicate(player), 1, 1) {
            Some((s, e)) => (e - s) as u64 == end - start,
            None => false,
        }
    }

    /// Re-inspect the frames the sampled stream skipped on either side of a
    /// short charge.
    fn confirm_short_charge(&self, player: &Player, first: FrameIndex, last: FrameIndex) -> bool {
        let span = self.thresholds.special_min_frames as u64;
        let before = (first + 1)
            .checked_sub(span)
            .zip(first.checked_sub(1))
            .is_some_and(|(start, end)| self.charged_throughout(player, start, end));
        before || self.charged_throughout(player, last + 1, (last + span).saturating_sub(1))
    }
}

/// First frame after a charge where the player is seen alive or dead.
fn resolve_charge(frames: &[Frame<LampFrame>], player: &Player) -> Option<(SpecialWeaponEventKind, FrameIndex)> {
    frames.iter().find_map(|f| {
        match f.payload.lamp(player.side, player.lamp_ord)?.state {
            LampState::Live => Some((SpecialWeaponEventKind::Triggered, f.index)),
            LampState::Death => Some((SpecialWeaponEventKind::Spoiled, f.index)),
            LampState::Sp | LampState::Drop => None,
        }
    })
}

impl EventCreator for SpecialWeaponEventCreator {
    type Output = Vec<SpecialWeaponEvent>;

    fn name(&self) -> &'static str {
        "special_weapon"
    }

    fn run(&self) -> InkframeResult<Vec<SpecialWeaponEvent>> {
        let lamps = required(&self.lamps, self.name(), "lamp detections")?;
        let frames = frames_in(lamps, self.window);

        let mut events = Vec::new();
        for player in self.roster.all() {
            for segment in segments(
                frames,
                Self::sp_predicate(player),
                self.thresholds.special_exit_frames,
                1,
            ) {
                let (first, last) = (segment.first_frame(), segment.last_frame());
                if segment.len() < self.thresholds.special_min_frames
                    && !self.confirm_short_charge(player, first, last)
                {
                    tracing::debug!(player = %player.name, frame = first, "Unconfirmed special charge dropped");
                    continue;
                }

                events.push(SpecialWeaponEvent {
                    kind: SpecialWeaponEventKind::FullyCharged,
                    player: player.clone(),
                    start_frame: first,
                    end_frame: first,
                });
                if let Some((kind, at)) = resolve_charge(&frames[segment.end + 1..], player) {
                    events.push(SpecialWeaponEvent {
                        kind,
                        player: player.clone(),
                        start_frame: at,
                        end_frame: at,
                    });
                }
            }
        }

        tracing::info!(events = events.len(), "Special weapon events created");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NoReinspection, RecordedLampInspector};
    use inkframe_battle_model::Side;
    use inkframe_common::InkframeError;
    use inkframe_battle_model::LampState::*;

    struct FailingInspector;

    impl LampInspector for FailingInspector {
        fn inspect(&self, _: FrameIndex, _: FrameIndex) -> InkframeResult<Option<Vec<Frame<LampFrame>>>> {
            Err(InkframeError::collaborator("decoder gone"))
        }
    }

    fn roster() -> Arc<Roster> {
        Arc::new(Roster::new(vec![Player::new("Me", Side::Team, 0)], vec![]))
    }

    fn sampled(states: &[(u64, LampState)]) -> Arc<FrameSeq<LampFrame>> {
        let frames = states
            .iter()
            .map(|(i, s)| Frame::new(*i, LampFrame::from_states(Some(&[*s]), Some(&[Live]))))
            .collect();
        Arc::new(FrameSeq::new(frames, 10))
    }

    fn kinds(events: &[SpecialWeaponEvent]) -> Vec<(SpecialWeaponEventKind, u64)> {
        events.iter().map(|e| (e.kind, e.start_frame)).collect()
    }

    #[test]
    fn test_charge_then_trigger() {
        let lamps = sampled(&[(0, Live), (10, Sp), (20, Sp), (30, Sp), (40, Live), (50, Live)]);
        let events = SpecialWeaponEventCreator::new(roster(), Arc::new(NoReinspection), EventThresholds::default())
            .with_lamps(lamps)
            .run()
            .unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                (SpecialWeaponEventKind::FullyCharged, 10),
                (SpecialWeaponEventKind::Triggered, 40),
            ]
        );
    }

    #[test]
    fn test_charge_spoiled_by_death() {
        let lamps = sampled(&[(10, Sp), (20, Sp), (30, Sp), (40, Death), (50, Live)]);
        let events = SpecialWeaponEventCreator::new(roster(), Arc::new(NoReinspection), EventThresholds::default())
            .with_lamps(lamps)
            .run()
            .unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                (SpecialWeaponEventKind::FullyCharged, 10),
                (SpecialWeaponEventKind::Spoiled, 40),
            ]
        );
    }

    #[test]
    fn test_unresolved_charge_at_stream_end() {
        let lamps = sampled(&[(10, Sp), (20, Sp)]);
        let events = SpecialWeaponEventCreator::new(roster(), Arc::new(NoReinspection), EventThresholds::default())
            .with_lamps(lamps)
            .run()
            .unwrap();
        assert_eq!(kinds(&events), vec![(SpecialWeaponEventKind::FullyCharged, 10)]);
    }

    #[test]
    fn test_short_charge_needs_reinspection() {
        let lamps = sampled(&[(0, Live), (10, Sp), (20, Live), (30, Live), (40, Live), (50, Live), (60, Live)]);

        let unconfirmed = SpecialWeaponEventCreator::new(roster(), Arc::new(NoReinspection), EventThresholds::default())
            .with_lamps(lamps.clone())
            .run()
            .unwrap();
        assert!(unconfirmed.is_empty());

        let failing = SpecialWeaponEventCreator::new(roster(), Arc::new(FailingInspector), EventThresholds::default())
            .with_lamps(lamps.clone())
            .run()
            .unwrap();
        assert!(failing.is_empty());

        let dense = (0..30)
            .map(|i| {
                let state = if i == 11 { Sp } else { Live };
                Frame::new(i, LampFrame::from_states(Some(&[state]), Some(&[Live])))
            })
            .collect();
        let inspector = RecordedLampInspector::new(FrameSeq::new(dense, 1));
        let confirmed = SpecialWeaponEventCreator::new(roster(), Arc::new(inspector), EventThresholds::default())
            .with_lamps(lamps)
            .run()
            .unwrap();
        assert_eq!(
            kinds(&confirmed),
            vec![
                (SpecialWeaponEventKind::FullyCharged, 10),
                (SpecialWeaponEventKind::Triggered, 20),
            ]
        );
    }

    #[test]
    fn test_missing_row_is_pending() {
        let frames = vec![
            Frame::new(0, LampFrame::from_states(Some(&[Sp]), Some(&[Live]))),
            Frame::new(1, LampFrame::from_states(Some(&[Sp]), None)),
            Frame::new(2, LampFrame::from_states(Some(&[Sp]), Some(&[Live]))),
            Frame::new(3, LampFrame::from_states(Some(&[Live]), Some(&[Live]))),
        ];
        let events = SpecialWeaponEventCreator::new(roster(), Arc::new(NoReinspection), EventThresholds::default())
            .with_lamps(Arc::new(FrameSeq::new(frames, 1)))
            .run()
            .unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                (SpecialWeaponEventKind::FullyCharged, 0),
                (SpecialWeaponEventKind::Triggered, 3),
            ]
        );
    }
}
