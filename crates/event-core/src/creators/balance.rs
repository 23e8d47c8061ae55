//! Player-number balance: how many players each side has on the field.

use std::sync::Arc;

use inkframe_battle_model::{FrameSeq, LampFrame, PlayerNumberBalanceEvent, Roster, Side};
use inkframe_common::{EventThresholds, FrameSpan, InkframeResult};

use super::{frames_in, required, EventCreator};
use crate::monitor::BalanceMonitor;
use crate::segment::segments;

/// Emits a balance event each time the alive player counts change.
pub struct PlayerNumberBalanceEventCreator {
    roster: Arc<Roster>,
    thresholds: EventThresholds,
    window: Option<FrameSpan>,
    lamps: Option<Arc<FrameSeq<LampFrame>>>,
}

impl PlayerNumberBalanceEventCreator {
    pub fn new(roster: Arc<Roster>, thresholds: EventThresholds) -> Self {
        Self {
            roster,
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

    /// Starting head count for a side: the roster, or the last detected
    /// lamp row when the roster has nobody on that side.
    fn initial_count(&self, lamps: &FrameSeq<LampFrame>, side: Side) -> usize {
        let listed = self.roster.players(side).len();
        if listed > 0 {
            return listed;
        }
        lamps
            .frames()
            .iter()
            .rev()
            .find_map(|f| f.payload.side(side).map(|row| row.len()))
            .unwrap_or_default()
    }
}

impl EventCreator for PlayerNumberBalanceEventCreator {
    type Output = Vec<PlayerNumberBalanceEvent>;

    fn name(&self) -> &'static str {
        "player_number_balance"
    }

    fn run(&self) -> InkframeResult<Vec<PlayerNumberBalanceEvent>> {
        let lamps = required(&self.lamps, self.name(), "lamp detections")?;
        let monitor = BalanceMonitor::new(
            self.initial_count(lamps, Side::Team),
            self.initial_count(lamps, Side::Enemy),
        );

        let frames = frames_in(lamps, self.window);
        let mut stream = segments(frames, monitor, self.thresholds.balance_exit_frames, 1);
        let mut events = Vec::new();
        while let Some(segment) = stream.next() {
            if segment.is_empty() {
                continue;
            }
            let held = stream.predicate().previous();
            events.push(PlayerNumberBalanceEvent {
                team_number: held.team,
                enemy_number: held.enemy,
                balance_state: held.state,
                start_frame: segment.first_frame(),
                end_frame: segment.last_frame(),
            });
        }

        tracing::info!(events = events.len(), "Player number balance events created");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_battle_model::{BalanceState, Frame, LampState, Player};

    fn roster() -> Arc<Roster> {
        let team = (0..4).map(|i| Player::new(format!("t{i}"), Side::Team, i)).collect();
        let enemy = (0..4).map(|i| Player::new(format!("e{i}"), Side::Enemy, i)).collect();
        Arc::new(Roster::new(team, enemy))
    }

    #[test]
    fn test_balance_spans() {
        use LampState::*;
        let lamps = vec![
            Frame::new(0, LampFrame::from_states(Some(&[Live; 4]), Some(&[Live; 4]))),
            Frame::new(1, LampFrame::from_states(Some(&[Live, Sp, Live, Live]), Some(&[Live; 4]))),
            Frame::new(2, LampFrame::from_states(Some(&[Live; 4]), Some(&[Live, Death, Live, Live]))),
            Frame::new(3, LampFrame::from_states(None, Some(&[Live; 4]))),
            Frame::new(4, LampFrame::from_states(Some(&[Live; 4]), Some(&[Live, Death, Live, Live]))),
            Frame::new(5, LampFrame::from_states(Some(&[Live; 4]), Some(&[Live; 4]))),
        ];
        let events = PlayerNumberBalanceEventCreator::new(roster(), EventThresholds::default())
            .with_lamps(Arc::new(FrameSeq::new(lamps, 1)))
            .run()
            .unwrap();

        let spans: Vec<_> = events
            .iter()
            .map(|e| (e.team_number, e.enemy_number, e.balance_state, e.start_frame, e.end_frame))
            .collect();
        assert_eq!(
            spans,
            vec![
                (4, 4, BalanceState::Even, 0, 1),
                (4, 3, BalanceState::Advantage, 2, 4),
                // Trailing span reports the snapshot held before its last change.
                (4, 3, BalanceState::Advantage, 5, 5),
            ]
        );
    }

    #[test]
    fn test_initial_count_from_lamps_without_roster() {
        use LampState::*;
        let lamps = FrameSeq::new(
            vec![
                Frame::new(0, LampFrame::from_states(Some(&[Live; 2]), Some(&[Live; 3]))),
                Frame::new(1, LampFrame::from_states(Some(&[Live; 3]), None)),
            ],
            1,
        );
        let creator = PlayerNumberBalanceEventCreator::new(Arc::new(Roster::default()), EventThresholds::default());
        assert_eq!(creator.initial_count(&lamps, Side::Team), 3);
        assert_eq!(creator.initial_count(&lamps, Side::Enemy), 3);
        assert_eq!(creator.initial_count(&FrameSeq::default(), Side::Team), 0);
    }
}
