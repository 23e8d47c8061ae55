//! Count events: spans during which a side's rule count held.

use std::sync::Arc;

use inkframe_battle_model::{CountEvent, FrameSeq, IndicatorFrame, Rule, Side};
use inkframe_common::{CountEpsilon, FrameSpan, InkframeResult};

use super::{frames_in, required, EventCreator};
use crate::consensus::likely_value;
use crate::monitor::CountMonitor;
use crate::segment::segments;

/// Tracks the rule count of each counted side through the battle window.
pub struct CountEventCreator {
    rule: Rule,
    epsilon: CountEpsilon,
    exit_frames: usize,
    window: Option<FrameSpan>,
    indicators: Option<Arc<FrameSeq<IndicatorFrame>>>,
}

impl CountEventCreator {
    pub fn new(rule: Rule, epsilon: CountEpsilon) -> Self {
        Self {
            rule,
            epsilon,
            exit_frames: 1,
            window: None,
            indicators: None,
        }
    }

    pub fn with_exit_frames(mut self, exit_frames: usize) -> Self {
        self.exit_frames = exit_frames;
        self
    }

    pub fn with_window(mut self, window: FrameSpan) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_indicators(mut self, indicators: Arc<FrameSeq<IndicatorFrame>>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Sides tracked under the rule. Turf war only shows the team's points.
    fn sides(&self) -> &'static [Side] {
        if self.rule.is_countdown() {
            &[Side::Team, Side::Enemy]
        } else {
            &[Side::Team]
        }
    }
}

impl EventCreator for CountEventCreator {
    type Output = Vec<CountEvent>;

    fn name(&self) -> &'static str {
        "count"
    }

    fn run(&self) -> InkframeResult<Vec<CountEvent>> {
        let indicators = required(&self.indicators, self.name(), "indicator results")?;
        let frames = frames_in(indicators, self.window);

        let mut events = Vec::new();
        for &side in self.sides() {
            let monitor = CountMonitor::for_rule(self.rule, side, &self.epsilon);
            let mut stream = segments(frames, monitor, self.exit_frames, 1);
            while let Some(segment) = stream.next() {
                if segment.is_empty() {
                    continue;
                }
                let monitor = stream.predicate();
                events.push(CountEvent {
                    count: monitor.previous(),
                    earned_value: monitor.earned_value(),
                    side,
                    start_frame: segment.first_frame(),
                    end_frame: segment.last_frame(),
                });
            }
        }

        tracing::info!(rule = ?self.rule, events = events.len(), "Count events created");
        Ok(events)
    }
}

/// Rule shown by most indicator frames.
pub fn dominant_rule(indicators: &FrameSeq<IndicatorFrame>) -> Option<Rule> {
    likely_value(
        indicators
            .frames()
            .iter()
            .map(|f| f.payload.indicator.map(|ind| ind.rule())),
    )
}
