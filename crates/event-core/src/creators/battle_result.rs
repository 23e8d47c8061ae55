//! Battle result: read from the result screen, or inferred from which team
//! led on the last indicator before the finish.

use std::sync::Arc;

use inkframe_battle_model::{
    chars_to_string, BattleEndEvent, BattleOpenEvent, BattleResultEvent, Frame, FrameSeq,
    IndicatorFrame, ResultCount, Side, WinLose,
};
use inkframe_common::{EventThresholds, InkframeResult};

use super::{required, EventCreator};
use crate::collaborators::{OcrFont, RegionOcr};
use crate::consensus::likely_float;
use crate::segment::{find_segment, Verdict};

/// Largest value a final count or percentage can take.
const MAX_RESULT_COUNT: f64 = 100.0;

/// Reads win or lose and final counts after the battle ends.
pub struct BattleResultEventCreator {
    ocr: Arc<dyn RegionOcr>,
    thresholds: EventThresholds,
    open: Option<BattleOpenEvent>,
    end: Option<BattleEndEvent>,
    indicators: Option<Arc<FrameSeq<IndicatorFrame>>>,
}

impl BattleResultEventCreator {
    pub fn new(ocr: Arc<dyn RegionOcr>, thresholds: EventThresholds) -> Self {
        Self {
            ocr,
            thresholds,
            open: None,
            end: None,
            indicators: None,
        }
    }

    pub fn with_open(mut self, open: Option<BattleOpenEvent>) -> Self {
        self.open = open;
        self
    }

    pub fn with_end(mut self, end: Option<BattleEndEvent>) -> Self {
        self.end = end;
        self
    }

    pub fn with_indicators(mut self, indicators: Arc<FrameSeq<IndicatorFrame>>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    fn from_result_screen(&self, indicators: &FrameSeq<IndicatorFrame>) -> Option<BattleResultEvent> {
        let frames = match &self.end {
            Some(end) => indicators.since(end.end_frame),
            None => indicators.frames(),
        };

        let mut has_result = |frame: &Frame<IndicatorFrame>, _: bool| {
            if frame.payload.result.is_some() {
                Verdict::Target
            } else {
                Verdict::NotTarget
            }
        };
        let (start, end) = find_segment(frames, &mut has_result, self.thresholds.result_exit_frames, 1)?;
        let frames = &frames[start..=end];

        let win_lose = frames
            .iter()
            .find_map(|f| f.payload.result.and_then(|r| r.win_lose))?;
        let count = |side: Side| likely_float(frames.iter().map(|f| self.read_count(f, side)));

        Some(BattleResultEvent {
            win_lose,
            team_count: count(Side::Team),
            enemy_count: count(Side::Enemy),
            start_frame: frames[0].index,
            end_frame: frames[frames.len() - 1].index,
        })
    }

    fn read_count(&self, frame: &Frame<IndicatorFrame>, side: Side) -> Option<f64> {
        let count: &ResultCount = frame.payload.result.as_ref()?.count(side)?;
        if count.is_knockout {
            return Some(MAX_RESULT_COUNT);
        }
        let chars = match self.ocr.recognize(frame.index, &count.bbox, OcrFont::Number) {
            Ok(chars) => chars,
            Err(e) => {
                tracing::debug!(frame = frame.index, ?side, error = %e, "Result count unreadable");
                return None;
            }
        };
        parse_count(&chars_to_string(&chars))
    }

    /// Win or lose by the side the lead label sits on, from the last
    /// indicator shown before the finish.
    fn from_lead_label(&self, indicators: &FrameSeq<IndicatorFrame>) -> Option<BattleResultEvent> {
        let end = self.end.as_ref()?;
        let from = self.open.as_ref().map_or(0, |open| open.end_frame);

        let widgets = indicators
            .window(from, end.start_frame)
            .iter()
            .rev()
            .find_map(|f| f.payload.widgets)?;
        let lead = widgets.lead_label?;
        let win_lose = if (lead.x1 as f64) < widgets.occupancy.center_x() {
            WinLose::Win
        } else {
            WinLose::Lose
        };

        Some(BattleResultEvent {
            win_lose,
            team_count: None,
            enemy_count: None,
            start_frame: end.end_frame,
            end_frame: end.end_frame,
        })
    }
}

/// Leading number of a count reading such as `"42カウント"` or `"37.5%"`.
fn parse_count(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = digits.parse().ok()?;
    (value <= MAX_RESULT_COUNT).then_some(value)
}

impl EventCreator for BattleResultEventCreator {
    type Output = Option<BattleResultEvent>;

    fn name(&self) -> &'static str {
        "battle_result"
    }

    fn run(&self) -> InkframeResult<Option<BattleResultEvent>> {
        let indicators = required(&self.indicators, self.name(), "indicator results")?;

        let event = self
            .from_result_screen(indicators)
            .or_else(|| {
                tracing::debug!("No result screen, falling back to lead label");
                self.from_lead_label(indicators)
            });

        match &event {
            Some(e) => tracing::info!(
                win_lose = ?e.win_lose,
                team_count = e.team_count,
                enemy_count = e.enemy_count,
                "Battle result found"
            ),
            None => tracing::info!("No battle result found"),
        }
        Ok(event)
    }
}
