//! Whole-battle analysis.
//!
//! [`BattleAnalyzer`] finds where the battle opens and ends, then runs every
//! per-battle creator concurrently over that window and gathers the results
//! into a [`BattleReport`]. Every creator runs on a blocking worker, so
//! collaborator calls never stall the runtime.

use std::sync::Arc;

use inkframe_battle_model::{
    serialize_event_log, BattleEndEvent, BattleEvent, BattleOpenEvent, BattleResultEvent,
    CountEvent, DeathEvent, EventLogHeader, FrameSeq, IndicatorFrame, KillEvent, LampFrame,
    NotificationFrame, PlayerNumberBalanceEvent, Roster, SpecialWeaponEvent,
    EVENT_SCHEMA_VERSION,
};
use inkframe_common::{wall_clock_now, AnalyzerConfig, FrameSpan, InkframeError, InkframeResult};

use crate::collaborators::{LampInspector, NoReinspection, RecordedOcr, RegionOcr};
use crate::creators::{
    count::dominant_rule, BattleEndEventCreator, BattleOpenEventCreator, BattleResultEventCreator,
    CountEventCreator, DeathEventCreator, EventCreator, KillEventCreator,
    PlayerNumberBalanceEventCreator, SpecialWeaponEventCreator,
};

/// Every event found in one battle.
#[derive(Debug, Clone, Default)]
pub struct BattleReport {
    pub frame_rate: u32,
    pub generated_at: String,
    pub open: Option<BattleOpenEvent>,
    pub end: Option<BattleEndEvent>,
    pub result: Option<BattleResultEvent>,
    pub counts: Vec<CountEvent>,
    pub kills: Vec<KillEvent>,
    pub deaths: Vec<DeathEvent>,
    pub specials: Vec<SpecialWeaponEvent>,
    pub balances: Vec<PlayerNumberBalanceEvent>,
}

impl BattleReport {
    /// All events in one list, ordered by start frame. Events starting on
    /// the same frame keep their category order.
    pub fn events(&self) -> Vec<BattleEvent> {
        let mut events: Vec<BattleEvent> = Vec::new();
        events.extend(self.open.clone().map(BattleEvent::BattleOpen));
        events.extend(self.end.clone().map(BattleEvent::BattleEnd));
        events.extend(self.result.clone().map(BattleEvent::BattleResult));
        events.extend(self.counts.iter().cloned().map(BattleEvent::Count));
        events.extend(self.kills.iter().cloned().map(BattleEvent::Kill));
        events.extend(self.deaths.iter().cloned().map(BattleEvent::Death));
        events.extend(self.specials.iter().cloned().map(BattleEvent::SpecialWeapon));
        events.extend(self.balances.iter().cloned().map(BattleEvent::PlayerNumberBalance));
        events.sort_by_key(BattleEvent::start_frame);
        events
    }

    pub fn header(&self) -> EventLogHeader {
        EventLogHeader {
            schema_version: EVENT_SCHEMA_VERSION.to_string(),
            generated_at: self.generated_at.clone(),
            frame_rate: self.frame_rate,
            event_count: self.events().len(),
        }
    }

    /// JSONL event log with a header line.
    pub fn to_event_log(&self) -> InkframeResult<String> {
        Ok(serialize_event_log(&self.header(), &self.events())?)
    }
}

/// Runs the event creators over one battle.
pub struct BattleAnalyzer {
    config: AnalyzerConfig,
    roster: Arc<Roster>,
    ocr: Arc<dyn RegionOcr>,
    inspector: Arc<dyn LampInspector>,
    notifications: Option<Arc<FrameSeq<NotificationFrame>>>,
    lamps: Option<Arc<FrameSeq<LampFrame>>>,
    indicators: Option<Arc<FrameSeq<IndicatorFrame>>>,
}

impl BattleAnalyzer {
    /// Analyzer with no OCR readings and no lamp re-inspection.
    pub fn new(config: AnalyzerConfig, roster: Roster) -> Self {
        Self {
            config,
            roster: Arc::new(roster),
            ocr: Arc::new(RecordedOcr::default()),
            inspector: Arc::new(NoReinspection),
            notifications: None,
            lamps: None,
            indicators: None,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn RegionOcr>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn LampInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn with_notifications(mut self, notifications: FrameSeq<NotificationFrame>) -> Self {
        self.notifications = Some(Arc::new(notifications));
        self
    }

    pub fn with_lamps(mut self, lamps: FrameSeq<LampFrame>) -> Self {
        self.lamps = Some(Arc::new(lamps));
        self
    }

    pub fn with_indicators(mut self, indicators: FrameSeq<IndicatorFrame>) -> Self {
        self.indicators = Some(Arc::new(indicators));
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run every creator and collect their events.
    pub async fn analyze(&self) -> InkframeResult<BattleReport> {
        let notifications = self
            .notifications
            .clone()
            .ok_or_else(|| InkframeError::misuse("battle analysis started without notifications"))?;
        let thresholds = &self.config.thresholds;

        let mut open_creator = BattleOpenEventCreator::new(thresholds.clone(), self.config.frame_rate)
            .with_notifications(notifications.clone());
        if let Some(lamps) = &self.lamps {
            open_creator = open_creator.with_lamps(lamps.clone());
        }
        let open_task = open_creator.create();
        let end_task = BattleEndEventCreator::new(thresholds.clone())
            .with_notifications(notifications.clone())
            .create();
        let open = open_task.join().await?;
        let end = end_task.join().await?;

        let lamps = self
            .lamps
            .clone()
            .ok_or_else(|| InkframeError::misuse("battle analysis started without lamp detections"))?;
        let indicators = self
            .indicators
            .clone()
            .ok_or_else(|| InkframeError::misuse("battle analysis started without indicator results"))?;

        let window = FrameSpan::new(
            open.as_ref()
                .map(|o| o.end_frame)
                .or_else(|| lamps.first_index())
                .unwrap_or_default(),
            end.as_ref()
                .map(|e| e.start_frame)
                .or_else(|| lamps.last_index())
                .unwrap_or_default(),
        );
        tracing::info!(start = window.start, end = window.end, "Battle window");

        let kill_task = KillEventCreator::new(self.roster.clone(), self.ocr.clone(), thresholds.clone())
            .with_notifications(notifications.clone())
            .with_lamps(lamps.clone())
            .create();
        let death_task = DeathEventCreator::new(self.roster.clone(), self.ocr.clone(), thresholds.clone())
            .with_window(window)
            .with_notifications(notifications.clone())
            .with_lamps(lamps.clone())
            .create();
        let special_task =
            SpecialWeaponEventCreator::new(self.roster.clone(), self.inspector.clone(), thresholds.clone())
                .with_window(window)
                .with_lamps(lamps.clone())
                .create();
        let balance_task = PlayerNumberBalanceEventCreator::new(self.roster.clone(), thresholds.clone())
            .with_window(window)
            .with_lamps(lamps.clone())
            .create();

        let rule = open.as_ref().map(|o| o.rule).or_else(|| dominant_rule(&indicators));
        let count_task = rule.map(|rule| {
            CountEventCreator::new(rule, self.config.count_epsilon)
                .with_exit_frames(thresholds.count_exit_frames)
                .with_window(window)
                .with_indicators(indicators.clone())
                .create()
        });
        if count_task.is_none() {
            tracing::warn!("Battle rule unknown, count events skipped");
        }

        let result_task = BattleResultEventCreator::new(self.ocr.clone(), thresholds.clone())
            .with_open(open.clone())
            .with_end(end.clone())
            .with_indicators(indicators.clone())
            .create();

        let result = result_task.join().await?;
        let kills = kill_task.join().await?;
        let deaths = death_task.join().await?;
        let specials = special_task.join().await?;
        let balances = balance_task.join().await?;
        let counts = match count_task {
            Some(task) => task.join().await?,
            None => Vec::new(),
        };

        let report = BattleReport {
            frame_rate: self.config.frame_rate,
            generated_at: wall_clock_now(),
            open,
            end,
            result,
            counts,
            kills,
            deaths,
            specials,
            balances,
        };
        tracing::info!(
            kills = report.kills.len(),
            deaths = report.deaths.len(),
            specials = report.specials.len(),
            counts = report.counts.len(),
            balances = report.balances.len(),
            "Battle analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_battle_model::{Frame, KillEvent, Player, Side};

    #[tokio::test]
    async fn test_missing_notifications_is_misuse() {
        let err = BattleAnalyzer::new(AnalyzerConfig::default(), Roster::default())
            .analyze()
            .await
            .unwrap_err();
        assert!(matches!(err, InkframeError::Misuse { .. }));
    }

    #[tokio::test]
    async fn test_missing_lamps_is_misuse() {
        let err = BattleAnalyzer::new(AnalyzerConfig::default(), Roster::default())
            .with_notifications(FrameSeq::new(vec![Frame::new(0, NotificationFrame::default())], 1))
            .analyze()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("lamp detections"));
    }

    #[test]
    fn test_report_events_ordered() {
        let foo = Player::new("Foo", Side::Enemy, 0);
        let report = BattleReport {
            end: Some(BattleEndEvent {
                start_frame: 900,
                end_frame: 950,
            }),
            kills: vec![
                KillEvent {
                    kill_player: None,
                    death_player: foo.clone(),
                    start_frame: 500,
                    end_frame: 510,
                },
                KillEvent {
                    kill_player: None,
                    death_player: foo,
                    start_frame: 100,
                    end_frame: 110,
                },
            ],
            ..Default::default()
        };
        let starts: Vec<_> = report.events().iter().map(BattleEvent::start_frame).collect();
        assert_eq!(starts, vec![100, 500, 900]);
        assert_eq!(report.header().event_count, 3);
    }
}
