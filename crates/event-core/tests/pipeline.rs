use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use inkframe_battle_model::{
    parse_events, BBox, BalanceState, BattleBundle, BattleEvent, DeathReasonType, FrameIndex,
    RecognizedChar, Rule, Side, SpecialWeaponEventKind, WinLose,
};
use inkframe_common::{AnalyzerConfig, InkframeError, InkframeResult};
use inkframe_event_core::{BattleAnalyzer, BattleReport, OcrFont, RecordedOcr, RegionOcr};

/// Slow OCR that remembers which threads called it.
struct SlowOcr {
    inner: RecordedOcr,
    callers: Mutex<Vec<ThreadId>>,
}

impl RegionOcr for SlowOcr {
    fn recognize(
        &self,
        frame: FrameIndex,
        region: &BBox,
        font: OcrFont,
    ) -> InkframeResult<Vec<RecognizedChar>> {
        self.callers.lock().unwrap().push(std::thread::current().id());
        std::thread::sleep(Duration::from_millis(2));
        self.inner.recognize(frame, region, font)
    }
}

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-battle")
}

fn load_fixture() -> BattleBundle {
    BattleBundle::load(fixture_dir()).expect("fixture battle should load")
}

fn analyzer(bundle: BattleBundle) -> BattleAnalyzer {
    let ocr = Arc::new(RecordedOcr::from_records(bundle.ocr.clone()));
    analyzer_with_ocr(bundle, ocr)
}

fn analyzer_with_ocr(bundle: BattleBundle, ocr: Arc<dyn RegionOcr>) -> BattleAnalyzer {
    let mut analyzer = BattleAnalyzer::new(AnalyzerConfig::default(), bundle.roster)
        .with_ocr(ocr)
        .with_notifications(bundle.notifications);
    if let Some(lamps) = bundle.lamps {
        analyzer = analyzer.with_lamps(lamps);
    }
    if let Some(indicators) = bundle.indicators {
        analyzer = analyzer.with_indicators(indicators);
    }
    analyzer
}

async fn analyze_fixture() -> BattleReport {
    analyzer(load_fixture())
        .analyze()
        .await
        .expect("fixture battle should analyze")
}

#[test]
fn fixture_bundle_loads() {
    let bundle = load_fixture();
    assert_eq!(bundle.roster.team.len(), 4);
    assert_eq!(bundle.roster.enemy.len(), 4);
    assert!(bundle.roster.enemy.iter().all(|p| p.side == Side::Enemy));
    assert_eq!(bundle.roster.main_player().map(|p| p.name.as_str()), Some("Me0"));
    assert_eq!(bundle.frame_range(), Some((0, 400)));
    assert_eq!(bundle.indicators.as_ref().map(|i| i.interval), Some(10));
    assert!(bundle.dense_lamps.is_none());
    assert_eq!(bundle.ocr.len(), 9);
}

#[tokio::test]
async fn fixture_battle_frame_and_result() {
    let report = analyze_fixture().await;

    let open = report.open.as_ref().expect("battle open");
    assert_eq!(open.rule, Rule::Area);
    assert_eq!((open.team_count, open.enemy_count), (Some(4), Some(4)));
    assert_eq!((open.start_frame, open.end_frame), (0, 9));

    let end = report.end.as_ref().expect("battle end");
    assert_eq!((end.start_frame, end.end_frame), (350, 355));

    let result = report.result.as_ref().expect("battle result");
    assert_eq!(result.win_lose, WinLose::Win);
    assert_eq!(result.team_count, Some(80.0));
    assert_eq!(result.enemy_count, Some(100.0));
    assert_eq!((result.start_frame, result.end_frame), (360, 362));
}

#[tokio::test]
async fn fixture_battle_player_events() {
    let report = analyze_fixture().await;

    assert_eq!(report.kills.len(), 1);
    let kill = &report.kills[0];
    assert_eq!(kill.death_player.name, "Foo");
    assert_eq!(kill.kill_player.as_ref().map(|p| p.name.as_str()), Some("Me0"));
    assert_eq!((kill.start_frame, kill.end_frame), (100, 102));

    assert_eq!(report.deaths.len(), 1);
    let death = &report.deaths[0];
    assert_eq!(death.death_player.name, "Foo");
    assert_eq!(death.reason_type, DeathReasonType::Unknown);
    assert_eq!((death.start_frame, death.end_frame), (100, 130));

    let specials: Vec<_> = report
        .specials
        .iter()
        .map(|e| (e.player.name.as_str(), e.kind, e.start_frame))
        .collect();
    assert_eq!(
        specials,
        vec![
            ("Me1", SpecialWeaponEventKind::FullyCharged, 150),
            ("Me1", SpecialWeaponEventKind::Triggered, 171),
        ]
    );

    let balances: Vec<_> = report
        .balances
        .iter()
        .map(|e| (e.team_number, e.enemy_number, e.balance_state, e.start_frame, e.end_frame))
        .collect();
    assert_eq!(balances.len(), 3);
    assert_eq!(balances[0], (4, 4, BalanceState::Even, 9, 99));
    assert_eq!(balances[1], (4, 3, BalanceState::Advantage, 100, 130));
}

#[tokio::test]
async fn fixture_battle_counts() {
    let report = analyze_fixture().await;

    let team: Vec<_> = report
        .counts
        .iter()
        .filter(|e| e.side == Side::Team)
        .map(|e| (e.count, e.earned_value, e.start_frame, e.end_frame))
        .collect();
    assert_eq!(team[0], (100, 0, 10, 190));
    assert_eq!(team.len(), 2);
    assert_eq!(team[1].2, 200);

    let enemy: Vec<_> = report
        .counts
        .iter()
        .filter(|e| e.side == Side::Enemy)
        .map(|e| (e.count, e.start_frame, e.end_frame))
        .collect();
    assert_eq!(enemy, vec![(100, 10, 340)]);
}

#[tokio::test]
async fn fixture_event_log_round_trips() {
    let report = analyze_fixture().await;
    let events = report.events();
    assert_eq!(events.len(), 13);
    assert!(events.windows(2).all(|w| w[0].start_frame() <= w[1].start_frame()));
    assert!(matches!(events[0], BattleEvent::BattleOpen(_)));
    assert!(matches!(events.last(), Some(BattleEvent::BattleResult(_))));

    let log = report.to_event_log().unwrap();
    assert!(log.starts_with("# {"));
    assert!(log.contains("\"frame_rate\":60"));
    assert_eq!(parse_events(&log).unwrap(), events);
}

#[tokio::test(flavor = "current_thread")]
async fn ocr_runs_off_the_runtime_thread() {
    let bundle = load_fixture();
    let ocr = Arc::new(SlowOcr {
        inner: RecordedOcr::from_records(bundle.ocr.clone()),
        callers: Mutex::new(Vec::new()),
    });
    let report = analyzer_with_ocr(bundle, ocr.clone()).analyze().await.unwrap();

    let result = report.result.as_ref().expect("battle result");
    assert_eq!(result.team_count, Some(80.0));
    assert_eq!(report.kills.len(), 1);

    let runtime_thread = std::thread::current().id();
    let callers = ocr.callers.lock().unwrap();
    assert!(!callers.is_empty());
    assert!(callers.iter().all(|id| *id != runtime_thread));
}

#[tokio::test]
async fn analysis_without_indicators_is_misuse() {
    let mut bundle = load_fixture();
    bundle.indicators = None;
    let err = analyzer(bundle).analyze().await.unwrap_err();
    assert!(matches!(err, InkframeError::Misuse { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn unknown_rule_skips_counts() {
    let mut bundle = load_fixture();
    for frame in &mut bundle.notifications.frames {
        frame
            .payload
            .notifications
            .retain(|n| n.kind.rule().is_none());
    }
    if let Some(indicators) = &mut bundle.indicators {
        for frame in &mut indicators.frames {
            frame.payload.indicator = None;
        }
    }

    let report = analyzer(bundle).analyze().await.unwrap();
    assert!(report.open.is_none());
    assert!(report.counts.is_empty());
    assert_eq!(report.kills.len(), 1);
    assert!(report.end.is_some());
}
