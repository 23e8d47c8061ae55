//! Run event extraction on a battle directory.

use std::path::PathBuf;
use std::sync::Arc;

use inkframe_battle_model::{BattleBundle, BattleEvent};
use inkframe_common::{AnalyzerConfig, FrameClock};
use inkframe_event_core::{
    BattleAnalyzer, LampInspector, NoReinspection, RecordedLampInspector, RecordedOcr,
};

pub async fn run(
    path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(p) => AnalyzerConfig::load_strict(p)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?,
        None => AnalyzerConfig::default(),
    };
    if verbose {
        config.logging.level = "debug".to_string();
    }
    inkframe_common::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;
    if let Some(file) = &config.logging.file {
        println!("Logging to: {}", file.display());
    }

    println!("Analyzing battle at: {}", path.display());

    let bundle =
        BattleBundle::load(&path).map_err(|e| anyhow::anyhow!("Failed to load battle: {e}"))?;
    let lamps = bundle
        .lamps
        .ok_or_else(|| anyhow::anyhow!("Lamp detections not found in {}", path.display()))?;
    let indicators = bundle
        .indicators
        .ok_or_else(|| anyhow::anyhow!("Indicator results not found in {}", path.display()))?;

    let ocr = RecordedOcr::from_records(bundle.ocr);
    println!("  Loaded {} OCR readings", ocr.len());
    let inspector: Arc<dyn LampInspector> = match bundle.dense_lamps {
        Some(dense) => Arc::new(RecordedLampInspector::new(dense)),
        None => {
            tracing::info!("No dense lamp detections, short special charges are not re-inspected");
            Arc::new(NoReinspection)
        }
    };

    let clock = FrameClock::new(config.frame_rate);
    let analyzer = BattleAnalyzer::new(config, bundle.roster)
        .with_ocr(Arc::new(ocr))
        .with_inspector(inspector)
        .with_notifications(bundle.notifications)
        .with_lamps(lamps)
        .with_indicators(indicators);

    let report = analyzer
        .analyze()
        .await
        .map_err(|e| anyhow::anyhow!("Analysis failed: {e}"))?;

    let events = report.events();
    for event in &events {
        println!(
            "  [{} - {}] {}{}",
            clock.timecode(event.start_frame()),
            clock.timecode(event.end_frame()),
            event.label(),
            describe(event)
        );
    }

    let output = output.unwrap_or_else(|| path.join("events.jsonl"));
    let log = report.to_event_log()?;
    std::fs::write(&output, log)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", output.display()))?;

    println!("\n{} events written to: {}", events.len(), output.display());
    Ok(())
}

fn describe(event: &BattleEvent) -> String {
    match event {
        BattleEvent::BattleOpen(e) => format!(" rule={:?}", e.rule),
        BattleEvent::BattleResult(e) => format!(" {:?}", e.win_lose),
        BattleEvent::Count(e) => format!(" {:?} count={} earned={}", e.side, e.count, e.earned_value),
        BattleEvent::Kill(e) => format!(" {}", e.death_player.name),
        BattleEvent::Death(e) => format!(" {} ({:?})", e.death_player.name, e.reason_type),
        BattleEvent::SpecialWeapon(e) => format!(" {} {:?}", e.player.name, e.kind),
        BattleEvent::PlayerNumberBalance(e) => {
            format!(" {}v{} {:?}", e.team_number, e.enemy_number, e.balance_state)
        }
        BattleEvent::BattleEnd(_) => String::new(),
    }
}
