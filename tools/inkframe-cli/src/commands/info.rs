//! Show battle directory information.

use std::path::PathBuf;

use inkframe_battle_model::{BattleBundle, FrameSeq, Side};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let bundle =
        BattleBundle::load(&path).map_err(|e| anyhow::anyhow!("Failed to load battle: {e}"))?;

    println!("Battle: {}", path.display());
    if let Some((start, end)) = bundle.frame_range() {
        println!("  Frames: {start}..={end}");
    }
    println!();

    println!("Roster:");
    for side in [Side::Team, Side::Enemy] {
        let names: Vec<&str> = bundle
            .roster
            .players(side)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        println!("  {:?}: {}", side, names.join(", "));
    }
    if let Some(main) = bundle.roster.main_player() {
        println!("  Main player: {}", main.name);
    }
    println!();

    println!("Inputs:");
    println!("  Notifications: {}", describe(&bundle.notifications));
    match &bundle.lamps {
        Some(lamps) => println!("  Lamps: {}", describe(lamps)),
        None => println!("  Lamps: missing"),
    }
    match &bundle.indicators {
        Some(indicators) => println!("  Indicators: {}", describe(indicators)),
        None => println!("  Indicators: missing"),
    }
    println!("  OCR readings: {}", bundle.ocr.len());
    match &bundle.dense_lamps {
        Some(dense) => println!("  Dense lamps: {}", describe(dense)),
        None => println!("  Dense lamps: none (no re-inspection)"),
    }

    Ok(())
}

fn describe<T>(seq: &FrameSeq<T>) -> String {
    match (seq.first_index(), seq.last_index()) {
        (Some(first), Some(last)) => format!(
            "{} frames ({first}..={last}, interval {})",
            seq.len(),
            seq.interval
        ),
        _ => "empty".to_string(),
    }
}
