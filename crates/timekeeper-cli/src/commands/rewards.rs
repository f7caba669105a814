use timekeeper_core::clock::TIMESTAMP_FORMAT;
use timekeeper_core::Config;

use super::open_ledger;

pub fn points() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = open_ledger(&config)?;
    println!("{}", ledger.total_points());
    Ok(())
}

pub fn history(json: bool, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = open_ledger(&config)?;
    let mut rows = ledger.rows()?;
    if let Some(limit) = limit {
        rows = rows.split_off(rows.len().saturating_sub(limit));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No early finishes recorded yet.");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{}  {:<24} ended {} (planned {})  {:>3} min early  +{} pts",
            row.session_start.format(TIMESTAMP_FORMAT),
            row.mode,
            row.actual_end.format("%H:%M:%S"),
            row.planned_end.format("%H:%M:%S"),
            row.early_minutes,
            row.points_awarded
        );
    }
    Ok(())
}
