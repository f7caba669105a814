pub mod completions;
pub mod config;
pub mod rewards;
pub mod start;
pub mod status;

use timekeeper_core::storage::data_dir;
use timekeeper_core::{Config, RewardLedger};

/// Ledger at the configured locations.
fn open_ledger(config: &Config) -> Result<RewardLedger, Box<dyn std::error::Error>> {
    Ok(RewardLedger::new(config.ledger_paths(&data_dir()?)))
}
