use crate::models::EmaPair;
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Candidate EMA period pairs swept by the grid optimizer, in selection
/// tie-break order.
pub const CANDIDATE_EMA_PERIODS: [(usize, usize); 11] = [
    (12, 26),  // Commonly used in MACD
    (9, 21),   // Short-term momentum
    (20, 50),  // Medium-term trend
    (50, 200), // Long-term trend reversal (Golden Cross/Death Cross)
    (10, 30),  // Aggressive short-term focus
    (15, 45),  // Balanced short-to-medium trend
    (18, 200), // Short-to-medium term momentum
    (18, 100), // Mid-to-long term trend reversal
    (30, 90),  // Slower trends
    (5, 15),   // Scalping strategy
    (100, 200), // Very long-term strategy
];

pub fn default_candidate_pairs() -> Vec<EmaPair> {
    CANDIDATE_EMA_PERIODS
        .iter()
        .map(|&(short, long)| EmaPair { short, long })
        .collect()
}

/// Parses a user-supplied pair list such as `12:26,9:21`. Malformed pairs
/// (including short >= long) are rejected here, before any simulation runs.
pub fn parse_pairs(raw: &str) -> Result<Vec<EmaPair>> {
    let mut pairs = Vec::new();

    for part in raw.split(',') {
        let entry = part.trim();
        if entry.is_empty() {
            continue;
        }
        let (short_raw, long_raw) = entry
            .split_once(':')
            .ok_or_else(|| anyhow!("Pair `{}` must use the short:long form", entry))?;
        let short = short_raw
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow!("Pair `{}` has a non-integer short period", entry))?;
        let long = long_raw
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow!("Pair `{}` has a non-integer long period", entry))?;
        pairs.push(EmaPair::new(short, long)?);
    }

    if pairs.is_empty() {
        return Err(anyhow!("Pair list must contain at least one short:long pair"));
    }

    Ok(pairs)
}

/// Fixed per-run trading constants.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub starting_capital: f64,
    /// Added to the next bar's close on entry.
    pub entry_offset: f64,
    /// Subtracted from the next bar's close on exit.
    pub exit_offset: f64,
    /// Stop loss = entry price x this multiplier, fixed at entry.
    pub stop_loss_multiplier: f64,
    /// Margin the next bar must clear for a confirmation to pass.
    pub confirmation_margin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_capital: 100_000.0,
            entry_offset: 0.01,
            exit_offset: 0.01,
            stop_loss_multiplier: 0.9,
            confirmation_margin: 0.01,
        }
    }
}

/// Sweep-level configuration: explicit handles to the bar-source directory
/// and the artifact destination, plus the caller-level failure policy.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pairs: Vec<EmaPair>,
    pub write_json: bool,
    /// When true the first instrument failure aborts the sweep; otherwise
    /// failures are collected and reported while the sweep continues.
    pub halt_on_error: bool,
}
