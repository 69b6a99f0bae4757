use crate::config::{EngineConfig, RunnerConfig};
use crate::data_context::{discover_tickers, load_bars};
use crate::export::{write_artifacts, BarVolumeSource};
use crate::indicators::compute_pair_series;
use crate::models::{BacktestError, BacktestResult, EmaPair, TradeMode};
use crate::optimizer::run_grid_search;
use crate::simulator::simulate;
use anyhow::{anyhow, Result};
use log::{info, warn};
use std::sync::Arc;

/// Sweep outcome: which instruments produced artifacts and which failed.
/// Partial success is the expected shape of a multi-instrument run.
pub struct SweepSummary {
    pub succeeded: Vec<String>,
    pub failures: Vec<(String, BacktestError)>,
}

fn backtest_instrument(
    ticker: &str,
    config: &RunnerConfig,
    engine: &EngineConfig,
) -> Result<(), BacktestError> {
    let bars = Arc::new(load_bars(&config.data_dir, ticker)?);
    let volumes = BarVolumeSource::new(&bars);

    let outcome =
        run_grid_search(&bars, &config.pairs, engine).map_err(|e| BacktestError::Sweep {
            ticker: ticker.to_string(),
            source: e,
        })?;

    for result in [&outcome.best_confirmed, &outcome.best_unconfirmed] {
        write_artifacts(&config.output_dir, ticker, result, &volumes, config.write_json)
            .map_err(|e| BacktestError::Export {
                ticker: ticker.to_string(),
                source: e,
            })?;
    }

    Ok(())
}

/// Backtests every discovered instrument, writing two artifacts each. One
/// instrument's failure is logged and collected; it never blocks the rest
/// unless `halt_on_error` is set.
pub fn run_sweep(config: &RunnerConfig, engine: &EngineConfig) -> Result<SweepSummary> {
    let tickers = discover_tickers(&config.data_dir)?;
    if tickers.is_empty() {
        return Err(anyhow!(
            "No CSV bar files found in {}",
            config.data_dir.display()
        ));
    }

    let mut succeeded = Vec::new();
    let mut failures: Vec<(String, BacktestError)> = Vec::new();

    for ticker in tickers {
        info!("Backtesting {}", ticker);
        match backtest_instrument(&ticker, config, engine) {
            Ok(()) => succeeded.push(ticker),
            Err(error) => {
                if config.halt_on_error {
                    return Err(anyhow!(error).context(format!("Backtest failed for {}", ticker)));
                }
                warn!("Skipping {}: {}", ticker, error);
                failures.push((ticker, error));
            }
        }
    }

    if failures.is_empty() {
        info!("Sweep completed: {} instrument(s)", succeeded.len());
    } else {
        warn!(
            "Sweep completed with {} failure(s) out of {} instrument(s)",
            failures.len(),
            succeeded.len() + failures.len()
        );
    }

    Ok(SweepSummary {
        succeeded,
        failures,
    })
}

/// Runs one instrument against one explicit pair in both modes, without
/// touching the grid or writing artifacts. Used by the single-backtest
/// command for quick inspection.
pub fn run_single_pair(
    config: &RunnerConfig,
    engine: &EngineConfig,
    ticker: &str,
    pair: EmaPair,
) -> Result<(BacktestResult, BacktestResult)> {
    let bars = load_bars(&config.data_dir, ticker)?;
    let series = compute_pair_series(&bars, pair);

    let confirmed = BacktestResult {
        pair,
        mode: TradeMode::Confirmed,
        run: simulate(&bars, &series, TradeMode::Confirmed, engine),
    };
    let unconfirmed = BacktestResult {
        pair,
        mode: TradeMode::Unconfirmed,
        run: simulate(&bars, &series, TradeMode::Unconfirmed, engine),
    };
    Ok((confirmed, unconfirmed))
}
