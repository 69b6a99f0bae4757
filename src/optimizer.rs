use crate::config::EngineConfig;
use crate::indicators::compute_pair_series;
use crate::models::{BacktestResult, Bar, EmaPair, SimulationRun, TradeMode};
use crate::simulator::simulate;
use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

struct PairTask {
    index: usize,
    pair: EmaPair,
}

struct PairTaskResult {
    index: usize,
    pair: EmaPair,
    confirmed: SimulationRun,
    unconfirmed: SimulationRun,
}

/// The two winning results of a grid sweep, one per trade mode.
pub struct GridOutcome {
    pub best_confirmed: BacktestResult,
    pub best_unconfirmed: BacktestResult,
}

/// Sweeps every candidate pair through the simulator in both modes and keeps
/// the ROI-maximizing pair per mode. Candidates are evaluated on a worker
/// pool; selection replays them in candidate order so a tie always keeps the
/// earliest pair regardless of scheduling.
pub fn run_grid_search(
    bars: &Arc<Vec<Bar>>,
    pairs: &[EmaPair],
    config: &EngineConfig,
) -> Result<GridOutcome> {
    if pairs.is_empty() {
        return Err(anyhow!("Grid search requires at least one candidate pair"));
    }

    let pair_count = pairs.len();
    info!("Running {} candidate backtests...", pair_count);

    let num_workers = std::cmp::min(pair_count, std::cmp::max(1, num_cpus::get()));
    info!("Using {} worker threads", num_workers);

    let (tx, rx): (Sender<PairTask>, Receiver<PairTask>) = bounded(pair_count);
    let (result_tx, result_rx): (Sender<PairTaskResult>, Receiver<PairTaskResult>) =
        bounded(pair_count);

    let mut handles = Vec::new();
    for _worker_id in 0..num_workers {
        let rx = rx.clone();
        let result_tx = result_tx.clone();
        let bars = Arc::clone(bars);
        let config = config.clone();

        let handle = thread::spawn(move || {
            while let Ok(task) = rx.recv() {
                let start_time = Instant::now();
                let series = compute_pair_series(&bars, task.pair);
                let confirmed = simulate(&bars, &series, TradeMode::Confirmed, &config);
                let unconfirmed = simulate(&bars, &series, TradeMode::Unconfirmed, &config);
                let duration = start_time.elapsed();

                info!(
                    "Worker finished pair {} in {:.0}ms. Confirmed ROI: {:.2}% ({} trades), Unconfirmed ROI: {:.2}% ({} trades)",
                    task.pair,
                    duration.as_secs_f64() * 1000.0,
                    confirmed.roi,
                    confirmed.trades.len(),
                    unconfirmed.roi,
                    unconfirmed.trades.len()
                );

                let outcome = PairTaskResult {
                    index: task.index,
                    pair: task.pair,
                    confirmed,
                    unconfirmed,
                };
                if result_tx.send(outcome).is_err() {
                    break;
                }
            }
        });
        handles.push(handle);
    }

    for (index, pair) in pairs.iter().enumerate() {
        tx.send(PairTask { index, pair: *pair })?;
    }

    drop(tx);

    let mut slots: Vec<Option<PairTaskResult>> = (0..pair_count).map(|_| None).collect();
    let mut completed = 0;
    let pb = ProgressBar::new(pair_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    while completed < pair_count {
        match result_rx.recv_timeout(std::time::Duration::from_millis(200)) {
            Ok(result) => {
                completed += 1;
                pb.set_position(completed as u64);
                let index = result.index;
                slots[index] = Some(result);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                warn!("Result channel closed unexpectedly. Some results may be lost.");
                break;
            }
        }
    }
    pb.finish_with_message("Grid search completed");

    for handle in handles {
        handle.join().unwrap();
    }

    let mut best_confirmed: Option<BacktestResult> = None;
    let mut best_unconfirmed: Option<BacktestResult> = None;

    for slot in slots {
        let result = slot.ok_or_else(|| anyhow!("A candidate pair produced no result"))?;
        replace_if_better(
            &mut best_confirmed,
            result.pair,
            TradeMode::Confirmed,
            result.confirmed,
        );
        replace_if_better(
            &mut best_unconfirmed,
            result.pair,
            TradeMode::Unconfirmed,
            result.unconfirmed,
        );
    }

    let best_confirmed =
        best_confirmed.ok_or_else(|| anyhow!("Grid search produced no confirmed result"))?;
    let best_unconfirmed =
        best_unconfirmed.ok_or_else(|| anyhow!("Grid search produced no unconfirmed result"))?;

    info!(
        "Best confirmed pair: {} with ROI {:.2}%; best unconfirmed pair: {} with ROI {:.2}%",
        best_confirmed.pair, best_confirmed.run.roi, best_unconfirmed.pair, best_unconfirmed.run.roi
    );

    Ok(GridOutcome {
        best_confirmed,
        best_unconfirmed,
    })
}

// Replacement only on strict improvement, so candidate order breaks ties.
fn replace_if_better(
    best: &mut Option<BacktestResult>,
    pair: EmaPair,
    mode: TradeMode,
    run: SimulationRun,
) {
    let improves = match best {
        Some(current) => run.roi > current.run.roi,
        None => true,
    };
    if improves {
        *best = Some(BacktestResult { pair, mode, run });
    }
}
