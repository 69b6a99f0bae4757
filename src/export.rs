use crate::models::{
    BacktestReport, BacktestResult, Bar, BuyTradeRecord, Trade, TradeRecord, TradeSide,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Volume source keyed by trading date. A missing date degrades to the
/// `N/A` sentinel in the artifact; it never fails the export.
pub trait VolumeLookup {
    fn volume_at(&self, date: NaiveDate) -> Option<i64>;
}

/// Volume lookup backed by the instrument's own bar sequence.
pub struct BarVolumeSource {
    volumes: HashMap<NaiveDate, i64>,
}

impl BarVolumeSource {
    pub fn new(bars: &[Bar]) -> Self {
        Self {
            volumes: bars.iter().map(|bar| (bar.date, bar.volume)).collect(),
        }
    }
}

impl VolumeLookup for BarVolumeSource {
    fn volume_at(&self, date: NaiveDate) -> Option<i64> {
        self.volumes.get(&date).copied()
    }
}

fn format_volume(volume: Option<i64>) -> String {
    match volume {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

/// A buy's ROI comes from the immediately following ledger entry only, and
/// only when that entry is a sell. Anything else leaves the buy pending.
fn closing_roi(trades: &[Trade], buy_index: usize) -> Option<f64> {
    let buy = &trades[buy_index];
    match trades.get(buy_index + 1) {
        Some(next) if next.side == TradeSide::Sell => {
            Some((next.price - buy.price) / buy.price * 100.0)
        }
        _ => None,
    }
}

/// Renders the winning result as the text artifact consumed downstream.
/// Field order and section headers are load-bearing for its re-parsers.
pub fn render_report(
    ticker: &str,
    result: &BacktestResult,
    volumes: &dyn VolumeLookup,
) -> String {
    let mode = result.mode.as_str();
    let pair = result.pair;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Best EMA Combo for {}: Short EMA = {}, Long EMA = {}",
        ticker, pair.short, pair.long
    );
    let _ = writeln!(out, "Total ROI ({} Trades): {:.2}%", mode, result.run.roi);
    out.push('\n');

    out.push_str("Buy Trades Executed:\n");
    for (i, trade) in result.run.trades.iter().enumerate() {
        if trade.side != TradeSide::Buy {
            continue;
        }
        let roi_value = match closing_roi(&result.run.trades, i) {
            Some(pct) => format!("{:.2}%", pct),
            None => "Pending".to_string(),
        };
        let _ = writeln!(
            out,
            "BUY at {} with price {:.2}, Volume = {}, ROI = {}, {}, Short EMA = {}, Long EMA = {}",
            trade.date,
            trade.price,
            format_volume(volumes.volume_at(trade.date)),
            roi_value,
            mode,
            pair.short,
            pair.long
        );
    }

    out.push_str("\nTrades Executed:\n");
    for trade in &result.run.trades {
        let _ = writeln!(
            out,
            "{} at {} with price {:.2}, Volume = {}",
            trade.side.as_str(),
            trade.date,
            trade.price,
            format_volume(volumes.volume_at(trade.date))
        );
    }

    out
}

/// Structured counterpart of the text artifact, for consumers that prefer
/// JSON over re-parsing the fixed-format text.
pub fn build_report(
    ticker: &str,
    result: &BacktestResult,
    volumes: &dyn VolumeLookup,
) -> BacktestReport {
    let buy_trades = result
        .run
        .trades
        .iter()
        .enumerate()
        .filter(|(_, trade)| trade.side == TradeSide::Buy)
        .map(|(i, trade)| BuyTradeRecord {
            date: trade.date,
            price: trade.price,
            volume: volumes.volume_at(trade.date),
            roi_percent: closing_roi(&result.run.trades, i),
        })
        .collect();

    let trades = result
        .run
        .trades
        .iter()
        .map(|trade| TradeRecord {
            side: trade.side,
            date: trade.date,
            price: trade.price,
            volume: volumes.volume_at(trade.date),
        })
        .collect();

    BacktestReport {
        ticker: ticker.to_string(),
        short_ema: result.pair.short,
        long_ema: result.pair.long,
        mode: result.mode.as_str().to_string(),
        total_roi: result.run.roi,
        buy_trades,
        trades,
    }
}

pub fn artifact_path(output_dir: &Path, ticker: &str, result: &BacktestResult) -> PathBuf {
    output_dir.join(format!("{}_{}_EMA_Combo.txt", ticker, result.mode.as_str()))
}

/// Writes the text artifact (and optionally its JSON sibling) for one
/// winning result. I/O failures surface to the caller; they are scoped to
/// this instrument and mode only.
pub fn write_artifacts(
    output_dir: &Path,
    ticker: &str,
    result: &BacktestResult,
    volumes: &dyn VolumeLookup,
    write_json: bool,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let text_path = artifact_path(output_dir, ticker, result);
    fs::write(&text_path, render_report(ticker, result, volumes))
        .with_context(|| format!("Failed to write {}", text_path.display()))?;
    info!("Saved {}", text_path.display());

    if write_json {
        let report = build_report(ticker, result, volumes);
        let json_path = text_path.with_extension("json");
        let body = serde_json::to_string_pretty(&report)
            .with_context(|| format!("Failed to serialize report for {}", ticker))?;
        fs::write(&json_path, body)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("Saved {}", json_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{build_report, render_report, BarVolumeSource, VolumeLookup};
    use crate::models::{
        BacktestResult, Bar, EmaPair, SimulationRun, Trade, TradeMode, TradeSide,
    };
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    fn bar(n: u32, volume: i64) -> Bar {
        Bar {
            date: day(n),
            open: 10.0,
            high: 10.5,
            low: 9.5,
            close: 10.0,
            volume,
        }
    }

    fn result_with_trades(trades: Vec<Trade>, roi: f64) -> BacktestResult {
        BacktestResult {
            pair: EmaPair::new(12, 26).unwrap(),
            mode: TradeMode::Confirmed,
            run: SimulationRun {
                trades,
                final_capital: 100_000.0 * (1.0 + roi / 100.0),
                roi,
            },
        }
    }

    fn trade(side: TradeSide, n: u32, price: f64) -> Trade {
        Trade {
            side,
            date: day(n),
            price,
            confirmed: true,
        }
    }

    #[test]
    fn report_layout_matches_consumer_contract() {
        let bars = vec![bar(3, 1_200), bar(5, 1_500)];
        let volumes = BarVolumeSource::new(&bars);
        let result = result_with_trades(
            vec![
                trade(TradeSide::Buy, 3, 10.01),
                trade(TradeSide::Sell, 5, 11.99),
            ],
            1.5,
        );

        let text = render_report("AAPL", &result, &volumes);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Best EMA Combo for AAPL: Short EMA = 12, Long EMA = 26"
        );
        assert_eq!(lines[1], "Total ROI (Confirmed Trades): 1.50%");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Buy Trades Executed:");
        assert_eq!(
            lines[4],
            "BUY at 2024-01-03 with price 10.01, Volume = 1200, ROI = 19.78%, Confirmed, Short EMA = 12, Long EMA = 26"
        );
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "Trades Executed:");
        assert_eq!(lines[7], "BUY at 2024-01-03 with price 10.01, Volume = 1200");
        assert_eq!(
            lines[8],
            "SELL at 2024-01-05 with price 11.99, Volume = 1500"
        );
    }

    #[test]
    fn open_buy_renders_pending_roi() {
        let volumes = BarVolumeSource::new(&[bar(3, 900)]);
        let result = result_with_trades(vec![trade(TradeSide::Buy, 3, 10.01)], 0.0);

        let text = render_report("MSFT", &result, &volumes);
        assert!(text.contains("ROI = Pending"));
    }

    #[test]
    fn missing_volume_degrades_to_sentinel() {
        // Ledger date absent from the volume source.
        let volumes = BarVolumeSource::new(&[bar(9, 700)]);
        let result = result_with_trades(vec![trade(TradeSide::Buy, 3, 10.01)], 0.0);

        let text = render_report("TSLA", &result, &volumes);
        assert!(text.contains("Volume = N/A"));
        assert!(volumes.volume_at(day(3)).is_none());
    }

    #[test]
    fn buy_roi_pairs_only_with_immediately_following_sell() {
        // Buy, buy, sell: the first buy's next entry is a buy, so it stays
        // pending even though a later sell exists.
        let volumes = BarVolumeSource::new(&[]);
        let result = result_with_trades(
            vec![
                trade(TradeSide::Buy, 3, 10.0),
                trade(TradeSide::Buy, 5, 10.5),
                trade(TradeSide::Sell, 7, 12.0),
            ],
            1.0,
        );

        let report = build_report("NVDA", &result, &volumes);
        assert_eq!(report.buy_trades.len(), 2);
        assert!(report.buy_trades[0].roi_percent.is_none());
        let second = report.buy_trades[1].roi_percent.expect("closed buy");
        assert!((second - ((12.0 - 10.5) / 10.5 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn structured_report_mirrors_text_fields() {
        let bars = vec![bar(3, 1_200), bar(5, 1_500)];
        let volumes = BarVolumeSource::new(&bars);
        let result = result_with_trades(
            vec![
                trade(TradeSide::Buy, 3, 10.01),
                trade(TradeSide::Sell, 5, 11.99),
            ],
            1.5,
        );

        let report = build_report("AAPL", &result, &volumes);
        assert_eq!(report.ticker, "AAPL");
        assert_eq!(report.short_ema, 12);
        assert_eq!(report.long_ema, 26);
        assert_eq!(report.mode, "Confirmed");
        assert_eq!(report.buy_trades.len(), 1);
        assert_eq!(report.trades.len(), 2);
        assert_eq!(report.trades[1].volume, Some(1_500));
    }
}
