use crate::models::{Bar, BacktestError};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use log::info;
use serde::Deserialize;
use std::path::Path;

/// One row of an instrument's CSV file. Timestamps may carry a time-of-day
/// suffix; only the date component is used.
#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

fn parse_bar_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    // get() keeps a malformed multi-byte timestamp on the error path instead
    // of panicking on a non-boundary byte index.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .with_context(|| format!("Unparseable bar timestamp `{}`", raw))
}

/// Lists the tickers available under the data directory, one `{TICKER}.csv`
/// per instrument, in sorted order so sweeps are reproducible.
pub fn discover_tickers(data_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;

    let mut tickers = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", data_dir.display()))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            tickers.push(stem.to_string());
        }
    }

    tickers.sort();
    info!("Discovered {} instrument(s) in {}", tickers.len(), data_dir.display());
    Ok(tickers)
}

/// Loads and validates one instrument's bar sequence. Dates must be strictly
/// increasing and unique; violations fail the instrument, not the sweep.
pub fn load_bars(data_dir: &Path, ticker: &str) -> Result<Vec<Bar>, BacktestError> {
    let path = data_dir.join(format!("{}.csv", ticker));
    let mut reader = csv::Reader::from_path(&path).map_err(|e| BacktestError::BarSource {
        ticker: ticker.to_string(),
        source: anyhow!(e).context(format!("Failed to open {}", path.display())),
    })?;

    let mut bars: Vec<Bar> = Vec::new();
    for record in reader.deserialize::<BarRecord>() {
        let record = record.map_err(|e| BacktestError::BarSource {
            ticker: ticker.to_string(),
            source: anyhow!(e).context(format!("Malformed row in {}", path.display())),
        })?;
        let date = parse_bar_date(&record.timestamp).map_err(|e| BacktestError::BarSource {
            ticker: ticker.to_string(),
            source: e,
        })?;

        if let Some(last) = bars.last() {
            if date == last.date {
                return Err(BacktestError::DuplicateBar {
                    ticker: ticker.to_string(),
                    date,
                });
            }
            if date < last.date {
                return Err(BacktestError::OutOfOrderBar {
                    ticker: ticker.to_string(),
                    date,
                });
            }
        }

        bars.push(Bar {
            date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    if bars.is_empty() {
        return Err(BacktestError::EmptyBars {
            ticker: ticker.to_string(),
        });
    }

    info!("Loaded {} bars for {}", bars.len(), ticker);
    Ok(bars)
}
