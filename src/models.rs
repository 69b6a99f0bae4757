use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Short/long EMA period pair. `new` is the validated construction path used
/// for anything configuration-supplied; the built-in candidate set satisfies
/// the invariant by inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmaPair {
    pub short: usize,
    pub long: usize,
}

impl EmaPair {
    pub fn new(short: usize, long: usize) -> Result<Self, BacktestError> {
        if short == 0 || short >= long {
            return Err(BacktestError::InvalidPair { short, long });
        }
        Ok(Self { short, long })
    }
}

impl fmt::Display for EmaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.short, self.long)
    }
}

/// EMA series for one candidate pair, aligned index-for-index with the bars
/// they were computed from.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub ema_short: Vec<f64>,
    pub ema_long: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    BullishCross,
    BearishCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalEvent {
    pub index: usize,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub side: TradeSide,
    pub date: NaiveDate,
    pub price: f64,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeMode {
    Confirmed,
    Unconfirmed,
}

impl TradeMode {
    /// Label used in the exported artifact and its file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeMode::Confirmed => "Confirmed",
            TradeMode::Unconfirmed => "Non_Confirmed",
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, TradeMode::Confirmed)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PositionState {
    Flat,
    Long {
        entry_price: f64,
        stop_loss: f64,
        size: f64,
    },
}

/// Outcome of one simulation run. A run with an empty ledger is a legitimate
/// zero-trade result, not an error; failures surface as `BacktestError`
/// before the simulator is ever reached.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub trades: Vec<Trade>,
    pub final_capital: f64,
    pub roi: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub pair: EmaPair,
    pub mode: TradeMode,
    pub run: SimulationRun,
}

/// Structured rendition of the exported artifact. Field-for-field equivalent
/// to the text format, with the buy-only and all-trades sections kept
/// separate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub ticker: String,
    pub short_ema: usize,
    pub long_ema: usize,
    pub mode: String,
    pub total_roi: f64,
    pub buy_trades: Vec<BuyTradeRecord>,
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyTradeRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<i64>,
    /// `None` while the position has no chronologically following sell.
    pub roi_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub side: TradeSide,
    pub date: NaiveDate,
    pub price: f64,
    pub volume: Option<i64>,
}

/// Per-instrument failure type. The runner aggregates these so one
/// instrument's problem never silently poisons the rest of the sweep.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("invalid EMA pair ({short}, {long}): short period must be positive and smaller than long")]
    InvalidPair { short: usize, long: usize },
    #[error("failed to load bars for {ticker}")]
    BarSource {
        ticker: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("bar dates for {ticker} are not strictly increasing at {date}")]
    OutOfOrderBar { ticker: String, date: NaiveDate },
    #[error("duplicate bar date {date} for {ticker}")]
    DuplicateBar { ticker: String, date: NaiveDate },
    #[error("no usable bars for {ticker}")]
    EmptyBars { ticker: String },
    #[error("grid search failed for {ticker}")]
    Sweep {
        ticker: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to export results for {ticker}")]
    Export {
        ticker: String,
        #[source]
        source: anyhow::Error,
    },
}
