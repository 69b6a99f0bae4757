use crate::config::EngineConfig;
use crate::confirmation::{entry_confirmed, exit_confirmed};
use crate::models::{
    Bar, IndicatorSeries, PositionState, SignalKind, SimulationRun, Trade, TradeMode, TradeSide,
};
use crate::signals::{detect_crossovers, signal_kinds_by_index};
use chrono::NaiveDate;

/// Runs one complete Flat/Long walk over the bar sequence for a single
/// pair/mode combination. Pure: same inputs always yield the same ledger.
///
/// Index `t` ranges over `1..len-1`; the last bar is never evaluated since
/// both confirmation and execution look at bar `t+1`. An entry and an exit
/// are both checked in the same iteration, but the same-day dedup on
/// `last_trade_date` keeps them on distinct calendar dates.
pub fn simulate(
    bars: &[Bar],
    series: &IndicatorSeries,
    mode: TradeMode,
    config: &EngineConfig,
) -> SimulationRun {
    let mut trades: Vec<Trade> = Vec::new();
    let mut capital = config.starting_capital;
    let mut position = PositionState::Flat;
    let mut last_trade_date: Option<NaiveDate> = None;

    if bars.len() >= 2 {
        let kinds = signal_kinds_by_index(&detect_crossovers(series), bars.len());

        for t in 1..bars.len() - 1 {
            let signal = kinds[t];

            if matches!(position, PositionState::Flat)
                && signal == Some(SignalKind::BullishCross)
                && last_trade_date != Some(bars[t].date)
            {
                let passes = !mode.requires_confirmation()
                    || entry_confirmed(bars, t, config.confirmation_margin);
                if passes {
                    let entry_price = bars[t + 1].close + config.entry_offset;
                    let stop_loss = entry_price * config.stop_loss_multiplier;
                    let size = capital / entry_price;
                    trades.push(Trade {
                        side: TradeSide::Buy,
                        date: bars[t + 1].date,
                        price: entry_price,
                        confirmed: mode.requires_confirmation(),
                    });
                    position = PositionState::Long {
                        entry_price,
                        stop_loss,
                        size,
                    };
                    last_trade_date = Some(bars[t].date);
                }
            }

            if let PositionState::Long {
                entry_price,
                stop_loss,
                size,
            } = position
            {
                let should_exit = signal == Some(SignalKind::BearishCross)
                    || bars[t].close <= stop_loss;
                if should_exit && last_trade_date != Some(bars[t].date) {
                    let passes = !mode.requires_confirmation()
                        || exit_confirmed(bars, t, config.confirmation_margin);
                    if passes {
                        let exit_price = bars[t + 1].close - config.exit_offset;
                        capital += (exit_price - entry_price) * size;
                        trades.push(Trade {
                            side: TradeSide::Sell,
                            date: bars[t + 1].date,
                            price: exit_price,
                            confirmed: mode.requires_confirmation(),
                        });
                        position = PositionState::Flat;
                        last_trade_date = Some(bars[t].date);
                    }
                }
            }
        }
    }

    // An open position at the end of the series is abandoned, not
    // liquidated; only closed round trips move capital.
    let roi = (capital - config.starting_capital) / config.starting_capital * 100.0;
    SimulationRun {
        trades,
        final_capital: capital,
        roi,
    }
}
