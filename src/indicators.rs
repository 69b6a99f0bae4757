use crate::models::{Bar, EmaPair, IndicatorSeries};

pub fn calculate_ema(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema_values = Vec::with_capacity(prices.len());
    ema_values.push(prices[0]);

    for i in 1..prices.len() {
        let ema = (prices[i] * multiplier) + (ema_values[i - 1] * (1.0 - multiplier));
        ema_values.push(ema);
    }

    ema_values
}

/// Computes both EMA series for a candidate pair. Run once per pair; both
/// simulation modes reuse the result.
pub fn compute_pair_series(bars: &[Bar], pair: EmaPair) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    IndicatorSeries {
        ema_short: calculate_ema(&closes, pair.short),
        ema_long: calculate_ema(&closes, pair.long),
    }
}
