use crate::models::Bar;

/// Entry confirmation for a bullish cross at `index`: passes when any of bar
/// index+1's open/high/low/close exceeds bar index's high by more than
/// `margin`. The any-of-four-fields rule means a single wick touch confirms;
/// kept as-is for artifact compatibility.
pub fn entry_confirmed(bars: &[Bar], index: usize, margin: f64) -> bool {
    let Some(next) = bars.get(index + 1) else {
        return false;
    };
    let threshold = bars[index].high + margin;
    next.open > threshold || next.high > threshold || next.low > threshold || next.close > threshold
}

/// Exit confirmation for a bearish cross or stop hit at `index`: passes when
/// any of bar index+1's open/high/low/close is below bar index's low by more
/// than `margin`.
pub fn exit_confirmed(bars: &[Bar], index: usize, margin: f64) -> bool {
    let Some(next) = bars.get(index + 1) else {
        return false;
    };
    let threshold = bars[index].low - margin;
    next.open < threshold || next.high < threshold || next.low < threshold || next.close < threshold
}
