use crate::models::{IndicatorSeries, SignalEvent, SignalKind};

/// Flags crossover events between the short and long EMA series. Index 0 has
/// no predecessor and never signals; the two conditions are mutually
/// exclusive at any index by construction.
pub fn detect_crossovers(series: &IndicatorSeries) -> Vec<SignalEvent> {
    let len = series.ema_short.len().min(series.ema_long.len());
    let mut events = Vec::new();

    for t in 1..len {
        let short = series.ema_short[t];
        let long = series.ema_long[t];
        let prev_short = series.ema_short[t - 1];
        let prev_long = series.ema_long[t - 1];

        if short > long && prev_short <= prev_long {
            events.push(SignalEvent {
                index: t,
                kind: SignalKind::BullishCross,
            });
        } else if short < long && prev_short >= prev_long {
            events.push(SignalEvent {
                index: t,
                kind: SignalKind::BearishCross,
            });
        }
    }

    events
}

/// Expands events into a per-index lookup aligned with the bar sequence.
pub fn signal_kinds_by_index(events: &[SignalEvent], len: usize) -> Vec<Option<SignalKind>> {
    let mut kinds = vec![None; len];
    for event in events {
        if event.index < len {
            kinds[event.index] = Some(event.kind);
        }
    }
    kinds
}
