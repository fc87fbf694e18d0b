use super::BacktestRequest;
use chrono::{DateTime, Offset};
use chrono_tz::Tz;
use macross_domain::repositories::market_data::PriceHistory;
use macross_domain::services::crossover::{crossover_events, CrossoverSeries};
use macross_domain::services::pnl::PnlSeries;
use macross_domain::value_objects::signal::Signal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossoverEntry {
    pub signal_time: String,
    pub entry_time: String,
    pub position: &'static str,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub prev_close: f64,
    pub entry_open: f64,
}

/// Index-aligned series ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub interval: &'static str,
    pub ma_type: &'static str,
    pub short_window: usize,
    pub long_window: usize,
    pub timestamps: Vec<String>,
    pub open: Vec<f64>,
    pub close: Vec<f64>,
    pub short_ma: Vec<Option<f64>>,
    pub long_ma: Vec<Option<f64>>,
    pub signal: Vec<Signal>,
    pub returns: Vec<f64>,
    pub pnl: Vec<f64>,
    pub crossovers: Vec<CrossoverEntry>,
}

impl BacktestReport {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        let n = self.close.len();
        [
            self.timestamps.len(),
            self.open.len(),
            self.short_ma.len(),
            self.long_ma.len(),
            self.signal.len(),
            self.returns.len(),
            self.pnl.len(),
        ]
        .iter()
        .all(|len| *len == n)
    }
}

/// RFC 3339 with the offset in force in `tz` at that instant.
pub fn format_timestamp(timestamp: i64, tz: Tz) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => {
            let local = dt.with_timezone(&tz);
            local.with_timezone(&local.offset().fix()).to_rfc3339()
        }
        None => timestamp.to_string(),
    }
}

/// The provider's named zone when it parses, otherwise `fallback`.
pub(crate) fn exchange_timezone(history: &PriceHistory, fallback: Tz) -> Tz {
    match history.exchange_timezone.as_deref() {
        Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::debug!(zone = name, fallback = %fallback, "unknown exchange timezone");
            fallback
        }),
        None => fallback,
    }
}

/// Builds the report from bars `offset..`; PnL restarts at 0 on the first kept bar.
pub(crate) fn assemble_report(
    request: &BacktestRequest,
    history: &PriceHistory,
    crossover: &CrossoverSeries,
    pnl: &PnlSeries,
    offset: usize,
) -> BacktestReport {
    let bars = &history.bars[offset..];
    let tz = exchange_timezone(history, request.timezone);
    let pnl = pnl.rebased_from(offset);

    let crossovers = crossover_events(crossover)
        .into_iter()
        .filter(|event| event.index >= offset)
        .map(|event| {
            let signal_bar = &history.bars[event.index];
            let entry_bar = &history.bars[event.entry_index];
            CrossoverEntry {
                signal_time: format_timestamp(signal_bar.timestamp, tz),
                entry_time: format_timestamp(entry_bar.timestamp, tz),
                position: event.position.as_str(),
                short_ma: event.short_ma,
                long_ma: event.long_ma,
                prev_close: signal_bar.close,
                entry_open: entry_bar.open,
            }
        })
        .collect();

    BacktestReport {
        symbol: history.symbol.clone(),
        interval: request.interval.as_str(),
        ma_type: request.ma_kind.as_str(),
        short_window: request.short_window,
        long_window: request.long_window,
        timestamps: bars
            .iter()
            .map(|bar| format_timestamp(bar.timestamp, tz))
            .collect(),
        open: bars.iter().map(|bar| bar.open).collect(),
        close: bars.iter().map(|bar| bar.close).collect(),
        short_ma: crossover.short_ma[offset..].to_vec(),
        long_ma: crossover.long_ma[offset..].to_vec(),
        signal: crossover.signal[offset..].to_vec(),
        returns: pnl.returns,
        pnl: pnl.pnl,
        crossovers,
    }
}

#[cfg(test)]
mod tests {
    use super::{exchange_timezone, format_timestamp};
    use chrono_tz::America::New_York;
    use chrono_tz::Tz;
    use macross_domain::repositories::market_data::PriceHistory;

    #[test]
    fn timestamps_follow_daylight_saving() {
        // 09:30 EST and 09:30 EDT
        assert_eq!(
            format_timestamp(1_705_329_000, New_York),
            "2024-01-15T09:30:00-05:00"
        );
        assert_eq!(
            format_timestamp(1_711_978_200, New_York),
            "2024-04-01T09:30:00-04:00"
        );
        assert_eq!(format_timestamp(0, Tz::UTC), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn provider_zone_wins_and_unknown_names_fall_back() {
        let mut history = PriceHistory {
            exchange_timezone: Some("America/Chicago".to_string()),
            ..PriceHistory::default()
        };
        assert_eq!(exchange_timezone(&history, New_York), chrono_tz::America::Chicago);

        history.exchange_timezone = Some("EST5EDT-ish".to_string());
        assert_eq!(exchange_timezone(&history, New_York), New_York);

        history.exchange_timezone = None;
        assert_eq!(exchange_timezone(&history, Tz::UTC), Tz::UTC);
    }
}
