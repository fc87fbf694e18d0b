mod error;
mod params;
mod report;

pub use error::BacktestError;
pub use params::{BacktestRequest, RawBacktestParams};
pub use report::{format_timestamp, BacktestReport, CrossoverEntry};

use chrono::{DateTime, Utc};
use macross_domain::repositories::market_data::{BarQuery, MarketDataRepository};
use macross_domain::services::crossover::compute_crossover;
use macross_domain::services::pnl::simulate_pnl;
use macross_domain::value_objects::bar::closes;
use std::time::Instant;
use tracing::info_span;

/// Fetch, compute signal, simulate PnL and assemble the aligned report.
/// One provider call per invocation, no retries.
pub fn run_ma_crossover(
    request: &BacktestRequest,
    symbol: &str,
    market_data: &dyn MarketDataRepository,
) -> Result<BacktestReport, BacktestError> {
    let _span = info_span!(
        "run_ma_crossover",
        symbol = %symbol,
        interval = %request.interval,
        start = %request.start,
        end = %request.end,
        short_window = request.short_window,
        long_window = request.long_window,
        ma_type = request.ma_kind.as_str(),
        warmup = request.warmup
    )
    .entered();

    metrics::counter!("macross.backtest.requests_total", "interval" => request.interval.as_str())
        .increment(1);

    let outcome = execute(request, symbol, market_data, Utc::now());
    match &outcome {
        Ok(report) => tracing::info!(
            bars = report.len(),
            crossovers = report.crossovers.len(),
            total_pnl = report.pnl.last().copied().unwrap_or(0.0),
            "backtest complete"
        ),
        Err(err) => {
            metrics::counter!("macross.backtest.errors_total", "kind" => err.kind()).increment(1);
            match err {
                BacktestError::ProviderFailure(_) => tracing::warn!(error = %err, "backtest failed"),
                _ => tracing::info!(error = %err, "backtest rejected"),
            }
        }
    }
    outcome
}

fn execute(
    request: &BacktestRequest,
    symbol: &str,
    market_data: &dyn MarketDataRepository,
    now: DateTime<Utc>,
) -> Result<BacktestReport, BacktestError> {
    let query = BarQuery {
        symbol: symbol.to_string(),
        interval: request.interval,
        start: request.fetch_start_ts(),
        end: request.range_end_ts(),
    };
    warn_if_outside_lookback(&query, now);

    let stage_start = Instant::now();
    let history = market_data.load_bars(&query)?;
    metrics::histogram!("macross.backtest.load_bars_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    if history.bars.is_empty() {
        return Err(BacktestError::DataUnavailable(format!(
            "no {} bars for {} between {} and {}",
            request.interval, symbol, request.start, request.end
        )));
    }

    let stage_start = Instant::now();
    let closes = closes(&history.bars);
    let crossover = compute_crossover(&closes, &request.crossover_config());
    let pnl = simulate_pnl(&closes, &crossover.signal);

    let offset = if request.warmup {
        let range_start = request.range_start_ts();
        history
            .bars
            .iter()
            .position(|bar| bar.timestamp >= range_start)
            .ok_or_else(|| {
                BacktestError::DataUnavailable(format!(
                    "only warm-up bars returned before {}",
                    request.start
                ))
            })?
    } else {
        0
    };

    let report = report::assemble_report(request, &history, &crossover, &pnl, offset);
    metrics::histogram!("macross.backtest.compute_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    debug_assert!(report.is_aligned());

    tracing::debug!(
        fetched = history.bars.len(),
        returned = report.len(),
        warmup_bars = offset,
        "series assembled"
    );
    Ok(report)
}

fn warn_if_outside_lookback(query: &BarQuery, now: DateTime<Utc>) {
    let window_days = query.interval.max_lookback_days();
    let earliest = (now - chrono::Duration::days(window_days)).timestamp();
    if query.start < earliest {
        tracing::warn!(
            interval = %query.interval,
            window_days,
            "requested start is outside the provider lookback window; series may be empty or truncated"
        );
    }
}
