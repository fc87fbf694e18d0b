use chrono::{Duration, Utc};
use macross_application::backtesting::{
    run_ma_crossover, BacktestError, BacktestRequest, RawBacktestParams,
};
use macross_application::config::StrategyConfig;
use macross_domain::repositories::market_data::{
    BarQuery, MarketDataError, MarketDataRepository, PriceHistory,
};
use macross_domain::value_objects::bar::Bar;
use macross_domain::value_objects::signal::Signal;
use std::cell::RefCell;

// 2024-04-01 00:00 America/New_York
const APR_1_2024: i64 = 1_711_944_000;
const HOUR: i64 = 3600;

#[derive(Default)]
struct FakeMarketDataRepo {
    history: PriceHistory,
    queries: RefCell<Vec<BarQuery>>,
}

impl FakeMarketDataRepo {
    fn with_closes(first_ts: i64, step: i64, closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(idx, close)| Bar::from_close(first_ts + idx as i64 * step, *close))
            .collect();
        Self {
            history: PriceHistory {
                symbol: "NQ=F".to_string(),
                exchange_timezone: Some("America/New_York".to_string()),
                bars,
            },
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl MarketDataRepository for FakeMarketDataRepo {
    fn load_bars(&self, query: &BarQuery) -> Result<PriceHistory, MarketDataError> {
        self.queries.borrow_mut().push(query.clone());
        let bars = self
            .history
            .bars
            .iter()
            .filter(|bar| bar.timestamp >= query.start && bar.timestamp < query.end)
            .cloned()
            .collect();
        Ok(PriceHistory {
            bars,
            ..self.history.clone()
        })
    }
}

/// Mimics the provider's intraday retention: ranges starting before the
/// interval's lookback window are refused.
struct WindowedProvider;

impl MarketDataRepository for WindowedProvider {
    fn load_bars(&self, query: &BarQuery) -> Result<PriceHistory, MarketDataError> {
        let earliest = (Utc::now() - Duration::days(query.interval.max_lookback_days())).timestamp();
        if query.start < earliest {
            return Err(MarketDataError::NoData(format!(
                "{} data not available for startTime={}",
                query.interval, query.start
            )));
        }
        let bars = (0..100)
            .map(|idx| Bar::from_close(query.start + idx * query.interval.step_seconds(), 100.0 + idx as f64))
            .filter(|bar| bar.timestamp < query.end)
            .collect();
        Ok(PriceHistory {
            symbol: query.symbol.clone(),
            exchange_timezone: None,
            bars,
        })
    }
}

struct FailingProvider;

impl MarketDataRepository for FailingProvider {
    fn load_bars(&self, _query: &BarQuery) -> Result<PriceHistory, MarketDataError> {
        Err(MarketDataError::Transport("connection reset".to_string()))
    }
}

fn request(params: &[(&str, &str)]) -> BacktestRequest {
    let mut raw = RawBacktestParams::default();
    for (key, value) in params {
        let value = Some(value.to_string());
        match *key {
            "start" => raw.start = value,
            "end" => raw.end = value,
            "short_window" => raw.short_window = value,
            "long_window" => raw.long_window = value,
            "interval" => raw.interval = value,
            "ma_type" => raw.ma_type = value,
            "warmup" => raw.warmup = value,
            other => panic!("unknown param {other}"),
        }
    }
    BacktestRequest::from_params(&raw, &StrategyConfig::default()).expect("valid request")
}

#[test]
fn hand_computed_example_end_to_end() {
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &[100.0, 110.0, 90.0, 95.0, 130.0]);
    let req = request(&[
        ("start", "2024-04-01"),
        ("end", "2024-04-01"),
        ("short_window", "2"),
        ("long_window", "3"),
    ]);

    let report = run_ma_crossover(&req, "NQ=F", &repo).expect("report");
    assert_eq!(report.len(), 5);
    assert!(report.is_aligned());
    assert_eq!(report.short_ma[0], None);
    assert_eq!(report.short_ma[1], Some(105.0));
    assert_eq!(report.long_ma[1], None);
    assert_eq!(report.long_ma[4], Some(105.0));
    assert_eq!(
        report.signal,
        vec![Signal::Flat, Signal::Flat, Signal::Flat, Signal::Flat, Signal::Long]
    );
    assert_eq!(report.pnl, vec![0.0; 5]);
    assert_eq!(report.timestamps[0], "2024-04-01T00:00:00-04:00");
    assert_eq!(report.interval, "1h");
    assert_eq!(report.ma_type, "sma");
    assert!(report.crossovers.is_empty());
}

#[test]
fn query_covers_inclusive_date_range() {
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &[1.0, 2.0, 3.0]);
    let req = request(&[("start", "2024-04-01"), ("end", "2024-04-03"), ("interval", "30m")]);
    run_ma_crossover(&req, "NQ=F", &repo).expect("report");

    let queries = repo.queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].symbol, "NQ=F");
    assert_eq!(queries[0].start, APR_1_2024);
    assert_eq!(queries[0].end, APR_1_2024 + 3 * 86_400);
}

#[test]
fn timestamps_and_bounds_follow_exchange_daylight_saving() {
    // 09:30 New York on 2024-01-15 (EST) and 2024-04-01 (EDT)
    let repo = FakeMarketDataRepo {
        history: PriceHistory {
            symbol: "NQ=F".to_string(),
            exchange_timezone: Some("America/New_York".to_string()),
            bars: vec![
                Bar::from_close(1_705_329_000, 17_000.0),
                Bar::from_close(1_711_978_200, 18_300.0),
            ],
        },
        queries: RefCell::new(Vec::new()),
    };
    let req = request(&[("start", "2024-01-15"), ("end", "2024-04-01")]);

    let report = run_ma_crossover(&req, "NQ=F", &repo).expect("report");
    assert_eq!(
        report.timestamps,
        vec!["2024-01-15T09:30:00-05:00", "2024-04-01T09:30:00-04:00"]
    );

    let queries = repo.queries.borrow();
    assert_eq!(queries[0].start, 1_705_294_800);
    assert_eq!(queries[0].end, APR_1_2024 + 86_400);
}

#[test]
fn configured_zone_renders_when_provider_names_none() {
    let mut repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &[1.0, 2.0]);
    repo.history.exchange_timezone = None;
    let req = request(&[("start", "2024-04-01"), ("end", "2024-04-01")]);
    let report = run_ma_crossover(&req, "NQ=F", &repo).expect("report");
    assert_eq!(report.timestamps[1], "2024-04-01T01:00:00-04:00");
}

#[test]
fn output_length_equals_fetched_bars() {
    let closes: Vec<f64> = (0..120).map(|i| 100.0 + ((i as f64) * 0.3).sin() * 5.0).collect();
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &closes);
    let req = request(&[
        ("start", "2024-04-01"),
        ("end", "2024-04-10"),
        ("short_window", "5"),
        ("long_window", "20"),
    ]);
    let report = run_ma_crossover(&req, "NQ=F", &repo).expect("report");
    assert_eq!(report.len(), closes.len());
    assert!(report.is_aligned());
    assert!(report.signal[..19].iter().all(|s| *s == Signal::Flat));
    assert!(!report.crossovers.is_empty());
    for entry in &report.crossovers {
        assert!(entry.position == "long" || entry.position == "flat");
    }
}

#[test]
fn identical_requests_are_idempotent() {
    let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i % 7) as f64 - (i % 3) as f64).collect();
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &closes);
    let req = request(&[
        ("start", "2024-04-01"),
        ("end", "2024-04-05"),
        ("short_window", "3"),
        ("long_window", "8"),
    ]);
    let first = run_ma_crossover(&req, "NQ=F", &repo).expect("first");
    let second = run_ma_crossover(&req, "NQ=F", &repo).expect("second");
    assert_eq!(first, second);
}

#[test]
fn inverted_windows_still_produce_a_report() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &closes);
    let req = request(&[
        ("start", "2024-04-01"),
        ("end", "2024-04-02"),
        ("short_window", "10"),
        ("long_window", "3"),
    ]);
    let report = run_ma_crossover(&req, "NQ=F", &repo).expect("report");
    assert_eq!(report.len(), 30);
    assert!(report.signal.iter().all(|s| *s == Signal::Flat));
    assert!(report.pnl.iter().all(|v| *v == 0.0));
}

#[test]
fn empty_provider_result_is_data_unavailable() {
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024, HOUR, &[]);
    let req = request(&[("start", "2024-04-01"), ("end", "2024-04-02")]);
    let err = run_ma_crossover(&req, "NQ=F", &repo).expect_err("unavailable");
    assert!(matches!(err, BacktestError::DataUnavailable(_)));
    assert_eq!(err.kind(), "data_unavailable");
}

#[test]
fn intraday_range_outside_lookback_window_is_data_unavailable() {
    let start = (Utc::now() - Duration::days(30)).date_naive();
    let end = start + Duration::days(2);
    let req = request(&[
        ("start", &start.format("%Y-%m-%d").to_string()),
        ("end", &end.format("%Y-%m-%d").to_string()),
        ("interval", "15m"),
    ]);

    let err = run_ma_crossover(&req, "NQ=F", &WindowedProvider).expect_err("outside window");
    match err {
        BacktestError::DataUnavailable(msg) => assert!(msg.contains("15m data not available")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn recent_intraday_range_is_served() {
    let start = (Utc::now() - Duration::days(2)).date_naive();
    let end = Utc::now().date_naive();
    let req = request(&[
        ("start", &start.format("%Y-%m-%d").to_string()),
        ("end", &end.format("%Y-%m-%d").to_string()),
        ("interval", "15m"),
        ("short_window", "2"),
        ("long_window", "4"),
    ]);

    let report = run_ma_crossover(&req, "NQ=F", &WindowedProvider).expect("report");
    assert!(report.is_aligned());
    assert!(!report.is_empty());
}

#[test]
fn provider_failure_is_surfaced() {
    let req = request(&[("start", "2024-04-01"), ("end", "2024-04-02")]);
    let err = run_ma_crossover(&req, "NQ=F", &FailingProvider).expect_err("failure");
    match err {
        BacktestError::ProviderFailure(msg) => assert!(msg.contains("connection reset")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn warmup_fetches_history_and_trims_to_requested_start() {
    // 4 warm-up hours before Apr 1, then 4 hours inside the range
    let closes = [100.0, 101.0, 102.0, 103.0, 110.0, 120.0, 90.0, 95.0];
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024 - 4 * HOUR, HOUR, &closes);
    let req = request(&[
        ("start", "2024-04-01"),
        ("end", "2024-04-01"),
        ("short_window", "2"),
        ("long_window", "4"),
        ("warmup", "true"),
    ]);

    let report = run_ma_crossover(&req, "NQ=F", &repo).expect("report");
    assert_eq!(repo.queries.borrow()[0].start, APR_1_2024 - 4 * HOUR);
    assert_eq!(report.len(), 4);
    assert!(report.is_aligned());
    assert_eq!(report.close, vec![110.0, 120.0, 90.0, 95.0]);
    // averages are already defined on the first returned bar
    assert!(report.short_ma[0].is_some());
    assert!(report.long_ma[0].is_some());
    assert_eq!(report.pnl[0], 0.0);
    assert_eq!(report.returns[0], 0.0);
    for idx in 1..report.len() {
        let held = if report.signal[idx - 1] == Signal::Long { 1.0 } else { 0.0 };
        let expected = report.pnl[idx - 1] + held * report.returns[idx];
        assert!((report.pnl[idx] - expected).abs() < 1e-12);
    }
}

#[test]
fn warmup_without_bars_in_range_is_data_unavailable() {
    let repo = FakeMarketDataRepo::with_closes(APR_1_2024 - 3 * HOUR, HOUR, &[1.0, 2.0, 3.0]);
    let req = request(&[
        ("start", "2024-04-01"),
        ("end", "2024-04-01"),
        ("short_window", "2"),
        ("long_window", "3"),
        ("warmup", "true"),
    ]);
    let err = run_ma_crossover(&req, "NQ=F", &repo).expect_err("nothing in range");
    assert!(matches!(err, BacktestError::DataUnavailable(_)));
}
