use macross_domain::repositories::market_data::{
    BarQuery, MarketDataError, MarketDataRepository, PriceHistory,
};
use macross_domain::value_objects::bar::Bar;
use macross_domain::value_objects::interval::Interval;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl ChartError {
    fn describe(&self) -> String {
        match self.description.as_deref() {
            Some(desc) if !desc.trim().is_empty() => format!("{}: {}", self.code, desc.trim()),
            _ => self.code.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, rename = "exchangeTimezoneName")]
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance v8 chart API client. One request per `load_bars` call, no retries.
pub struct YahooChartClient {
    pub base_url: String,
    pub timeout_ms: u64,
    client: Client,
}

impl YahooChartClient {
    pub fn new(base_url: String, timeout_ms: u64, user_agent: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(user_agent)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            base_url,
            timeout_ms,
            client,
        })
    }

    fn chart_endpoint(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    fn fetch(&self, endpoint: &str, query: &BarQuery) -> Result<PriceHistory, MarketDataError> {
        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("period1", query.start.to_string()),
                ("period2", query.end.to_string()),
                ("interval", provider_interval(query.interval).to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .map_err(|err| MarketDataError::Transport(format!("chart request failed: {err}")))?;

        let status = response.status();
        let body = response.text().map_err(|err| {
            MarketDataError::Transport(format!("failed to read chart response: {err}"))
        })?;

        if status.is_success() {
            let envelope: ChartEnvelope = serde_json::from_str(&body).map_err(|err| {
                MarketDataError::Decode(format!("failed to parse chart response: {err}"))
            })?;
            return history_from_chart(envelope, &query.symbol);
        }

        // Unknown symbols and ranges outside the intraday window come back as
        // 404/422 with a structured error body.
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(&body) {
                if let Some(error) = envelope.chart.error {
                    return Err(MarketDataError::NoData(error.describe()));
                }
            }
        }

        Err(MarketDataError::Status {
            status: status.as_u16(),
            message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }
}

impl MarketDataRepository for YahooChartClient {
    fn load_bars(&self, query: &BarQuery) -> Result<PriceHistory, MarketDataError> {
        let endpoint = self.chart_endpoint(&query.symbol);
        let span = tracing::info_span!(
            "infra.yahoo.load_bars",
            endpoint = %endpoint,
            interval = %query.interval,
            period1 = query.start,
            period2 = query.end,
            timeout_ms = self.timeout_ms
        );
        let _enter = span.enter();

        metrics::counter!("macross.infra.yahoo.requests_total", "interval" => query.interval.as_str())
            .increment(1);
        let start = Instant::now();
        let outcome = self.fetch(&endpoint, query);

        let result_label = match &outcome {
            Ok(_) => "ok",
            Err(MarketDataError::NoData(_)) => "no_data",
            Err(_) => "err",
        };
        metrics::histogram!(
            "macross.infra.yahoo.call_ms",
            "interval" => query.interval.as_str(),
            "result" => result_label
        )
        .record(start.elapsed().as_millis() as f64);

        match &outcome {
            Ok(history) => tracing::debug!(bars = history.bars.len(), "chart fetched"),
            Err(MarketDataError::NoData(reason)) => {
                tracing::info!(reason = %reason, "provider has no bars for range")
            }
            Err(err) => {
                metrics::counter!("macross.infra.yahoo.errors_total", "interval" => query.interval.as_str())
                    .increment(1);
                tracing::warn!(error = %err, "chart request failed");
            }
        }

        outcome
    }
}

fn provider_interval(interval: Interval) -> &'static str {
    match interval {
        Interval::FifteenMinutes => "15m",
        Interval::ThirtyMinutes => "30m",
        Interval::OneHour => "60m",
    }
}

fn value_at(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values
        .get(idx)
        .copied()
        .flatten()
        .filter(|v| v.is_finite())
}

fn history_from_chart(
    envelope: ChartEnvelope,
    requested_symbol: &str,
) -> Result<PriceHistory, MarketDataError> {
    if let Some(error) = envelope.chart.error {
        return Err(MarketDataError::NoData(error.describe()));
    }

    let Some(result) = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(PriceHistory {
            symbol: requested_symbol.to_string(),
            exchange_timezone: None,
            bars: Vec::new(),
        });
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars_by_ts: BTreeMap<i64, Bar> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;
    for (idx, timestamp) in result.timestamp.iter().copied().enumerate() {
        let Some(close) = value_at(&quote.close, idx).filter(|c| *c > 0.0) else {
            dropped += 1;
            continue;
        };
        let open = value_at(&quote.open, idx).unwrap_or(close);
        let bar = Bar {
            timestamp,
            open,
            high: value_at(&quote.high, idx).unwrap_or(open.max(close)),
            low: value_at(&quote.low, idx).unwrap_or(open.min(close)),
            close,
            volume: value_at(&quote.volume, idx).unwrap_or(0.0),
        };
        if bars_by_ts.insert(timestamp, bar).is_some() {
            duplicates += 1;
        }
    }

    if dropped > 0 || duplicates > 0 {
        tracing::debug!(dropped, duplicates, "normalized chart rows");
    }

    Ok(PriceHistory {
        symbol: result
            .meta
            .symbol
            .unwrap_or_else(|| requested_symbol.to_string()),
        exchange_timezone: result
            .meta
            .exchange_timezone_name
            .filter(|name| !name.trim().is_empty()),
        bars: bars_by_ts.into_values().collect(),
    })
}
