use super::BacktestError;
use crate::config::StrategyConfig;
use chrono::{Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use macross_domain::services::crossover::CrossoverConfig;
use macross_domain::services::indicators::MovingAverageKind;
use macross_domain::value_objects::interval::Interval;
use serde::Deserialize;

const SECONDS_PER_DAY: i64 = 86_400;

/// Query parameters exactly as received; everything is validated in
/// [`BacktestRequest::from_params`] so failures share one error shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBacktestParams {
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(alias = "ma_20")]
    pub short_window: Option<String>,
    #[serde(alias = "ma_50")]
    pub long_window: Option<String>,
    pub interval: Option<String>,
    pub ma_type: Option<String>,
    pub warmup: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub short_window: usize,
    pub long_window: usize,
    pub interval: Interval,
    pub ma_kind: MovingAverageKind,
    pub warmup: bool,
    /// Zone whose calendar days `start` and `end` name.
    pub timezone: Tz,
}

impl BacktestRequest {
    pub fn from_params(
        raw: &RawBacktestParams,
        defaults: &StrategyConfig,
    ) -> Result<Self, BacktestError> {
        let start = parse_date("start", raw.start.as_deref())?;
        let end = parse_date("end", raw.end.as_deref())?;
        if start > end {
            return Err(BacktestError::InvalidParameters(format!(
                "start ({start}) must not be after end ({end})"
            )));
        }

        let short_window = parse_window(
            "short_window",
            raw.short_window.as_deref(),
            defaults.short_window,
        )?;
        let long_window = parse_window(
            "long_window",
            raw.long_window.as_deref(),
            defaults.long_window,
        )?;

        let interval = match raw.interval.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(value) => Interval::parse(value),
            None => defaults.interval(),
        }
        .map_err(BacktestError::InvalidParameters)?;

        let ma_kind = match non_empty(raw.ma_type.as_deref()) {
            Some(value) => {
                MovingAverageKind::parse(value).map_err(BacktestError::InvalidParameters)?
            }
            None => defaults.ma_type,
        };

        let warmup = parse_flag("warmup", raw.warmup.as_deref())?;
        let timezone = defaults
            .timezone()
            .map_err(BacktestError::InvalidParameters)?;

        Ok(Self {
            start,
            end,
            short_window,
            long_window,
            interval,
            ma_kind,
            warmup,
            timezone,
        })
    }

    pub fn crossover_config(&self) -> CrossoverConfig {
        CrossoverConfig {
            short_window: self.short_window,
            long_window: self.long_window,
            kind: self.ma_kind,
        }
    }

    /// Local midnight opening `start` in the exchange zone.
    pub fn range_start_ts(&self) -> i64 {
        local_midnight(self.start, self.timezone)
    }

    /// Local midnight closing `end`; days are 23 or 25 hours across DST changes.
    pub fn range_end_ts(&self) -> i64 {
        match self.end.checked_add_days(Days::new(1)) {
            Some(next) => local_midnight(next, self.timezone),
            None => local_midnight(self.end, self.timezone).saturating_add(SECONDS_PER_DAY),
        }
    }

    /// Start of the provider query; reaches back one long window when warm-up is on.
    pub fn fetch_start_ts(&self) -> i64 {
        if !self.warmup {
            return self.range_start_ts();
        }
        let bars = i64::try_from(self.short_window.max(self.long_window)).unwrap_or(i64::MAX);
        let lookback = bars.saturating_mul(self.interval.step_seconds());
        self.range_start_ts().saturating_sub(lookback)
    }
}

/// Earliest instant of `date` in `tz`; a midnight skipped by a DST jump resolves
/// to the first hour that exists.
fn local_midnight(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    (0..3)
        .find_map(|hours| {
            tz.from_local_datetime(&(naive + chrono::Duration::hours(hours)))
                .earliest()
        })
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| naive.and_utc().timestamp())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(name: &str, value: Option<&str>) -> Result<NaiveDate, BacktestError> {
    let Some(value) = non_empty(value) else {
        return Err(BacktestError::InvalidParameters(format!(
            "{name} is required (YYYY-MM-DD)"
        )));
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        BacktestError::InvalidParameters(format!("{name} must be a date in YYYY-MM-DD format (got {value})"))
    })
}

fn parse_window(name: &str, value: Option<&str>, default: usize) -> Result<usize, BacktestError> {
    let Some(value) = non_empty(value) else {
        return Ok(default);
    };
    match value.parse::<usize>() {
        Ok(window) if window > 0 => Ok(window),
        _ => Err(BacktestError::InvalidParameters(format!(
            "{name} must be a positive integer (got {value})"
        ))),
    }
}

fn parse_flag(name: &str, value: Option<&str>) -> Result<bool, BacktestError> {
    let Some(value) = non_empty(value) else {
        return Ok(false);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BacktestError::InvalidParameters(format!(
            "{name} must be a boolean (got {value})"
        ))),
    }
}
