use std::fmt;

/// Bar interval supported by the crossover endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    FifteenMinutes,
    ThirtyMinutes,
    #[default]
    OneHour,
}

impl Interval {
    pub const ALL: [Interval; 3] = [
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
    ];

    /// Exact labels only; case and surrounding whitespace are not normalized.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" => Ok(Interval::OneHour),
            _ => Err(format!(
                "unsupported interval: {value} (expected one of: 15m, 30m, 1h)"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
        }
    }

    pub fn step_seconds(self) -> i64 {
        match self {
            Interval::FifteenMinutes => 900,
            Interval::ThirtyMinutes => 1800,
            Interval::OneHour => 3600,
        }
    }

    /// How far back the upstream provider serves bars of this interval.
    /// Advisory only: requests beyond it come back empty or truncated.
    pub fn max_lookback_days(self) -> i64 {
        match self {
            Interval::FifteenMinutes => 7,
            Interval::ThirtyMinutes => 60,
            Interval::OneHour => 730,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
