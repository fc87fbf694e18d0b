use crate::value_objects::bar::Bar;
use crate::value_objects::interval::Interval;

/// Half-open `[start, end)` range of epoch seconds for one symbol/interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarQuery {
    pub symbol: String,
    pub interval: Interval,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub symbol: String,
    /// IANA zone of the exchange (`America/New_York`), when the provider reports one.
    pub exchange_timezone: Option<String>,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The provider answered but has nothing for this symbol/interval/range.
    NoData(String),
    Transport(String),
    Status { status: u16, message: String },
    Decode(String),
}

impl std::fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketDataError::NoData(msg) => write!(f, "no data: {msg}"),
            MarketDataError::Transport(msg) => write!(f, "transport: {msg}"),
            MarketDataError::Status { status, message } => {
                write!(f, "provider status {status}: {message}")
            }
            MarketDataError::Decode(msg) => write!(f, "decode: {msg}"),
        }
    }
}

impl std::error::Error for MarketDataError {}

pub trait MarketDataRepository {
    fn load_bars(&self, query: &BarQuery) -> Result<PriceHistory, MarketDataError>;
}
