use macross_domain::repositories::market_data::MarketDataError;

#[derive(Debug, Clone, PartialEq)]
pub enum BacktestError {
    /// Malformed or missing request parameters.
    InvalidParameters(String),
    /// The provider has no bars for the requested range/interval.
    DataUnavailable(String),
    /// Network or provider-side failure; not retried.
    ProviderFailure(String),
}

impl BacktestError {
    pub fn kind(&self) -> &'static str {
        match self {
            BacktestError::InvalidParameters(_) => "invalid_parameters",
            BacktestError::DataUnavailable(_) => "data_unavailable",
            BacktestError::ProviderFailure(_) => "provider_failure",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            BacktestError::InvalidParameters(msg)
            | BacktestError::DataUnavailable(msg)
            | BacktestError::ProviderFailure(msg) => msg,
        }
    }
}

impl std::fmt::Display for BacktestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BacktestError::InvalidParameters(msg) => write!(f, "invalid parameters: {msg}"),
            BacktestError::DataUnavailable(msg) => write!(f, "data unavailable: {msg}"),
            BacktestError::ProviderFailure(msg) => write!(f, "provider failure: {msg}"),
        }
    }
}

impl std::error::Error for BacktestError {}

impl From<MarketDataError> for BacktestError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::NoData(msg) => BacktestError::DataUnavailable(msg),
            other => BacktestError::ProviderFailure(other.to_string()),
        }
    }
}
