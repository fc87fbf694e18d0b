use macross_application::config::StrategyConfig;
use macross_domain::repositories::market_data::MarketDataRepository;
use std::sync::Arc;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    /// Instrument every backtest runs against.
    pub symbol: String,
    /// Fallbacks for omitted query parameters.
    pub defaults: StrategyConfig,
    pub market_data: Arc<dyn MarketDataRepository + Send + Sync>,
}

impl AppState {
    pub fn new(
        symbol: impl Into<String>,
        defaults: StrategyConfig,
        market_data: Arc<dyn MarketDataRepository + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new(Self {
            symbol: symbol.into(),
            defaults,
            market_data,
        })
    }
}
