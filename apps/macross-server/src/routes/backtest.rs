use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use macross_application::backtesting::{
    run_ma_crossover, BacktestError, BacktestReport, BacktestRequest, RawBacktestParams,
};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/backtest/ma-crossover", get(ma_crossover))
}

/// `GET /backtest/ma-crossover`
///
/// The provider call is blocking, so the whole run happens on the blocking pool.
pub async fn ma_crossover(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RawBacktestParams>, QueryRejection>,
) -> Result<Json<BacktestReport>, ApiError> {
    let Query(params) =
        params.map_err(|err| BacktestError::InvalidParameters(err.body_text()))?;
    let request = BacktestRequest::from_params(&params, &state.defaults)?;

    let started = Instant::now();
    let worker = Arc::clone(&state);
    let report = tokio::task::spawn_blocking(move || {
        run_ma_crossover(&request, &worker.symbol, worker.market_data.as_ref())
    })
    .await
    .map_err(|err| ApiError::Internal(format!("backtest worker failed: {err}")))??;
    metrics::histogram!("macross.http.backtest_ms").record(started.elapsed().as_millis() as f64);

    Ok(Json(report))
}
