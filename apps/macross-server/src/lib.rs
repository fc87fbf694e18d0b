pub mod bootstrap;
pub mod error;
pub mod observability;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::{Json, Router};
use macross_application::config::Config;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn run(config: Config) -> Result<(), String> {
    let addr = bootstrap::socket_addr(&config.server)?;
    let state = bootstrap::build_state(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to init tokio runtime: {err}"))?;
    let result = runtime.block_on(serve(addr, Arc::clone(&state)));
    drop(runtime);
    // last reference to the provider client goes away outside the runtime
    drop(state);
    result
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::api_router())
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), String> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind {addr}: {err}"))?;

    tracing::info!(%addr, "macross server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| format!("server error: {err}"))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, stopping");
}
