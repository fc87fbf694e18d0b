use macross_application::config::{self, Config, ServerConfig};
use macross_infrastructure::market_data::YahooChartClient;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::state::AppState;

pub const CONFIG_ENV: &str = "MACROSS_CONFIG";

/// `--config` first, then `MACROSS_CONFIG`; `None` means built-in defaults.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
    cli_path.or_else(|| {
        std::env::var(CONFIG_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    })
}

pub fn load_or_default(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(path) => config::load_config(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

pub fn apply_overrides(
    config: &mut Config,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<(), String> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()
}

pub fn socket_addr(server: &ServerConfig) -> Result<SocketAddr, String> {
    let bind = server.bind.trim();
    (bind, server.port)
        .to_socket_addrs()
        .map_err(|err| format!("invalid bind address {bind}:{}: {err}", server.port))?
        .next()
        .ok_or_else(|| format!("bind address {bind}:{} did not resolve", server.port))
}

/// Builds the provider client and shared state.
///
/// Must run outside the tokio runtime: the blocking HTTP client owns its own
/// runtime and panics if created or dropped inside an async context.
pub fn build_state(config: &Config) -> Result<Arc<AppState>, String> {
    let client = YahooChartClient::new(
        config.provider.base_url.clone(),
        config.provider.timeout_ms,
        &config.provider.user_agent,
    )?;
    tracing::info!(
        base_url = %client.base_url,
        timeout_ms = client.timeout_ms,
        symbol = %config.provider.symbol,
        "market data provider configured"
    );
    Ok(AppState::new(
        config.provider.symbol.trim(),
        config.strategy.clone(),
        Arc::new(client),
    ))
}
