use chrono_tz::Tz;
use macross_domain::services::indicators::MovingAverageKind;
use macross_domain::value_objects::interval::Interval;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SYMBOL: &str = "NQ=F";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; macross/0.1)";
pub const DEFAULT_EXCHANGE_TIMEZONE: &str = "America/New_York";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub symbol: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            timeout_ms: 15_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Defaults applied when a request omits the corresponding parameter.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct StrategyConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub interval: String,
    pub ma_type: MovingAverageKind,
    /// Exchange session zone: date bounds are local midnights in it, and it
    /// renders timestamps when the provider does not name a zone.
    pub timezone: String,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
            interval: Interval::default().as_str().to_string(),
            ma_type: MovingAverageKind::Sma,
            timezone: DEFAULT_EXCHANGE_TIMEZONE.to_string(),
        }
    }
}

impl StrategyConfig {
    pub fn interval(&self) -> Result<Interval, String> {
        Interval::parse(&self.interval)
    }

    pub fn timezone(&self) -> Result<Tz, String> {
        parse_timezone(&self.timezone)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| {
            format!(
                "unknown timezone: {name} (expected an IANA name such as {DEFAULT_EXCHANGE_TIMEZONE})"
            )
        })
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind.trim().is_empty() {
            return Err("server.bind must not be empty".to_string());
        }
        if self.provider.base_url.trim().is_empty() {
            return Err("provider.base_url must not be empty".to_string());
        }
        if self.provider.symbol.trim().is_empty() {
            return Err("provider.symbol must not be empty".to_string());
        }
        if self.provider.timeout_ms == 0 {
            return Err("provider.timeout_ms must be > 0".to_string());
        }
        if self.strategy.short_window == 0 || self.strategy.long_window == 0 {
            return Err("strategy.short_window and strategy.long_window must be > 0".to_string());
        }
        self.strategy
            .interval()
            .map_err(|err| format!("strategy.interval: {err}"))?;
        self.strategy
            .timezone()
            .map_err(|err| format!("strategy.timezone: {err}"))?;
        match self.logging.format.trim().to_lowercase().as_str() {
            "text" | "json" => {}
            other => return Err(format!("logging.format must be: text | json (got {other})")),
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config
        .validate()
        .map_err(|err| format!("invalid config {}: {}", path.display(), err))?;
    Ok(config)
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
