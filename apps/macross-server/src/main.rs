use clap::Parser;
use macross_application::config;
use macross_server::{bootstrap, observability};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "macross-server")]
#[command(about = "Moving-average crossover backtest over HTTP.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env MACROSS_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `server.port`.
    #[arg(long)]
    port: Option<u16>,

    /// Prometheus exporter listen address (host:port). If omitted, uses env MACROSS_METRICS_ADDR.
    #[arg(long)]
    metrics_addr: Option<String>,

    /// Print the effective config as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let cli = Cli::parse();

    let config_path = bootstrap::resolve_config_path(cli.config);
    let mut config = match bootstrap::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = bootstrap::apply_overrides(&mut config, cli.bind, cli.port) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if cli.print_config {
        match config::to_toml_pretty(&config) {
            Ok(toml) => {
                print!("{toml}");
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }

    if let Err(err) = observability::init_tracing(&config.logging.level, &config.logging.format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    let metrics_addr = cli.metrics_addr.or_else(|| {
        std::env::var(observability::METRICS_ADDR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
    });
    if let Err(err) = observability::init_metrics(metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if let Some(path) = &config_path {
        tracing::info!(config = %path.display(), "config loaded");
    }
    if let Err(err) = macross_server::run(config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
