use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use airview_config::RuntimeConfig;

/// Read-only web viewer for posts published over the messaging network
#[derive(Parser)]
#[command(name = "airview")]
#[command(version)]
#[command(about = "Read-only web viewer for posts published over the messaging network", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Fixed origin address to sign list requests as
    #[arg(short, long, value_name = "ADDRESS")]
    origin: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run async server
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Env, default locations, then built-in defaults
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);

    // Step 3: Validate again now that flags are applied
    config.validate().context("Invalid configuration")?;

    // Step 4: Run server with resolved config
    airview_server::run_with_config(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.listen_addr = format!("0.0.0.0:{}", port);
    }

    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }

    if let Some(origin) = &cli.origin {
        config.fetch.origin = Some(origin.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "airview",
            "--port",
            "9090",
            "--log-level",
            "debug",
            "--origin",
            "abcd",
        ]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.fetch.origin.as_deref(), Some("abcd"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::parse_from(["airview"]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert!(config.fetch.origin.is_none());
    }
}
