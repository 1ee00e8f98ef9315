// Initialization utilities for the server
//
// Logging/tracing setup and wiring of the fetch stack from RuntimeConfig

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use airview_config::{EndpointConfig, LogFormat, RuntimeConfig, ServerConfig};
use airview_core::{PostCache, ViewTracker};
use airview_fetch::{Endpoint, Identity, PostFetcher, StaticDirectory, TcpTransport};

use crate::AppState;

/// Initialize tracing/logging from the server section of RuntimeConfig
pub fn init_tracing(server: &ServerConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Parse log level from config
    let env_filter =
        EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match server.log_format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer()).init();
        }
    }
}

pub(crate) fn init_state(config: &RuntimeConfig) -> Result<AppState> {
    let directory = init_directory(config);

    let origin = match &config.fetch.origin {
        Some(address) => Identity::from_address(address.clone()),
        None => Identity::generate(),
    };
    info!(origin = %origin, "Fetching posts as origin identity");

    let cache = Arc::new(PostCache::new());
    let fetcher = PostFetcher::new(
        origin,
        Arc::new(directory),
        Arc::new(TcpTransport),
        cache,
    )
    .with_io_timeout(config.fetch.io_timeout());

    info!(
        capacity = config.tracker.capacity,
        home_top = config.server.home_top,
        "View tracker ready"
    );
    let tracker = Arc::new(ViewTracker::new(config.tracker.capacity));

    Ok(AppState::new(
        Arc::new(fetcher),
        tracker,
        config.server.home_top,
    ))
}

fn init_directory(config: &RuntimeConfig) -> StaticDirectory {
    let mut directory = StaticDirectory::new();
    for entry in &config.directory.aliases {
        let transfer = endpoint(&entry.alias, &entry.transfer);
        let mail = entry.mail.as_ref().map(|mail| endpoint(&entry.alias, mail));
        directory.insert(entry.alias.clone(), transfer, mail);
    }

    if directory.is_empty() {
        info!("Directory is empty; every /view request will fail to resolve");
    } else {
        info!(aliases = directory.len(), "Loaded alias directory");
    }
    directory
}

fn endpoint(alias: &str, config: &EndpointConfig) -> Endpoint {
    Endpoint::new(alias, config.address.clone(), config.location.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use airview_config::{DirectoryConfig, DirectoryEntry};

    #[test]
    fn state_follows_config() {
        let mut config = RuntimeConfig::default();
        config.fetch.origin = Some("fixed-origin".to_string());
        config.tracker.capacity = 15;
        config.server.home_top = 4;
        config.directory = DirectoryConfig {
            aliases: vec![DirectoryEntry {
                alias: "dana@example.net".to_string(),
                transfer: EndpointConfig {
                    address: "srv".to_string(),
                    location: "127.0.0.1:9".to_string(),
                },
                mail: None,
            }],
        };

        let state = init_state(&config).unwrap();
        assert_eq!(state.fetcher.origin().address(), "fixed-origin");
        assert_eq!(state.tracker.capacity(), 15);
        assert_eq!(state.home_top, 4);
    }

    #[test]
    fn generated_origin_when_unset() {
        let state = init_state(&RuntimeConfig::default()).unwrap();
        assert!(!state.fetcher.origin().address().is_empty());
    }
}
