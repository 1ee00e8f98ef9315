// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use std::collections::HashSet;
use tracing::warn;

/// True for `local@domain` with a non-empty local part and domain.
pub fn is_valid_alias(candidate: &str) -> bool {
    match candidate.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_server_config(&config.server)?;
    validate_fetch_config(&config.fetch)?;
    validate_tracker_config(&config.tracker)?;

    if config.server.home_top > config.tracker.capacity {
        bail!(
            "server.home_top ({}) must not exceed tracker.capacity ({})",
            config.server.home_top,
            config.tracker.capacity
        );
    }

    validate_directory_config(&config.directory)?;

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<()> {
    if config.io_timeout_secs == 0 {
        bail!("fetch.io_timeout_secs must be greater than 0");
    }

    if let Some(origin) = &config.origin {
        if origin.trim().is_empty() {
            bail!("fetch.origin must not be empty when set");
        }
    }

    Ok(())
}

fn validate_tracker_config(config: &TrackerConfig) -> Result<()> {
    if config.capacity == 0 {
        bail!("tracker.capacity must be greater than 0");
    }

    // Every increment scans the ranking linearly
    if config.capacity > 10_000 {
        warn!(
            capacity = config.capacity,
            "tracker.capacity is very large; view recording will slow down"
        );
    }

    Ok(())
}

fn validate_directory_config(config: &DirectoryConfig) -> Result<()> {
    let mut seen = HashSet::new();

    for entry in &config.aliases {
        if !is_valid_alias(&entry.alias) {
            bail!(
                "directory alias '{}' must be of the form user@domain",
                entry.alias
            );
        }

        validate_endpoint(&entry.alias, "transfer", &entry.transfer)?;
        if let Some(mail) = &entry.mail {
            validate_endpoint(&entry.alias, "mail", mail)?;
        }

        if !seen.insert(entry.alias.as_str()) {
            warn!(alias = %entry.alias, "duplicate directory alias; the last entry wins");
        }
    }

    Ok(())
}

fn validate_endpoint(alias: &str, purpose: &str, endpoint: &EndpointConfig) -> Result<()> {
    if endpoint.address.is_empty() {
        bail!("directory alias '{}': {}.address is required", alias, purpose);
    }

    if endpoint.location.is_empty() || !endpoint.location.contains(':') {
        bail!(
            "directory alias '{}': {}.location must be in format 'host:port'",
            alias,
            purpose
        );
    }

    Ok(())
}
