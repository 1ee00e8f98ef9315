use super::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "AIRVIEW_";

/// Abstraction over environment-variable lookups so tests and embedders can
/// supply their own source of overrides.
pub trait EnvSource {
    /// Look up `key` (given WITHOUT the AIRVIEW_ prefix).
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Server configuration (listen addr, log level/format, home page size)
    if let Some(addr) = get_env_string(env, "LISTEN_ADDR") {
        config.server.listen_addr = addr;
    }
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.server.log_format = format
            .parse::<LogFormat>()
            .with_context(|| format!("Invalid {}LOG_FORMAT", ENV_PREFIX))?;
    }
    if let Some(val) = get_env_usize(env, "HOME_TOP")? {
        config.server.home_top = val;
    }

    // Fetch configuration
    if let Some(val) = get_env_u64(env, "IO_TIMEOUT_SECS")? {
        config.fetch.io_timeout_secs = val;
    }
    if let Some(origin) = get_env_string(env, "ORIGIN") {
        config.fetch.origin = Some(origin);
    }

    // Tracker configuration
    if let Some(val) = get_env_usize(env, "TRACKER_CAPACITY")? {
        config.tracker.capacity = val;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    get_env_string(env, key)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| anyhow!("Invalid {}{}='{}': {}", ENV_PREFIX, key, v, e))
        })
        .transpose()
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    get_env_string(env, key)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|e| anyhow!("Invalid {}{}='{}': {}", ENV_PREFIX, key, v, e))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let mut config = RuntimeConfig::default();
        let env = MapEnv(HashMap::from([("LISTEN_ADDR", "   "), ("ORIGIN", "")]));
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert!(config.fetch.origin.is_none());
    }

    #[test]
    fn test_non_numeric_values_are_errors() {
        let mut config = RuntimeConfig::default();
        let env = MapEnv(HashMap::from([("TRACKER_CAPACITY", "lots")]));
        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("AIRVIEW_TRACKER_CAPACITY"));
    }

    #[test]
    fn test_unknown_log_format_is_error() {
        let mut config = RuntimeConfig::default();
        let env = MapEnv(HashMap::from([("LOG_FORMAT", "xml")]));
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }

    #[test]
    fn test_all_overrides_apply() {
        let mut config = RuntimeConfig::default();
        let env = MapEnv(HashMap::from([
            ("LISTEN_ADDR", "127.0.0.1:1234"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
            ("HOME_TOP", "5"),
            ("IO_TIMEOUT_SECS", "9"),
            ("ORIGIN", "abcdef"),
            ("TRACKER_CAPACITY", "40"),
        ]));
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.server.listen_addr, "127.0.0.1:1234");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.server.home_top, 5);
        assert_eq!(config.fetch.io_timeout_secs, 9);
        assert_eq!(config.fetch.origin.as_deref(), Some("abcdef"));
        assert_eq!(config.tracker.capacity, 40);
    }
}
