use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TICK_CUTOFF_MINUTES: u64 = 90;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 20;
const DEFAULT_STATE_FILE: &str = "stopwatch.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Displayed minutes at which the tick stream halts.
    pub tick_cutoff_minutes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_cutoff_minutes: DEFAULT_TICK_CUTOFF_MINUTES,
        }
    }
}

/// Settings for the host process that owns the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    pub tick_interval: Duration,
    pub state_path: PathBuf,
    pub engine: EngineConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            engine: EngineConfig::default(),
        }
    }
}

impl HostConfig {
    /// Reads `STOPWATCH_STATE_PATH` and `STOPWATCH_TICK_MS`. Call after
    /// logging is up so a rejected value is reported.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("STOPWATCH_STATE_PATH").filter(|p| !p.is_empty()) {
            config.state_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("STOPWATCH_TICK_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.tick_interval = Duration::from_millis(ms),
                _ => log::warn!("ignoring invalid STOPWATCH_TICK_MS={:?}", raw),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_lookup(lookup(&[]));
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.tick_interval, Duration::from_millis(20));
        assert_eq!(config.engine.tick_cutoff_minutes, 90);
    }

    #[test]
    fn test_env_overrides() {
        let config = HostConfig::from_lookup(lookup(&[
            ("STOPWATCH_STATE_PATH", "/tmp/sw.json"),
            ("STOPWATCH_TICK_MS", "50"),
        ]));
        assert_eq!(config.state_path, PathBuf::from("/tmp/sw.json"));
        assert_eq!(config.tick_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_tick_ignored() {
        let config = HostConfig::from_lookup(lookup(&[("STOPWATCH_TICK_MS", "0")]));
        assert_eq!(config.tick_interval, Duration::from_millis(20));
        let config = HostConfig::from_lookup(lookup(&[("STOPWATCH_TICK_MS", "fast")]));
        assert_eq!(config.tick_interval, Duration::from_millis(20));
    }
}
