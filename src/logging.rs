use std::sync::Once;

/// Logger settings, read before any other configuration so that config
/// parsing can already log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `env_logger` filter syntax, e.g. "info" or "stopwatch=debug".
    pub env_filter: Option<String>,
}

impl LoggingConfig {
    /// Reads `RUST_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            env_filter: lookup("RUST_LOG").filter(|f| !f.trim().is_empty()),
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger; only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match config.env_filter {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
            }
        }
        builder.init();
        log::debug!("logging initialized");
    });
}
