//! Tracing setup for structured logging.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter: info for our crates, statement logging from sqlx kept quiet.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Log output settings, read from `RUST_LOG` and `LOG_JSON`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub filter: String,
    /// One JSON object per event instead of human-readable lines
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::var("RUST_LOG").ok(), std::env::var("LOG_JSON").ok())
    }

    /// Builds the config from raw variable values. Blank filters fall back to
    /// [`DEFAULT_FILTER`]; `LOG_JSON` accepts `1` or `true`.
    pub fn from_vars(rust_log: Option<String>, log_json: Option<String>) -> Self {
        let filter = rust_log
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let json = log_json
            .map(|v| {
                let v = v.trim();
                v == "1" || v.eq_ignore_ascii_case("true")
            })
            .unwrap_or(false);

        Self { filter, json }
    }
}

/// Initialize tracing with the given configuration.
///
/// A second call in the same process is a no-op.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_file(true).with_line_number(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };

    if installed.is_ok() {
        tracing::info!(filter = %config.filter, json = config.json, "Tracing initialized");
    }
}

/// Initialize tracing from `RUST_LOG` and `LOG_JSON`.
pub fn init_tracing_from_env() {
    init_tracing(&TracingConfig::from_env());
}
