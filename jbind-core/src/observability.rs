//! Logging setup
//!
//! The library itself only emits `tracing` events: rejected messages at
//! `debug`, accessor cache population at `trace`, oversized batches at
//! `warn`. Nothing is printed unless the host installs a subscriber.
//!
//! [`init_logging`] installs one for applications and tests that have no
//! subscriber of their own: a `tracing-subscriber` registry with an
//! [`EnvFilter`] and either human-readable or JSON output.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g. `"info"`, `"jbind_core=debug"`)
//! - `JBIND_LOG_FORMAT`: `json` for JSON lines, anything else for text
//!
//! # Examples
//!
//! ```rust,no_run
//! use jbind_core::LogConfig;
//!
//! let config = LogConfig::new().with_level("jbind_core=debug").with_json(true);
//! jbind_core::init_logging(config).expect("Failed to init logging");
//!
//! tracing::info!("ready");
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
///
/// # Defaults
///
/// - Level: `$RUST_LOG` or `"info"`
/// - Format: JSON if `$JBIND_LOG_FORMAT` is `json`, text otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directives in `EnvFilter` syntax
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json: std::env::var("JBIND_LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

impl LogConfig {
    /// Configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter directives
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Choose JSON or text output
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Install a global `tracing` subscriber
///
/// # Errors
///
/// Fails if the filter directives do not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_new(&config.level)?;

    // Exactly one of the two layers is Some
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });
    let text_layer = (!config.json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    tracing::debug!(level = %config.level, json = config.json, "logging initialized");
    Ok(())
}
