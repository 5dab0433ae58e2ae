//! Logging infrastructure - structured tracing throughout the bridge
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Zero-cost when disabled (per-conversion events are `trace!`)
//! - Configurable format and destination
//! - Environment overrides (`TYPTHON_BRIDGE_LOG_*`)

use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub use tracing::{debug, error, info, trace, warn};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with timestamps
    Pretty,
    /// Compact format for production
    Compact,
    /// JSON format for structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// File with rotation (daily)
    File { directory: String, prefix: String },
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Whether to include span events
    pub span_events: bool,
    /// Custom filter directives (e.g., "typthon_bridge=trace")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // TYPTHON_BRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("TYPTHON_BRIDGE_LOG_LEVEL") {
            config.level = parse_level(&level_str).unwrap_or(Level::INFO);
        }

        // TYPTHON_BRIDGE_LOG_FILE: path to log file (directory + file prefix)
        if let Ok(path) = std::env::var("TYPTHON_BRIDGE_LOG_FILE") {
            config.output = file_output(Path::new(&path));
        }

        if std::env::var("TYPTHON_BRIDGE_LOG_JSON").is_ok() {
            config.format = LogFormat::Json;
        }

        config.span_events = std::env::var("TYPTHON_BRIDGE_LOG_SPANS").is_ok();

        config
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

fn parse_level(text: &str) -> Option<Level> {
    match text.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn file_output(path: &Path) -> LogOutput {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_owned());
    let prefix = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "typthon_bridge.log".to_owned());

    LogOutput::File { directory, prefix }
}

/// Initialize the global logging system
///
/// Idempotent: only the first call installs a subscriber; later calls (or a
/// subscriber installed by the embedding application) leave it untouched and
/// return `None`. Keep the returned guard alive so buffered logs are flushed.
pub fn init_logging(config: LogConfig) -> Option<WorkerGuard> {
    let mut guard = None;

    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = build_filter(&config);

        guard = Some(match &config.output {
            LogOutput::Stdout => {
                let (writer, g) = tracing_appender::non_blocking(std::io::stdout());
                install(writer, &config, filter);
                g
            }
            LogOutput::Stderr => {
                let (writer, g) = tracing_appender::non_blocking(std::io::stderr());
                install(writer, &config, filter);
                g
            }
            LogOutput::File { directory, prefix } => {
                let file_appender = rolling::daily(directory, prefix);
                let (writer, g) = tracing_appender::non_blocking(file_appender);
                install(writer, &config, filter);
                g
            }
        });
    });

    guard
}

/// Initialize logging from `TYPTHON_BRIDGE_LOG_*` variables
pub fn init() -> Option<WorkerGuard> {
    init_logging(LogConfig::from_env())
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

fn install<W>(writer: W, config: &LogConfig, filter: EnvFilter)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let span_events = span_events_config(config.span_events);

    let result = match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .pretty()
                .with_span_events(span_events)
                .with_filter(filter);

            tracing_subscriber::registry().with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(writer)
                .compact()
                .with_span_events(span_events)
                .with_filter(filter);

            tracing_subscriber::registry().with(layer).try_init()
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(writer)
                .json()
                .with_span_events(span_events)
                .with_filter(filter);

            tracing_subscriber::registry().with(layer).try_init()
        }
    };

    if let Err(e) = result {
        // Another subscriber is already global
        debug!(error = %e, "Logging subscriber not installed");
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let fallback = LevelFilter::from_level(config.level);
    let base_filter = EnvFilter::from_default_env().add_directive(fallback.into());

    match &config.filter {
        Some(filter_str) => filter_str
            .split(',')
            .filter(|directive| !directive.trim().is_empty())
            .fold(base_filter, |filter, directive| match directive.trim().parse() {
                Ok(parsed) => filter.add_directive(parsed),
                Err(_) => {
                    warn!("Invalid filter directive: {}", directive);
                    filter
                }
            }),
        None => base_filter,
    }
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

// ============================================================================
// Bridge-specific logging functions
// ============================================================================

/// Log type conversion
#[inline]
pub fn log_type_conversion(from_type: &str, to_type: &str) {
    trace!(
        event = "type_conversion",
        from = from_type,
        to = to_type,
        "Type conversion performed"
    );
}

/// Log a conversion failure surfaced by the engine
pub fn log_conversion_failure(from_type: &str, to_type: &str, error: &str) {
    debug!(
        event = "conversion_failure",
        from = from_type,
        to = to_type,
        error = error,
        "Type conversion failed"
    );
}

/// Log dispatch strategy publication
pub fn log_strategy_selected(target: &str, strategy: &str) {
    debug!(
        event = "strategy_selected",
        host_type = target,
        strategy = strategy,
        "Dispatch strategy cached"
    );
}
