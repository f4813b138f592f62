//! # Logging & Tracing Infrastructure
//!
//! Installs the global `tracing` subscriber for a host process.
//!
//! ## Overview
//!
//! - One formatted output layer on stdout (pretty, JSON or compact)
//! - An `EnvFilter` that keeps this workspace's crates and the
//!   [`LOG_TARGET`](crate::LOG_TARGET) component target at the configured
//!   level and holds HTTP and SQL dependencies at `warn`
//! - Optionally, a [`LoggerSink`] receiving a redacted copy of every event
//!
//! Auth and sync outcomes are logged under `google_contacts`, so a host can
//! route them with a filter such as `google_contacts=info`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::LogLevel;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Json)
//!     .with_level(LogLevel::Debug)
//!     .with_logger_sink(app_log);
//!
//! init_logging(config)?;
//! ```

use crate::error::{Error, Result};

use bridge_traits::log::{LogEntry, LogLevel, LoggerSink};

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Context, Layered, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const REDACTED: &str = "[REDACTED]";

/// Field names whose values never leave the process in clear text
const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "auth_code",
    "code",
    "password",
    "secret",
    "authorization",
    "bearer",
];

/// Crates logged at the configured level by the default filter
const OWN_TARGETS: &[&str] = &[
    crate::LOG_TARGET,
    "contacts_sync",
    "core_runtime",
    "core_auth",
    "core_sync",
    "core_service",
    "provider_google_contacts",
    "bridge_desktop",
];

/// Dependencies held at `warn` by the default filter
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls", "sqlx"];

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync + 'static>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human readable
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

/// Logging configuration
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Full `EnvFilter` directive string, replacing the default filter
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Emit span enter/exit (pretty) or span context (JSON)
    pub enable_spans: bool,
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: false,
            display_target: true,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .field("display_target", &self.display_target)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// [`Error::Config`] when the filter does not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let mut layers: Vec<BoxedLayer> = vec![output_layer(&config)];
    if let Some(sink) = config.logger_sink.clone() {
        layers.push(Box::new(SinkLayer { sink }));
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn output_layer(config: &LoggingConfig) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(config.display_target);

    match config.format {
        LogFormat::Pretty => {
            let spans = if config.enable_spans {
                FmtSpan::ACTIVE
            } else {
                FmtSpan::NONE
            };
            layer.pretty().with_span_events(spans).boxed()
        }
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            OWN_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, level))
                .chain(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)))
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Copies events into the host's [`LoggerSink`]
struct SinkLayer {
    sink: Arc<dyn LoggerSink>,
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut entry = LogEntry::new(level, metadata.target(), "");
        let mut collector = FieldCollector { entry: &mut entry };
        event.record(&mut collector);
        if entry.message.is_empty() {
            entry.message = metadata.name().to_string();
        }
        entry.span = ctx.event_span(event).map(|span| span.name().to_string());

        deliver(Arc::clone(&self.sink), entry);
    }
}

/// Hand the entry to the sink without blocking a running executor
fn deliver(sink: Arc<dyn LoggerSink>, entry: LogEntry) {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move {
            if let Err(err) = sink.log(entry).await {
                eprintln!("Log sink failed: {}", err);
            }
        });
        return;
    }

    match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => {
            if let Err(err) = runtime.block_on(sink.log(entry)) {
                eprintln!("Log sink failed: {}", err);
            }
        }
        Err(err) => eprintln!("Log sink runtime unavailable: {}", err),
    }
}

/// Fills a [`LogEntry`], redacting as it goes
struct FieldCollector<'a> {
    entry: &'a mut LogEntry,
}

impl FieldCollector<'_> {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.entry.message = value;
        } else {
            let value = redact_if_sensitive(field.name(), &value);
            self.entry.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

fn log_level(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

/// Redact a field value before it is written anywhere.
///
/// Values of credential-like fields are replaced entirely; anything shaped
/// like an email address keeps only its first character.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("refresh_token", "1//0abc"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("contact", "ada@example.org"), "a***@[REDACTED]");
/// assert_eq!(redact_if_sensitive("user", "42"), "42");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let name = field_name.to_ascii_lowercase();
    if SENSITIVE_FIELDS.iter().any(|marker| name.contains(marker)) {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') && !value.contains(char::is_whitespace) => {
            let initial: String = local.chars().take(1).collect();
            format!("{}***@{}", initial, REDACTED)
        }
        _ => value.to_string(),
    }
}
