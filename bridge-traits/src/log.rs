//! Host log forwarding
//!
//! The core logs through `tracing`. Hosts that keep their own log (an
//! application log file, syslog, a database table) receive a copy of every event as
//! a [`LogEntry`] through a [`LoggerSink`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// One forwarded event. Sensitive field values arrive already redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// `tracing` target, `google_contacts` for auth and sync outcomes
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
    /// Name of the span the event was emitted in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: BTreeMap::new(),
            span: None,
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Receiver for forwarded log events.
///
/// ```ignore
/// struct AppLog(Mutex<File>);
///
/// #[async_trait]
/// impl LoggerSink for AppLog {
///     async fn log(&self, entry: LogEntry) -> Result<()> {
///         writeln!(self.0.lock().unwrap(), "[{}] {}", entry.target, entry.message)?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Events below this level are not forwarded
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}
