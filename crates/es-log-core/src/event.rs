//! Log event and bulk action types
//!
//! Defines the producer-facing `LogEvent` and the backend-ready `Action`
//! that flows through the batching pipeline.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[serde(alias = "trace")]
    Trace,
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warn")]
    Warn,
    #[serde(alias = "error")]
    Error,
}

impl Level {
    /// Uppercase level name as written into the shipped document
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl Default for Level {
    /// Trace, i.e. no minimum-level filtering
    fn default() -> Self {
        Self::Trace
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// A log event as produced by application code
///
/// Immutable once produced; the pipeline only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Severity level
    pub level: Level,

    /// Free-form message payload
    pub message: String,

    /// Creation timestamp
    pub timestamp: DateTime<Utc>,

    /// Open key/value context, copied verbatim into the shipped document
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl LogEvent {
    /// Create an event stamped with the current time
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Builder: override the creation timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder: attach a context entry
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Bulk operation kind
///
/// The shipper only ever inserts, so this carries a single variant, but the
/// operation stays explicit in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOp {
    Index,
}

impl BulkOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
        }
    }
}

/// A backend-ready document derived from a [`LogEvent`]
///
/// Built lazily at buffer-append time and owned by the buffer until flushed.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    /// Target index name
    #[serde(skip)]
    pub index: String,

    /// Bulk operation kind
    #[serde(skip)]
    pub op: BulkOp,

    /// RFC 3339 timestamp, adjusted to the configured timezone
    #[serde(rename = "@timestamp")]
    pub timestamp: String,

    /// Level name
    pub level: Level,

    /// Message payload
    pub message: String,

    /// Extra context, verbatim from the event
    pub extra: Map<String, Value>,
}

impl Action {
    /// Build an action from an event
    ///
    /// Pure transformation: converts the event timestamp into the configured
    /// timezone (or leaves it in the event's own zone when `tz` is `None`)
    /// and copies level, message, and extra verbatim.
    pub fn build(event: &LogEvent, index: &str, tz: Option<Tz>) -> Self {
        let timestamp = match tz {
            Some(tz) => event.timestamp.with_timezone(&tz).to_rfc3339(),
            None => event.timestamp.to_rfc3339(),
        };

        Self {
            index: index.to_string(),
            op: BulkOp::Index,
            timestamp,
            level: event.level,
            message: event.message.clone(),
            extra: event.extra.clone(),
        }
    }

    /// Render the two NDJSON lines (action header + source) for the bulk API
    pub fn to_bulk_lines(&self) -> String {
        let mut header = Map::new();
        header.insert(self.op.as_str().to_string(), json!({ "_index": self.index }));

        let mut lines = Value::Object(header).to_string();
        lines.push('\n');
        lines.push_str(&serde_json::to_string(self).unwrap());
        lines.push('\n');
        lines
    }
}

/// Ordered batch of actions awaiting one bulk write
#[derive(Debug, Clone, Default)]
pub struct ActionBatch {
    actions: Vec<Action>,
}

impl ActionBatch {
    /// Create empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create batch with capacity hint
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            actions: Vec::with_capacity(capacity),
        }
    }

    /// Append an action, preserving insertion order
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Number of actions in the batch
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over actions in order
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Render the full NDJSON body for one bulk request
    pub fn to_bulk_body(&self) -> String {
        let mut body = String::new();
        for action in &self.actions {
            body.push_str(&action.to_bulk_lines());
        }
        body
    }
}

impl IntoIterator for ActionBatch {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl FromIterator<Action> for ActionBatch {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}
