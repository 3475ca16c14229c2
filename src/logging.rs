//! Log entries and the sinks that record them.
//!
//! The presenter decides *what* to log (level, message, fields); a
//! [`LogSink`] decides how it is persisted. Entries borrow from the error that
//! produced them and only live for the duration of [`LogSink::log`], so a sink
//! that wants to keep data has to copy it out explicitly.
//!
//! Two sinks ship with the crate:
//!
//! - [`TracingSink`]: emits a `tracing` event per entry
//! - [`RingBufferSink`](crate::ring_buffer::RingBufferSink): bounded
//!   in-memory capture
//!
//! # Example
//!
//! ```rust
//! use gqlerr::{ErrorPresenter, GqlError, RequestContext, TracingSink};
//!
//! let presenter = ErrorPresenter::new(TracingSink::new());
//! let ctx = RequestContext::background();
//! let err = GqlError::not_found(&ctx, "no such user", []);
//! let response = presenter.present_error(err);
//! assert_eq!(response.message, "not found");
//! ```

use crate::{Field, Level};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Maximum rendered length of one field value, in bytes
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Marks text that was cut short
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Target used for every event emitted by [`TracingSink`].
pub const LOG_TARGET: &str = "gqlerr";

/// Key of the field the presenter prepends with the request path.
pub const PATH_KEY: &str = "gql_path";

// ============================================================================
// Sink Level
// ============================================================================

/// Method a sink is asked to log with.
///
/// Mirrors the levels of a typical structured logger. `DPanic` is logged at
/// error severity in production and panics in development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SinkLevel {
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warn
    Warn,
    /// Error
    Error,
    /// Error in production, panic in development
    DPanic,
}

impl SinkLevel {
    /// Map an error's level onto a sink method. Anything that is not a known
    /// level logs at `Error` so the entry is never dropped.
    #[inline]
    pub const fn from_level(level: Level) -> Self {
        match level {
            Level::Debug => Self::Debug,
            Level::Info => Self::Info,
            Level::Warn => Self::Warn,
            Level::Panic => Self::DPanic,
            Level::Error | Level::Unset => Self::Error,
        }
    }

    /// Lowercase name.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::DPanic => "dpanic",
        }
    }
}

impl fmt::Display for SinkLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Entry
// ============================================================================

/// One structured log entry, borrowed from the error being reported.
#[derive(Debug)]
pub struct LogEntry<'a> {
    level: SinkLevel,
    message: &'a str,
    path: Option<Field>,
    fields: &'a [Field],
}

impl<'a> LogEntry<'a> {
    #[inline]
    pub(crate) fn new(level: SinkLevel, message: &'a str, fields: &'a [Field]) -> Self {
        Self {
            level,
            message,
            path: None,
            fields,
        }
    }

    /// Prepend a `gql_path` field.
    #[inline]
    pub(crate) fn with_path(mut self, path: String) -> Self {
        self.path = Some(Field::string(PATH_KEY, path));
        self
    }

    /// Sink method to log with.
    #[inline]
    pub const fn level(&self) -> SinkLevel {
        self.level
    }

    /// Internal message of the error.
    #[inline]
    pub const fn message(&self) -> &'a str {
        self.message
    }

    /// All fields in order, starting with `gql_path` when present.
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.path.iter().chain(self.fields.iter())
    }

    /// Number of fields, including `gql_path`.
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len() + usize::from(self.path.is_some())
    }

    /// Write the fields as `key='value'` pairs separated by spaces.
    ///
    /// Values are truncated to a fixed length so a single huge field cannot
    /// blow up a log line, then escaped so a value cannot pass itself off as
    /// another field.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        for (i, field) in self.fields().enumerate() {
            if i != 0 {
                f.write_char(' ')?;
            }
            let value = field.value().to_string();
            write!(f, "{}='", field.key())?;
            write_escaped(f, &truncate_to_bytes(&value, MAX_FIELD_OUTPUT_LEN))?;
            f.write_char('\'')?;
        }
        Ok(())
    }

    /// Display adapter over [`write_to`](Self::write_to).
    #[inline]
    pub fn display_fields(&self) -> impl fmt::Display + '_ {
        DisplayFields(self)
    }
}

struct DisplayFields<'e, 'a>(&'e LogEntry<'a>);

impl fmt::Display for DisplayFields<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_to(f)
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for log entries produced at the response boundary.
///
/// Implementations must not fail: whatever goes wrong while persisting an
/// entry is the sink's own problem. Sinks used from concurrent requests are
/// responsible for serializing their writes.
pub trait LogSink {
    /// Record one entry.
    fn log(&self, entry: &LogEntry<'_>);
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn log(&self, entry: &LogEntry<'_>) {
        (**self).log(entry)
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn log(&self, entry: &LogEntry<'_>) {
        (**self).log(entry)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn log(&self, entry: &LogEntry<'_>) {
        (**self).log(entry)
    }
}

/// Sink that emits one `tracing` event per entry.
///
/// Fields are rendered into a single `fields` value because `tracing`
/// requires field names to be known at compile time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    development: bool,
}

impl TracingSink {
    /// Production sink: `DPanic` entries log at error level.
    #[inline]
    pub const fn new() -> Self {
        Self { development: false }
    }

    /// In development mode `DPanic` entries panic after being logged.
    #[inline]
    pub const fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Whether `DPanic` entries panic.
    #[inline]
    pub const fn is_development(&self) -> bool {
        self.development
    }
}

impl LogSink for TracingSink {
    fn log(&self, entry: &LogEntry<'_>) {
        let fields = entry.display_fields();
        let message = entry.message();
        match entry.level() {
            SinkLevel::Debug => {
                tracing::debug!(target: LOG_TARGET, fields = %fields, "{message}")
            }
            SinkLevel::Info => {
                tracing::info!(target: LOG_TARGET, fields = %fields, "{message}")
            }
            SinkLevel::Warn => {
                tracing::warn!(target: LOG_TARGET, fields = %fields, "{message}")
            }
            SinkLevel::Error => {
                tracing::error!(target: LOG_TARGET, fields = %fields, "{message}")
            }
            SinkLevel::DPanic => {
                tracing::error!(target: LOG_TARGET, fields = %fields, dpanic = true, "{message}");
                if self.development {
                    panic!("{message}");
                }
            }
        }
    }
}

/// Cut `s` to at most `max_bytes` bytes on a char boundary, ending with
/// [`TRUNCATION_INDICATOR`] when anything was removed.
pub(crate) fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    if max_bytes <= TRUNCATION_INDICATOR.len() {
        return Cow::Borrowed(&TRUNCATION_INDICATOR[..max_bytes]);
    }

    let mut end = max_bytes - TRUNCATION_INDICATOR.len();
    while !s.is_char_boundary(end) {
        end -= 1;
    }

    let mut out = String::with_capacity(end + TRUNCATION_INDICATOR.len());
    out.push_str(&s[..end]);
    out.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(out)
}

/// Write `value` so it cannot close its quotes early. Backslash, quote and
/// control characters are escaped.
fn write_escaped(f: &mut impl fmt::Write, value: &str) -> fmt::Result {
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            c if c.is_control() => write!(f, "{}", c.escape_default())?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}
