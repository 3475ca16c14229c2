//! Classification codes and severity levels.
//!
//! Codes mirror the gRPC status codes that make sense for a GraphQL API and
//! are rendered in snake case on the wire (`extensions.code`).
//!
//! # Defaults
//!
//! Every code carries a default log level and a default client message. Codes
//! that a client could plausibly trigger default to `warn` to keep pager noise
//! down; `internal` defaults to `error` because it almost always means a
//! programmer error or a failing backend.
//!
//! Both tables are `const` data, so lookups are free and safe to share across
//! any number of concurrent requests.
//!
//! # Example
//!
//! ```rust
//! use gqlerr::{Code, Level};
//!
//! assert_eq!(Code::NotFound.as_str(), "not_found");
//! assert_eq!(Code::NotFound.default_level(), Level::Warn);
//! assert_eq!(Code::Internal.default_message(), "internal error");
//! ```

use std::fmt;
use std::str::FromStr;

// ============================================================================
// Classification Code
// ============================================================================

/// Classification code for a [`GqlError`](crate::GqlError).
///
/// The set is closed: constructors only accept these variants, so every
/// error crossing the response boundary has a known default level and
/// client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Code {
    /// The client specified an invalid argument, regardless of system state
    /// (e.g. a malformed identifier). Compare with `FailedPrecondition`.
    InvalidArgument,
    /// Some requested entity was not found.
    NotFound,
    /// An attempt to create an entity failed because one already exists.
    AlreadyExists,
    /// The caller is identified but lacks permission for the operation.
    /// Use `Unauthenticated` if the caller cannot be identified and
    /// `ResourceExhausted` for quota rejections.
    PermissionDenied,
    /// Some resource has been exhausted, such as a per-user quota.
    ResourceExhausted,
    /// The system is not in a state required for the operation.
    FailedPrecondition,
    /// The operation is not implemented or not enabled in this service.
    Unimplemented,
    /// An invariant expected by the underlying system has been broken.
    Internal,
    /// The request does not carry valid authentication credentials.
    Unauthenticated,
}

impl Code {
    /// Every code, in declaration order.
    pub const ALL: [Code; 9] = [
        Code::InvalidArgument,
        Code::NotFound,
        Code::AlreadyExists,
        Code::PermissionDenied,
        Code::ResourceExhausted,
        Code::FailedPrecondition,
        Code::Unimplemented,
        Code::Internal,
        Code::Unauthenticated,
    ];

    /// Wire representation used in `extensions.code`.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::ResourceExhausted => "resource_exhausted",
            Self::FailedPrecondition => "failed_precondition",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Level an error with this code is logged at when no override is set.
    #[inline]
    pub const fn default_level(self) -> Level {
        match self {
            Self::Internal => Level::Error,
            Self::InvalidArgument
            | Self::NotFound
            | Self::AlreadyExists
            | Self::PermissionDenied
            | Self::ResourceExhausted
            | Self::FailedPrecondition
            | Self::Unimplemented
            | Self::Unauthenticated => Level::Warn,
        }
    }

    /// Client-facing message used when no override is set.
    #[inline]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::PermissionDenied => "permission denied",
            Self::ResourceExhausted => "resource exhausted",
            Self::FailedPrecondition => "failed precondition",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal error",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Code {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for Code {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ParseCodeError {
                input: s.to_owned(),
            })
    }
}

/// Returned when a string is not one of the wire codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCodeError {
    input: String,
}

impl ParseCodeError {
    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code {:?}", self.input)
    }
}

impl std::error::Error for ParseCodeError {}

// ============================================================================
// Severity Level
// ============================================================================

/// Log level of an error, ordered from least to most severe.
///
/// `Unset` only means "no override given" and is never the resolved level
/// of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Level {
    /// No explicit override.
    #[default]
    Unset,
    /// Diagnostic noise.
    Debug,
    /// Expected, informational failures.
    Info,
    /// Client-triggerable failures.
    Warn,
    /// Programmer errors and backend failures.
    Error,
    /// Should never happen; logged through the sink's DPanic path.
    Panic,
}

impl Level {
    /// Lowercase name as it appears in logs.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Panic => "panic",
        }
    }

    /// Whether this level is an explicit override.
    #[inline]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_is_the_only_error_default() {
        for code in Code::ALL {
            let expected = if code == Code::Internal {
                Level::Error
            } else {
                Level::Warn
            };
            assert_eq!(code.default_level(), expected, "{code}");
        }
    }

    #[test]
    fn wire_strings_round_trip_through_from_str() {
        for code in Code::ALL {
            assert_eq!(code.as_str().parse::<Code>(), Ok(code));
        }
    }

    #[test]
    fn unknown_wire_string_is_rejected() {
        let err = "teapot".parse::<Code>().unwrap_err();
        assert_eq!(err.input(), "teapot");
        assert_eq!(err.to_string(), "unknown error code \"teapot\"");
    }

    #[test]
    fn default_messages_are_distinct() {
        let mut messages: Vec<_> = Code::ALL.iter().map(|c| c.default_message()).collect();
        messages.sort_unstable();
        messages.dedup();
        assert_eq!(messages.len(), Code::ALL.len());
    }

    #[test]
    fn levels_are_totally_ordered() {
        assert!(Level::Unset < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Panic);
        assert!(!Level::default().is_set());
        assert!(Level::Panic.is_set());
    }
}
