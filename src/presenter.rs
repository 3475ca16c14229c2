//! Response-boundary conversion of errors.
//!
//! The GraphQL executor hands every resolver error to an [`ErrorPresenter`]
//! exactly once. The presenter:
//!
//! 1. Finds the outermost [`GqlError`] in the error's source chain
//! 2. Logs it through its [`LogSink`] at the error's level, prepending a
//!    `gql_path` field when the request path is known
//! 3. Returns the client-safe [`ClientError`]
//!
//! Errors that don't wrap a [`GqlError`] are logged at error level together
//! with their type name, and reported to the client as a plain `internal`
//! error so their text never leaks.
//!
//! The presenter cannot fail. It writes zero or one log entry and returns
//! zero or one client error per call.

use crate::{BoxError, Code, Field, GqlError, LogEntry, LogSink, Path, RequestContext, SinkLevel};
use crate::fields::SharedError;
use std::error::Error;
use std::sync::Arc;

/// Message logged when an error reaching the boundary is not a [`GqlError`].
pub const UNRECOGNIZED_ERROR_MESSAGE: &str = "received error that was not of type gqlerr::GqlError";

// ============================================================================
// Client Error
// ============================================================================

/// Entry for the `errors` list of a GraphQL response.
///
/// Holds only client-safe data: the client message, the response path and
/// the extensions. With the `serde` feature it serializes as
/// `{"message":..,"path":[..],"extensions":{"code":..,"error_reason":..}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClientError {
    /// Client-facing message.
    pub message: String,
    /// Response path of the failing field, absent outside a request.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub path: Option<Path>,
    /// Machine-readable details.
    pub extensions: Extensions,
}

/// The `extensions` object of a [`ClientError`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extensions {
    /// Classification code, always present.
    pub code: Code,
    /// Client error identifier, present only when one was set.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error_reason: Option<String>,
}

impl Extensions {
    /// Look up an extension by its wire key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "code" => Some(self.code.as_str()),
            "error_reason" => self.error_reason.as_deref(),
            _ => None,
        }
    }

    /// Number of keys present.
    pub fn len(&self) -> usize {
        1 + usize::from(self.error_reason.is_some())
    }

    /// Always false: `code` is always present.
    pub fn is_empty(&self) -> bool {
        false
    }
}

// ============================================================================
// Presenter
// ============================================================================

/// Converts resolver errors into client errors, logging each one.
///
/// Stateless apart from its sink, so one presenter can serve any number of
/// concurrent requests if the sink can.
#[derive(Debug, Clone, Default)]
pub struct ErrorPresenter<S> {
    sink: S,
}

impl<S: LogSink> ErrorPresenter<S> {
    /// Create a presenter that logs to `sink`.
    #[inline]
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// The sink entries are written to.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Present whatever error a resolver produced.
    ///
    /// `None` means no error occurred: nothing is logged and `None` is
    /// returned. For unrecognized errors, the `type` field is the type of
    /// `err` as passed in, which for a [`BoxError`] is just the box. The
    /// `error_debug` field carries the error's `Debug` output, which names the
    /// concrete type for most errors.
    ///
    /// ```rust
    /// use gqlerr::{ErrorPresenter, RequestContext};
    /// use gqlerr::ring_buffer::RingBufferSink;
    ///
    /// let sink = RingBufferSink::new(16, 1024);
    /// let presenter = ErrorPresenter::new(sink.clone());
    /// let ctx = RequestContext::background();
    ///
    /// let response = presenter.present(&ctx, Some(std::fmt::Error)).unwrap();
    /// assert_eq!(response.message, "internal error");
    /// assert_eq!(sink.get_all()[0].field("type").unwrap().to_string(), "type=core::fmt::Error");
    /// ```
    pub fn present<E>(&self, ctx: &RequestContext, err: Option<E>) -> Option<ClientError>
    where
        E: Into<BoxError> + 'static,
    {
        let err = err?;
        let type_name = std::any::type_name::<E>();
        Some(self.present_boxed(ctx, err.into(), type_name))
    }

    /// Present an error that is already known to be a [`GqlError`].
    #[inline]
    pub fn present_error(&self, err: GqlError) -> ClientError {
        self.log_error(&err);
        err.to_client_error()
    }

    /// Write the log entry for `err` without building a client error.
    pub fn log_error(&self, err: &GqlError) {
        let level = SinkLevel::from_level(err.level());
        let mut entry = LogEntry::new(level, err.message(), err.fields());
        let path = err.path();
        if !path.is_empty() {
            entry = entry.with_path(path.to_string());
        }
        self.sink.log(&entry);
    }

    fn present_boxed(
        &self,
        ctx: &RequestContext,
        err: BoxError,
        type_name: &'static str,
    ) -> ClientError {
        if let Some(gql_err) = find_gql_error(err.as_ref()) {
            self.log_error(gql_err);
            return gql_err.to_client_error();
        }

        let original: SharedError = Arc::from(err);
        let fields = [
            Field::string("type", type_name),
            Field::shared_error(Arc::clone(&original)),
            Field::string("error_debug", format!("{original:?}")),
        ];
        self.sink
            .log(&LogEntry::new(SinkLevel::Error, UNRECOGNIZED_ERROR_MESSAGE, &fields));

        GqlError::internal(ctx, original.to_string(), [Field::shared_error(original)])
            .to_client_error()
    }
}

/// Outermost [`GqlError`] in the source chain of `err`, including `err`
/// itself.
pub fn find_gql_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a GqlError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<GqlError>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}
