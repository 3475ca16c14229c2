//! # gqlerr
//!
//! Structured errors for GraphQL resolvers, logged at the right level and
//! reported safely at the response boundary.
//!
//! ## Design Philosophy
//!
//! 1. **Resolvers return rich errors**: a classification code, an internal
//!    message and structured fields for the logs
//! 2. **Clients see only what is meant for them**: a per-code default message
//!    unless a client message is set explicitly, plus the code and an optional
//!    machine-readable reason
//! 3. **Every error is logged exactly once**, at the response boundary, at a
//!    level derived from its code unless overridden
//! 4. **Unknown errors are never surfaced verbatim**: they are coerced to
//!    `internal` and logged with their type for diagnosis
//! 5. **Reporting an error never fails**
//!
//! ## Quick Start
//!
//! ```rust
//! use gqlerr::{ErrorPresenter, Field, GqlError, RequestContext, Result, TracingSink};
//!
//! fn parse_muffin_count(ctx: &RequestContext, count: i64) -> Result<u32> {
//!     u32::try_from(count).map_err(|e| {
//!         GqlError::invalid_argument(ctx, "user entered a bad number of muffins", [
//!             Field::int("muffin_count", count),
//!             Field::error(e),
//!         ])
//!         .with_message("bad input given")
//!         .with_error_id("muffins_must_be_positive")
//!     })
//! }
//!
//! let presenter = ErrorPresenter::new(TracingSink::new());
//! let ctx = RequestContext::background();
//!
//! let err = parse_muffin_count(&ctx, -123).unwrap_err();
//! let response = presenter.present_error(err);
//!
//! // Client response: {"message":"bad input given","extensions":{"code":"invalid_argument",
//! //                   "error_reason":"muffins_must_be_positive"}}
//! assert_eq!(response.message, "bad input given");
//! assert_eq!(response.extensions.get("code"), Some("invalid_argument"));
//!
//! // Log: WARN user entered a bad number of muffins
//! //      muffin_count='-123' error='out of range integral type conversion attempted'
//! ```
//!
//! ## Lifecycle
//!
//! A [`GqlError`] is built by one of the per-code constructors, decorated in
//! the same call chain (`with_message`, `with_error_id`, `at_*`), and handed to
//! the executor as the resolver's error. The executor passes it, once, to an
//! [`ErrorPresenter`], which logs it and returns a [`ClientError`]. Decoration
//! consumes and returns the owned value, so once an error has been handed off
//! nothing can change it.
//!
//! Panics caught by the executor go through [`recover_to_error`] and then the
//! same presenter.
//!
//! ## Features
//!
//! - `serde`: serialize [`ClientError`] in the GraphQL response wire format

#![warn(missing_docs)]
#![warn(clippy::all)]

use smallvec::SmallVec;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::result;
use zeroize::Zeroize;

pub mod codes;
pub mod context;
pub mod convenience;
pub mod fields;
pub mod logging;
pub mod presenter;
pub mod recover;
pub mod ring_buffer;

pub use codes::*;
pub use context::*;
pub use fields::*;
pub use logging::*;
pub use presenter::*;
pub use recover::*;
pub use ring_buffer::RingBufferSink;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, GqlError>;

/// Boxed error as handed around by GraphQL executors.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

// ============================================================================
// Client Error Identifier
// ============================================================================

/// Domain-specific reason reported to clients in `extensions.error_reason`,
/// like `admin_only` or `too_many_muffins`.
///
/// Unlike [`Code`], the set of reasons is open and owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ErrorId(Cow<'static, str>);

impl ErrorId {
    /// Create an identifier.
    #[inline]
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no identifier was set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for ErrorId {
    fn from(id: &'static str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ErrorId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// GqlError
// ============================================================================

/// Error returned by resolvers.
///
/// # Key Properties
///
/// - `code`, internal message, path and fields are fixed at construction
/// - Level, client message and error id can be overridden through the fluent
///   decoration methods; the last write wins
/// - The internal message and fields go to logs only, never to clients
/// - An `error`-keyed error field is the [`cause`](Self::cause) and is
///   exposed through [`Error::source`], so cause-chain walks see through it
/// - Owned message and field text is zeroized on drop
#[must_use = "errors should be returned to the executor or presented"]
pub struct GqlError {
    // Set for every error
    code: Code,
    msg: Cow<'static, str>,
    path: Path,

    // Overrides; defaults come from the code
    level: Level,
    client_msg: Cow<'static, str>,

    fields: SmallVec<[Field; 4]>,
    error_id: ErrorId,
}

impl GqlError {
    /// Create an error with the given code.
    ///
    /// `msg` and `fields` are only logged and never shown to clients. The
    /// request path is captured from `ctx`. For client-visible output see
    /// [`with_message`](Self::with_message) and
    /// [`with_error_id`](Self::with_error_id).
    #[inline]
    pub fn new(
        ctx: &RequestContext,
        code: Code,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self {
            code,
            msg: msg.into(),
            path: ctx.path(),
            level: Level::Unset,
            client_msg: Cow::Borrowed(""),
            fields: fields.into_iter().collect(),
            error_id: ErrorId::default(),
        }
    }

    /// Create an `invalid_argument` error
    #[inline]
    pub fn invalid_argument(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::InvalidArgument, msg, fields)
    }

    /// Create a `not_found` error
    #[inline]
    pub fn not_found(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::NotFound, msg, fields)
    }

    /// Create an `already_exists` error
    #[inline]
    pub fn already_exists(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::AlreadyExists, msg, fields)
    }

    /// Create a `permission_denied` error
    #[inline]
    pub fn permission_denied(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::PermissionDenied, msg, fields)
    }

    /// Create a `resource_exhausted` error
    #[inline]
    pub fn resource_exhausted(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::ResourceExhausted, msg, fields)
    }

    /// Create a `failed_precondition` error
    #[inline]
    pub fn failed_precondition(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::FailedPrecondition, msg, fields)
    }

    /// Create an `unimplemented` error
    #[inline]
    pub fn unimplemented(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::Unimplemented, msg, fields)
    }

    /// Create an `internal` error
    #[inline]
    pub fn internal(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::Internal, msg, fields)
    }

    /// Create an `unauthenticated` error
    #[inline]
    pub fn unauthenticated(
        ctx: &RequestContext,
        msg: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self::new(ctx, Code::Unauthenticated, msg, fields)
    }

    // Decoration. Each method consumes the error and hands it back so calls
    // chain in any order.

    /// Set the message shown to clients in the response `errors` entry.
    #[inline]
    pub fn with_message(mut self, msg: impl Into<Cow<'static, str>>) -> Self {
        self.client_msg = msg.into();
        self
    }

    /// Set the reason reported to client apps in `extensions.error_reason`.
    #[inline]
    pub fn with_error_id(mut self, id: impl Into<ErrorId>) -> Self {
        self.error_id = id.into();
        self
    }

    /// Log at DEBUG instead of the code's default level.
    #[inline]
    pub fn at_debug(mut self) -> Self {
        self.level = Level::Debug;
        self
    }

    /// Log at INFO instead of the code's default level.
    #[inline]
    pub fn at_info(mut self) -> Self {
        self.level = Level::Info;
        self
    }

    /// Log at WARN instead of the code's default level.
    #[inline]
    pub fn at_warn(mut self) -> Self {
        self.level = Level::Warn;
        self
    }

    /// Log at ERROR instead of the code's default level.
    #[inline]
    pub fn at_error(mut self) -> Self {
        self.level = Level::Error;
        self
    }

    /// Log through the sink's DPanic path.
    ///
    /// This doesn't panic with a production sink; it logs at error level.
    #[inline]
    pub fn at_panic(mut self) -> Self {
        self.level = Level::Panic;
        self
    }

    /// Classification code.
    #[inline]
    pub const fn code(&self) -> Code {
        self.code
    }

    /// Internal message. Logged, never shown to clients.
    #[inline]
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Request path captured at construction.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Structured fields in construction order.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Client error identifier, empty unless set.
    #[inline]
    pub fn error_id(&self) -> &ErrorId {
        &self.error_id
    }

    /// Level override, `Unset` unless one of the `at_*` methods was called.
    #[inline]
    pub const fn level_override(&self) -> Level {
        self.level
    }

    /// Level this error is logged at.
    #[inline]
    pub fn level(&self) -> Level {
        if self.level.is_set() {
            return self.level;
        }
        match self.code.default_level() {
            Level::Unset => Level::Error,
            level => level,
        }
    }

    /// Message shown to clients: the override if set, else the code default.
    #[inline]
    pub fn client_message(&self) -> &str {
        if !self.client_msg.is_empty() {
            return &self.client_msg;
        }
        self.code.default_message()
    }

    /// First embedded cause (an `error`-keyed error field), if any.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.fields
            .iter()
            .find_map(Field::as_cause)
            .map(|err| &**err)
    }

    /// Walk the cause chain looking for an error of type `E`.
    pub fn find_cause<E: Error + 'static>(&self) -> Option<&E> {
        let mut current = self.source();
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Build the client-safe response entry for this error.
    pub fn to_client_error(&self) -> ClientError {
        ClientError {
            message: self.client_message().to_owned(),
            path: (!self.path.is_empty()).then(|| self.path.clone()),
            extensions: Extensions {
                code: self.code,
                error_reason: (!self.error_id.is_empty())
                    .then(|| self.error_id.as_str().to_owned()),
            },
        }
    }

    /// Like [`to_client_error`](Self::to_client_error), passing `None`
    /// through for the no-error path.
    #[inline]
    pub fn to_client_error_opt(err: Option<&GqlError>) -> Option<ClientError> {
        err.map(Self::to_client_error)
    }
}

impl Drop for GqlError {
    fn drop(&mut self) {
        if let Cow::Owned(ref mut s) = self.msg {
            s.zeroize();
        }
        for field in &mut self.fields {
            field.zeroize();
        }
    }
}

impl fmt::Debug for GqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GqlError")
            .field("code", &self.code)
            .field("msg", &self.msg)
            .field("path", &self.path.to_string())
            .field("level", &self.level)
            .field("client_msg", &self.client_msg)
            .field("error_id", &self.error_id)
            .field("fields", &self.fields)
            .finish()
    }
}

/// `[code] message`, plus `: cause` when there is one. Fields are left to
/// the logger.
impl fmt::Display for GqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.msg)?;
        if let Some(cause) = self.cause() {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl Error for GqlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause().map(|err| err as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    struct RandomError;

    impl fmt::Display for RandomError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a random error")
        }
    }

    impl Error for RandomError {}

    type Constructor = fn(&RequestContext, &'static str, [Field; 0]) -> GqlError;

    #[test]
    fn constructors_set_code_and_default_level() {
        let cases: [(Constructor, Code); 9] = [
            (GqlError::invalid_argument, Code::InvalidArgument),
            (GqlError::not_found, Code::NotFound),
            (GqlError::already_exists, Code::AlreadyExists),
            (GqlError::permission_denied, Code::PermissionDenied),
            (GqlError::resource_exhausted, Code::ResourceExhausted),
            (GqlError::failed_precondition, Code::FailedPrecondition),
            (GqlError::unimplemented, Code::Unimplemented),
            (GqlError::internal, Code::Internal),
            (GqlError::unauthenticated, Code::Unauthenticated),
        ];

        let ctx = RequestContext::background();
        for (constructor, code) in cases {
            let err = constructor(&ctx, "some error occurred", []);
            assert_eq!(err.code(), code);
            assert_eq!(err.level(), code.default_level());
            assert_eq!(err.client_message(), code.default_message());
            assert_eq!(err.level_override(), Level::Unset);
        }
    }

    #[test]
    fn cause_is_the_error_field() {
        let err = GqlError::internal(
            &RequestContext::background(),
            "some error",
            [
                Field::string("a_field", "test"),
                Field::int("another_field", 123),
                Field::error(RandomError),
            ],
        );

        let cause = err.cause().expect("cause");
        assert_eq!(cause.downcast_ref::<RandomError>(), Some(&RandomError));
        assert_eq!(err.find_cause::<RandomError>(), Some(&RandomError));
    }

    #[test]
    fn cause_is_the_same_instance() {
        let underlying: fields::SharedError =
            Arc::new(io::Error::other("muffin validation failed"));
        let err = GqlError::invalid_argument(
            &RequestContext::background(),
            "bad muffins",
            [Field::shared_error(Arc::clone(&underlying))],
        );

        let cause: *const dyn Error = err.source().expect("source");
        assert!(std::ptr::addr_eq(cause, Arc::as_ptr(&underlying)));
    }

    #[test]
    fn first_error_field_wins() {
        let err = GqlError::internal(
            &RequestContext::background(),
            "two causes",
            [
                Field::named_error("upstream", Arc::new(io::Error::other("ignored"))),
                Field::error(io::Error::other("first")),
                Field::error(io::Error::other("second")),
            ],
        );
        assert_eq!(err.cause().map(|c| c.to_string()).as_deref(), Some("first"));
    }

    #[test]
    fn no_cause_without_error_field() {
        let err = GqlError::not_found(&RequestContext::background(), "missing", []);
        assert!(err.cause().is_none());
        assert!(err.source().is_none());
        assert!(err.find_cause::<io::Error>().is_none());
    }

    #[test]
    fn decorations_last_write_wins() {
        let err = GqlError::not_found(&RequestContext::background(), "missing", [])
            .with_message("first")
            .at_debug()
            .with_error_id("a")
            .with_message("second")
            .at_info()
            .with_error_id("b");

        assert_eq!(err.client_message(), "second");
        assert_eq!(err.level(), Level::Info);
        assert_eq!(err.error_id().as_str(), "b");
        assert_eq!(err.code(), Code::NotFound);
    }

    #[test]
    fn decoration_order_does_not_matter() {
        let ctx = RequestContext::background();
        let a = GqlError::internal(&ctx, "x", [])
            .at_warn()
            .with_message("m")
            .with_error_id("id");
        let b = GqlError::internal(&ctx, "x", [])
            .with_error_id("id")
            .with_message("m")
            .at_warn();
        assert_eq!(a.to_client_error(), b.to_client_error());
        assert_eq!(a.level(), b.level());
    }

    #[test]
    fn every_level_override() {
        let ctx = RequestContext::background();
        let make = || GqlError::internal(&ctx, "x", []);
        assert_eq!(make().at_debug().level(), Level::Debug);
        assert_eq!(make().at_info().level(), Level::Info);
        assert_eq!(make().at_warn().level(), Level::Warn);
        assert_eq!(make().at_error().level(), Level::Error);
        assert_eq!(make().at_panic().level(), Level::Panic);
    }

    #[test]
    fn empty_client_message_falls_back_to_default() {
        let err = GqlError::permission_denied(&RequestContext::background(), "nope", [])
            .with_message("");
        assert_eq!(err.client_message(), "permission denied");
    }

    #[test]
    fn display_includes_code_and_cause() {
        let ctx = RequestContext::background();
        let plain = GqlError::not_found(&ctx, "no such muffin", []);
        assert_eq!(plain.to_string(), "[not_found] no such muffin");

        let wrapped = GqlError::internal(&ctx, "query failed", [Field::error(RandomError)]);
        assert_eq!(wrapped.to_string(), "[internal] query failed: a random error");
    }

    #[test]
    fn client_error_shape() {
        let ctx = RequestContext::with_path(Path::root().field("muffins").index(1));
        let err = GqlError::invalid_argument(&ctx, "internal detail", [])
            .with_message("bad input given")
            .with_error_id("muffins_must_be_positive");

        let client = err.to_client_error();
        assert_eq!(client.message, "bad input given");
        assert_eq!(client.path, Some(Path::root().field("muffins").index(1)));
        assert_eq!(client.extensions.code, Code::InvalidArgument);
        assert_eq!(
            client.extensions.error_reason.as_deref(),
            Some("muffins_must_be_positive")
        );
        assert!(!format!("{client:?}").contains("internal detail"));
    }

    #[test]
    fn client_error_omits_unset_parts() {
        let err = GqlError::internal(&RequestContext::background(), "boom", []);
        let client = err.to_client_error();
        assert_eq!(client.message, "internal error");
        assert_eq!(client.path, None);
        assert_eq!(client.extensions.error_reason, None);
    }

    #[test]
    fn absent_error_has_no_client_error() {
        assert_eq!(GqlError::to_client_error_opt(None), None);

        let err = GqlError::not_found(&RequestContext::background(), "x", []);
        assert_eq!(
            GqlError::to_client_error_opt(Some(&err)),
            Some(err.to_client_error())
        );
    }

    #[test]
    fn gql_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<GqlError>();
    }
}
