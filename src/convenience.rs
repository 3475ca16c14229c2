//! Convenience macros for creating errors with format strings.
//!
//! # Usage
//!
//! ```rust
//! use gqlerr::{Code, Field, RequestContext, gql_error};
//!
//! let ctx = RequestContext::background();
//! let user_id = 42;
//!
//! // Formatted internal message, no fields
//! let err = gql_error!(&ctx, Code::NotFound, "user {} has no muffins", user_id);
//! assert_eq!(err.message(), "user 42 has no muffins");
//!
//! // Fields follow a `;`
//! let err = gql_error!(&ctx, Code::NotFound, "user {} has no muffins", user_id;
//!     Field::int("user_id", user_id),
//! );
//! assert_eq!(err.fields().len(), 1);
//! ```
//!
//! The formatted text is the *internal* message and is only logged. Client
//! output still goes through `with_message` / `with_error_id`.

/// Build a [`GqlError`](crate::GqlError) with a formatted internal message.
///
/// `gql_error!(ctx, code, "fmt", args...; field, field, ...)`
#[macro_export]
macro_rules! gql_error {
    ($ctx:expr, $code:expr, $fmt:literal $(, $arg:expr)* $(,)? $(; $($field:expr),* $(,)?)?) => {
        $crate::GqlError::new(
            $ctx,
            $code,
            ::std::format!($fmt $(, $arg)*),
            [$($($field),*)?],
        )
    };
}
