//! Typed structured fields attached to a [`GqlError`](crate::GqlError).
//!
//! Fields are only ever written to logs; nothing in here reaches a client.
//! Keys are `&'static str` so the set of keys used in a codebase stays
//! greppable. Values are typed so sinks can render them faithfully:
//!
//! - [`Field::string`]: owned or static text
//! - [`Field::int`]: signed integer
//! - [`Field::any`]: any `Debug` value, rendered lazily
//! - [`Field::error`]: an embedded cause error
//!
//! An error-typed field keyed `error` doubles as the cause of the error that
//! carries it; see [`GqlError::cause`](crate::GqlError::cause).
//!
//! Owned string values are zeroized on drop.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroize;

use crate::BoxError;

/// Key under which an embedded cause is stored.
pub const ERROR_KEY: &str = "error";

/// Error shared between a field, the log entry and the caller that built it.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Value of a structured field.
#[derive(Clone)]
pub enum FieldValue {
    /// Text value.
    Str(Cow<'static, str>),
    /// Integer value.
    Int(i64),
    /// Arbitrary value, rendered with its `Debug` impl.
    Any(Arc<dyn fmt::Debug + Send + Sync + 'static>),
    /// Embedded error.
    Error(SharedError),
}

impl FieldValue {
    /// The string value, if this is a text field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// The integer value, if this is an integer field.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The embedded error, if this is an error field.
    pub fn as_error(&self) -> Option<&SharedError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Any(v) => write!(f, "{v:?}"),
            Self::Error(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Any(v) => f.debug_tuple("Any").field(v).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(&format_args!("{e}")).finish(),
        }
    }
}

/// Equality compares text and integers by value, and arbitrary values and
/// errors by identity (the same shared instance).
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Any(a), Self::Any(b)) => Arc::ptr_eq(a, b),
            (Self::Error(a), Self::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Zeroize for FieldValue {
    fn zeroize(&mut self) {
        if let Self::Str(Cow::Owned(s)) = self {
            s.zeroize();
        }
    }
}

/// A single key/value pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    key: &'static str,
    value: FieldValue,
}

impl Field {
    /// Text field.
    #[inline]
    pub fn string(key: &'static str, value: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key,
            value: FieldValue::Str(value.into()),
        }
    }

    /// Integer field.
    #[inline]
    pub fn int(key: &'static str, value: impl Into<i64>) -> Self {
        Self {
            key,
            value: FieldValue::Int(value.into()),
        }
    }

    /// Field holding any `Debug` value.
    #[inline]
    pub fn any<T>(key: &'static str, value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Self {
            key,
            value: FieldValue::Any(Arc::new(value)),
        }
    }

    /// Embedded cause, keyed `error`.
    #[inline]
    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::shared_error(Arc::new(err))
    }

    /// Embedded cause from an already boxed error.
    #[inline]
    pub fn boxed_error(err: BoxError) -> Self {
        Self::shared_error(Arc::from(err))
    }

    /// Embedded cause the caller keeps a handle to.
    ///
    /// Useful when the same instance must later be compared against
    /// [`GqlError::cause`](crate::GqlError::cause).
    #[inline]
    pub fn shared_error(err: SharedError) -> Self {
        Self::named_error(ERROR_KEY, err)
    }

    /// Error-typed field under a custom key. Only fields keyed `error` count
    /// as the cause.
    #[inline]
    pub fn named_error(key: &'static str, err: SharedError) -> Self {
        Self {
            key,
            value: FieldValue::Error(err),
        }
    }

    /// Field key.
    #[inline]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Field value.
    #[inline]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// The embedded error if this field is the cause slot.
    #[inline]
    pub(crate) fn as_cause(&self) -> Option<&SharedError> {
        if self.key != ERROR_KEY {
            return None;
        }
        self.value.as_error()
    }
}

impl Zeroize for Field {
    fn zeroize(&mut self) {
        self.value.zeroize();
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn typed_constructors() {
        assert_eq!(Field::string("k", "v").value().as_str(), Some("v"));
        assert_eq!(Field::int("n", -123i32).value().as_int(), Some(-123));
        assert_eq!(Field::any("a", vec![1, 2]).to_string(), "a=[1, 2]");
    }

    #[test]
    fn only_error_key_is_a_cause() {
        let err: SharedError = Arc::new(io::Error::other("disk"));
        assert!(Field::shared_error(err.clone()).as_cause().is_some());
        assert!(Field::named_error("upstream", err).as_cause().is_none());
        assert!(Field::string("error", "not an error").as_cause().is_none());
    }

    #[test]
    fn errors_compare_by_identity() {
        let a: SharedError = Arc::new(io::Error::other("same text"));
        let b: SharedError = Arc::new(io::Error::other("same text"));
        assert_eq!(Field::shared_error(a.clone()), Field::shared_error(a.clone()));
        assert_ne!(Field::shared_error(a), Field::shared_error(b));
    }

    #[test]
    fn zeroize_clears_owned_text_only() {
        let mut owned = Field::string("k", String::from("secret"));
        owned.zeroize();
        assert_eq!(owned.value().as_str(), Some(""));

        let mut borrowed = Field::string("k", "static");
        borrowed.zeroize();
        assert_eq!(borrowed.value().as_str(), Some("static"));
    }
}
