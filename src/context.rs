//! Request context handed down from the GraphQL executor.
//!
//! The executor knows which field is being resolved when a resolver fails.
//! It exposes that position as a [`Path`] on a [`RequestContext`], which
//! error constructors capture so the boundary can log and report it.
//!
//! When no request is in flight (background jobs, unit tests) use
//! [`RequestContext::background`]; errors built from it carry an empty path.
//!
//! # Example
//!
//! ```rust
//! use gqlerr::{Path, RequestContext};
//!
//! let ctx = RequestContext::with_path(Path::root().field("users").index(2).field("name"));
//! assert_eq!(ctx.path().to_string(), "users[2].name");
//! ```

use smallvec::SmallVec;
use std::fmt;

/// One step in a response path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A field (or alias) name.
    Field(String),
    /// A position in a list.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a field in the response, outermost segment first.
///
/// Most queries nest only a few levels deep, so segments are stored inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: SmallVec<[PathSegment; 8]>,
}

impl Path {
    /// The empty path.
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a field name.
    #[inline]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// Append a list index.
    #[inline]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Segments, outermost first.
    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Field names are joined with `.`; indices render as `[n]` with no
/// separator, so `users[2].name`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Field(name) => {
                    if i != 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PathSegment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Field(name) => serializer.serialize_str(name),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.segments.iter())
    }
}

/// Per-request state the executor makes available to resolvers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    path: Option<Path>,
}

impl RequestContext {
    /// Context with no request in flight.
    #[inline]
    pub fn background() -> Self {
        Self::default()
    }

    /// Context for the field at `path`.
    #[inline]
    pub fn with_path(path: Path) -> Self {
        Self { path: Some(path) }
    }

    /// Current path, or the empty path outside of a request.
    #[inline]
    pub fn path(&self) -> Path {
        self.path.clone().unwrap_or_default()
    }

    /// Whether the executor supplied a path.
    #[inline]
    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_like_graphql_paths() {
        let path = Path::root().field("users").index(2).field("name");
        assert_eq!(path.to_string(), "users[2].name");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn leading_index_has_no_separator() {
        let path: Path = [PathSegment::Index(0), PathSegment::from("id")]
            .into_iter()
            .collect();
        assert_eq!(path.to_string(), "[0].id");
    }

    #[test]
    fn background_context_has_empty_path() {
        let ctx = RequestContext::background();
        assert!(!ctx.has_path());
        assert!(ctx.path().is_empty());
        assert_eq!(ctx.path().to_string(), "");
    }

    #[test]
    fn from_iter_accepts_names() {
        let path: Path = ["viewer", "repositories"].into_iter().collect();
        assert_eq!(path.to_string(), "viewer.repositories");
    }
}
