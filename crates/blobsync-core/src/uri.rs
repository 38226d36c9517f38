//! Remote object identifiers of the form `scheme://bucket[/path][/]`

use crate::error::{Access, Error, Result};
use std::fmt;
use std::str::FromStr;

/// Path separator used by object stores
pub const SEPARATOR: char = '/';

const SCHEME_DELIMITER: &str = "://";

/// Check whether a string looks like a remote object URI
pub fn is_remote_uri(s: &str) -> bool {
    match s.split_once(SCHEME_DELIMITER) {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}

/// A parsed remote object identifier
///
/// The path is kept verbatim. An empty path names the bucket itself and a
/// trailing separator hints at a directory-like prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUri {
    scheme: String,
    bucket: String,
    path: String,
}

impl ObjectUri {
    /// Parse a URI like `gs://bucket/path/to/object`
    ///
    /// Everything before the first `/` after the scheme is the bucket, the
    /// rest (possibly empty) is the path.
    pub fn parse(uri: &str) -> Result<Self> {
        if !is_remote_uri(uri) {
            return Err(Error::invalid_uri(uri, Access::Read, "expected scheme://bucket[/path]"));
        }
        let (scheme, rest) = uri
            .split_once(SCHEME_DELIMITER)
            .ok_or_else(|| Error::invalid_uri(uri, Access::Read, "missing scheme"))?;

        let (bucket, path) = match rest.split_once(SEPARATOR) {
            Some((bucket, path)) => (bucket, path),
            None => (rest, ""),
        };
        if bucket.is_empty() {
            return Err(Error::invalid_uri(uri, Access::Read, "missing bucket name"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    /// Build a URI from its parts
    pub fn new(scheme: impl Into<String>, bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True when the URI names the bucket itself
    pub fn is_bucket(&self) -> bool {
        self.path.is_empty()
    }

    /// True when the path carries the trailing directory hint
    pub fn has_dir_hint(&self) -> bool {
        self.path.ends_with(SEPARATOR)
    }

    /// The path normalized to a listing prefix ending in the separator
    ///
    /// The bucket root normalizes to the empty prefix.
    pub fn dir_prefix(&self) -> String {
        dir_prefix(&self.path)
    }

    /// Same URI with the path normalized to end in the separator
    pub fn to_dir(&self) -> Self {
        Self {
            scheme: self.scheme.clone(),
            bucket: self.bucket.clone(),
            path: self.dir_prefix(),
        }
    }

    /// Same bucket with another object name
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            scheme: self.scheme.clone(),
            bucket: self.bucket.clone(),
            path: path.into(),
        }
    }

    /// Append a relative name below this URI's directory prefix
    pub fn join(&self, relative: &str) -> Self {
        let mut path = self.dir_prefix();
        path.push_str(relative.trim_start_matches(SEPARATOR));
        self.with_path(path)
    }

    /// Fail with `InvalidUri` when the URI names a bare bucket
    pub fn require_object(&self, access: Access) -> Result<()> {
        if self.is_bucket() {
            return Err(Error::invalid_uri(
                self,
                access,
                "an object path is required, got a bare bucket",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.path)
    }
}

impl FromStr for ObjectUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Normalize an object path to a prefix ending in the separator
pub fn dir_prefix(path: &str) -> String {
    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}{SEPARATOR}")
    }
}

/// True when an object name is a directory marker
pub fn is_marker_name(name: &str) -> bool {
    name.ends_with(SEPARATOR)
}

/// Number of levels an object sits below `prefix`
///
/// Counts separators in the name relative to the prefix, ignoring a trailing
/// marker separator. The prefix's own marker and its direct children are at
/// level 0.
pub fn depth_below(prefix: &str, name: &str) -> usize {
    name.trim_end_matches(SEPARATOR)
        .get(prefix.len()..)
        .unwrap_or("")
        .matches(SEPARATOR)
        .count()
}
