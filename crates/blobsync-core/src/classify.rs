//! Object classification: bucket, directory, file, or nothing

use crate::error::Result;
use crate::provider::ObjectProvider;
use crate::uri::{is_marker_name, ObjectUri};
use std::fmt;
use tracing::debug;

/// What a remote URI currently denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// The URI names a bare bucket
    Bucket,
    /// A directory marker exists, or at least one object lives under the prefix
    Directory,
    /// An exact-name object exists that is not a marker
    File,
    /// Nothing exists at the URI
    Absent,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Bucket => "bucket",
            ObjectKind::Directory => "directory",
            ObjectKind::File => "file",
            ObjectKind::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// The shape of a path as declared by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("file"),
            EntryKind::Directory => f.write_str("directory"),
        }
    }
}

impl EntryKind {
    /// True when `kind` satisfies this declared shape
    pub fn matches(self, kind: ObjectKind) -> bool {
        matches!(
            (self, kind),
            (EntryKind::File, ObjectKind::File) | (EntryKind::Directory, ObjectKind::Directory)
        )
    }
}

/// Determine what a URI denotes right now
///
/// Nothing is cached: remote state may change between calls.
pub fn classify(provider: &dyn ObjectProvider, uri: &ObjectUri) -> Result<ObjectKind> {
    if uri.is_bucket() {
        return Ok(ObjectKind::Bucket);
    }
    provider.get_bucket(uri.bucket())?;

    if let Some(object) = provider.get_object(uri.bucket(), uri.path())? {
        let kind = if is_marker_name(&object.name) {
            ObjectKind::Directory
        } else {
            ObjectKind::File
        };
        debug!("{} is a {} (exact match)", uri, kind);
        return Ok(kind);
    }

    let prefix = uri.dir_prefix();
    let listed = provider.list_objects(uri.bucket(), &prefix, Some(1))?;
    let kind = if listed.is_empty() {
        ObjectKind::Absent
    } else {
        ObjectKind::Directory
    };
    debug!("{} is {} (prefix listing)", uri, kind);
    Ok(kind)
}
