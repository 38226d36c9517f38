//! Existence checks and idempotent deletion

use crate::classify::{classify, EntryKind};
use crate::error::{Access, Result};
use crate::provider::ObjectProvider;
use crate::uri::{depth_below, is_marker_name, ObjectUri};
use std::cmp::Reverse;
use tracing::debug;

/// Check whether the URI currently exists with the given shape
pub fn exists_as(provider: &dyn ObjectProvider, uri: &ObjectUri, kind: EntryKind) -> Result<bool> {
    Ok(kind.matches(classify(provider, uri)?))
}

/// Delete a file, or everything under a directory prefix
///
/// Absence is not an error. Directory contents are removed deepest first,
/// with a marker removed after everything else at its level and the
/// directory's own marker removed last. Returns the
/// number of objects deleted.
pub fn clear(provider: &dyn ObjectProvider, uri: &ObjectUri, kind: EntryKind) -> Result<usize> {
    uri.require_object(Access::Delete)?;

    match kind {
        EntryKind::File => match provider.get_object(uri.bucket(), uri.path())? {
            Some(object) => {
                provider.delete(&object)?;
                debug!("Deleted {}", uri);
                Ok(1)
            }
            None => {
                debug!("Nothing to delete at {}", uri);
                Ok(0)
            }
        },
        EntryKind::Directory => {
            let prefix = uri.dir_prefix();
            let mut objects = provider.list_objects(uri.bucket(), &prefix, None)?;
            // the prefix's own marker goes last, after everything it covers
            objects.sort_by_key(|o| {
                (
                    o.name == prefix,
                    Reverse(depth_below(&prefix, &o.name)),
                    is_marker_name(&o.name),
                )
            });

            for object in &objects {
                provider.delete(object)?;
            }
            debug!("Deleted {} objects under {}", objects.len(), uri);
            Ok(objects.len())
        }
    }
}
