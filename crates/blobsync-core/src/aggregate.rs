//! Depth-limited modification time of a remote tree

use crate::classify::{classify, ObjectKind};
use crate::error::Result;
use crate::metadata::logical_mtime;
use crate::provider::ObjectProvider;
use crate::uri::{depth_below, ObjectUri};
use tracing::debug;

/// Effective modification time of a file or directory
///
/// A file, or any URI with `max_depth == 0`, yields that single object's
/// logical mtime. Otherwise the result is the newest logical mtime among
/// objects less than `max_depth` levels below the prefix. Absence is never an
/// error: nothing to look at yields `0.0`.
pub fn aggregate_mtime(
    provider: &dyn ObjectProvider,
    uri: &ObjectUri,
    max_depth: usize,
) -> Result<f64> {
    let kind = classify(provider, uri)?;

    match kind {
        ObjectKind::Absent => return Ok(0.0),
        // a bucket has no object of its own to stand in for it
        ObjectKind::Bucket if max_depth == 0 => return Ok(0.0),
        ObjectKind::File => return single_object_mtime(provider, uri),
        ObjectKind::Directory if max_depth == 0 => return single_object_mtime(provider, uri),
        ObjectKind::Bucket | ObjectKind::Directory => {}
    }

    let prefix = uri.dir_prefix();
    let newest = provider
        .list_objects(uri.bucket(), &prefix, None)?
        .iter()
        .filter(|object| depth_below(&prefix, &object.name) < max_depth)
        .map(logical_mtime)
        .fold(None, |acc: Option<f64>, mtime| Some(acc.map_or(mtime, |a| a.max(mtime))))
        .unwrap_or(0.0);

    debug!("Aggregated mtime of {} to depth {}: {}", uri, max_depth, newest);
    Ok(newest)
}

/// Logical mtime of the object named by the URI, or its directory marker
fn single_object_mtime(provider: &dyn ObjectProvider, uri: &ObjectUri) -> Result<f64> {
    if let Some(object) = provider.get_object(uri.bucket(), uri.path())? {
        return Ok(logical_mtime(&object));
    }
    if !uri.has_dir_hint() {
        if let Some(marker) = provider.get_object(uri.bucket(), &uri.dir_prefix())? {
            return Ok(logical_mtime(&marker));
        }
    }
    Ok(0.0)
}
