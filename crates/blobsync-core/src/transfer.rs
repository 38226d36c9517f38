//! Single-object and directory transfers with a skip-if-unchanged fast path
//!
//! Every successful download stamps the local entry with the remote logical
//! mtime, so the next call can decide staleness by comparing timestamps
//! without touching object bytes. Uploads always transfer and record the
//! local mtime as the object's logical mtime.

use crate::classify::{classify, ObjectKind};
use crate::error::{Access, Error, Result};
use crate::metadata::{
    is_current, local_mtime, logical_mtime, set_local_mtime, set_logical_mtime,
    DIRECTORY_CONTENT_TYPE,
};
use crate::provider::{ObjectInfo, ObjectProvider, UploadRequest, UploadSource};
use crate::uri::{depth_below, is_marker_name, ObjectUri, SEPARATOR};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Result of a single-object download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Bytes were fetched and the local mtime stamped
    Transferred,
    /// The local copy was already current
    Skipped,
}

/// Counters for a directory transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Objects whose bytes were moved
    pub transferred: usize,
    /// Objects left alone because the local copy was current
    pub skipped: usize,
    /// Directory markers materialized as local directories
    pub directories: usize,
}

impl TransferSummary {
    fn record(&mut self, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Transferred => self.transferred += 1,
            TransferOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Download one object to `local_path`
///
/// Skips the transfer when `force` is false and the local copy is at least as
/// new as the remote logical mtime. A missing remote object is an error.
pub fn download_file(
    provider: &dyn ObjectProvider,
    uri: &ObjectUri,
    local_path: &Path,
    force: bool,
) -> Result<TransferOutcome> {
    uri.require_object(Access::Read)?;
    if uri.has_dir_hint() {
        return Err(Error::invalid_uri(
            uri,
            Access::Read,
            "a directory marker cannot be downloaded as a file",
        ));
    }
    let object = provider
        .get_object(uri.bucket(), uri.path())?
        .ok_or_else(|| Error::not_found(uri, Access::Read))?;

    fetch_object(provider, &object, local_path, force)
}

/// Download every object under a prefix into `local_dir`
///
/// Directory markers are materialized before any file is written and their
/// mtimes are stamped last, deepest first, so file writes cannot disturb a
/// directory's stamped time. The first failing object aborts the pass;
/// anything already written stays on disk.
pub fn download_dir(
    provider: &dyn ObjectProvider,
    uri: &ObjectUri,
    local_dir: &Path,
    force: bool,
) -> Result<TransferSummary> {
    let prefix = uri.dir_prefix();
    let objects = provider.list_objects(uri.bucket(), &prefix, None)?;
    debug!("Listed {} objects under {}", objects.len(), uri);

    let (mut markers, files): (Vec<_>, Vec<_>) =
        objects.into_iter().partition(|o| is_marker_name(&o.name));
    markers.sort_by_key(|m| depth_below(&prefix, &m.name));

    let mut summary = TransferSummary::default();
    fs::create_dir_all(local_dir)?;

    for marker in &markers {
        let local = local_dir.join(relative_local_path(&prefix, &marker.name)?);
        fs::create_dir_all(&local)?;
        summary.directories += 1;
    }

    for object in &files {
        let local = local_dir.join(relative_local_path(&prefix, &object.name)?);
        summary.record(fetch_object(provider, object, &local, force)?);
    }

    for marker in markers.iter().rev() {
        let local = local_dir.join(relative_local_path(&prefix, &marker.name)?);
        set_local_mtime(&local, logical_mtime(marker))?;
    }

    info!(
        "Downloaded {} into {:?}: {} transferred, {} skipped, {} directories",
        uri, local_dir, summary.transferred, summary.skipped, summary.directories
    );
    Ok(summary)
}

/// Upload a local file, recording its mtime as the logical mtime
pub fn upload_file(
    provider: &dyn ObjectProvider,
    local_path: &Path,
    uri: &ObjectUri,
) -> Result<ObjectInfo> {
    uri.require_object(Access::Write)?;
    if uri.has_dir_hint() {
        return Err(Error::invalid_uri(
            uri,
            Access::Write,
            "a file cannot be uploaded to a directory marker name",
        ));
    }
    put_file(provider, local_path, uri.bucket(), uri.path())
}

/// Upload every regular file below `local_dir` under the remote prefix
///
/// Directories themselves are not uploaded as markers.
pub fn upload_dir(
    provider: &dyn ObjectProvider,
    local_dir: &Path,
    uri: &ObjectUri,
) -> Result<TransferSummary> {
    if !local_dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a directory: {}", local_dir.display()),
        )));
    }
    let prefix = uri.dir_prefix();
    let mut summary = TransferSummary::default();

    for entry in WalkDir::new(local_dir).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(local_dir)
            .map_err(|_| Error::Io(std::io::Error::other("walked outside the upload root")))?;
        let name = format!("{prefix}{}", object_name(relative));
        put_file(provider, entry.path(), uri.bucket(), &name)?;
        summary.transferred += 1;
    }

    info!(
        "Uploaded {} files from {:?} to {}",
        summary.transferred, local_dir, uri
    );
    Ok(summary)
}

/// Create a zero-byte directory marker unless the URI is already a directory
///
/// Returns true when a marker was written.
pub fn create_dir_marker(provider: &dyn ObjectProvider, uri: &ObjectUri) -> Result<bool> {
    match classify(provider, uri)? {
        ObjectKind::Directory => return Ok(false),
        ObjectKind::Bucket => {
            return Err(Error::invalid_uri(
                uri,
                Access::Write,
                "cannot create a directory marker for a bare bucket",
            ))
        }
        ObjectKind::File | ObjectKind::Absent => {}
    }

    let name = uri.dir_prefix();
    let request = UploadRequest::new().content_type(DIRECTORY_CONTENT_TYPE);
    provider.upload(uri.bucket(), &name, UploadSource::Bytes(&[]), &request)?;
    debug!("Created directory marker {}", uri.to_dir());
    Ok(true)
}

fn fetch_object(
    provider: &dyn ObjectProvider,
    object: &ObjectInfo,
    local_path: &Path,
    force: bool,
) -> Result<TransferOutcome> {
    let remote = logical_mtime(object);

    if !force {
        if let Some(local) = local_mtime(local_path)? {
            if is_current(local, remote) {
                debug!(
                    "Skipping {}: local copy {:?} is current ({} >= {})",
                    object.name, local_path, local, remote
                );
                return Ok(TransferOutcome::Skipped);
            }
        }
    }

    if let Some(parent) = local_path.parent() {
        fs::create_dir_all(parent)?;
    }
    provider.download(object, local_path)?;
    set_local_mtime(local_path, remote)?;
    debug!("Fetched {} to {:?} (mtime {})", object.name, local_path, remote);
    Ok(TransferOutcome::Transferred)
}

fn put_file(
    provider: &dyn ObjectProvider,
    local_path: &Path,
    bucket: &str,
    name: &str,
) -> Result<ObjectInfo> {
    let mtime = local_mtime(local_path)?.ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("local file not found: {}", local_path.display()),
        ))
    })?;

    let mut request = UploadRequest::new();
    set_logical_mtime(&mut request, mtime);
    let object = provider.upload(bucket, name, UploadSource::File(local_path), &request)?;
    debug!("Uploaded {:?} to {}/{} (mtime {})", local_path, bucket, name, mtime);
    Ok(object)
}

/// Rebase an object name below `prefix` onto a relative local path
///
/// Rejects names that would escape the target directory.
fn relative_local_path(prefix: &str, name: &str) -> Result<PathBuf> {
    let relative = name.get(prefix.len()..).unwrap_or("");
    let mut path = PathBuf::new();
    for part in relative.split(SEPARATOR).filter(|p| !p.is_empty()) {
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) if Path::new(part).components().count() == 1 => {
                path.push(part)
            }
            _ => {
                return Err(Error::invalid_uri(
                    name,
                    Access::Read,
                    "object name does not map to a path inside the target directory",
                ))
            }
        }
    }
    Ok(path)
}

fn object_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
