//! Logical modification times
//!
//! Object stores reset their own timestamp on every upload, even when the
//! bytes are unchanged. The logical mtime is stored as custom metadata and,
//! when present, takes precedence over the provider timestamp.

use crate::provider::{ObjectInfo, UploadRequest};
use filetime::FileTime;
use std::io;
use std::path::Path;

/// Custom metadata key holding the logical mtime
pub const MTIME_METADATA_KEY: &str = "mtime";

/// Content type of zero-byte directory marker objects
pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

/// Slack allowed when comparing a local mtime against a remote one
///
/// Timestamps round-trip through the filesystem as seconds + nanoseconds,
/// which can shift an `f64` by a few ULPs.
pub const MTIME_TOLERANCE: f64 = 1e-6;

/// Effective modification time of a remote object
///
/// Custom metadata first, then the provider's last-updated time, then `0.0`.
pub fn logical_mtime(object: &ObjectInfo) -> f64 {
    if let Some(mtime) = object.custom_mtime {
        return mtime;
    }
    object
        .updated
        .map(|updated| updated.timestamp_micros() as f64 / 1_000_000.0)
        .unwrap_or(0.0)
}

/// Stamp an upload with a logical modification time
pub fn set_logical_mtime(request: &mut UploadRequest, value: f64) {
    request.logical_mtime = Some(value);
}

/// Encode a logical mtime for the metadata map
pub fn encode_mtime(value: f64) -> String {
    format!("{value:?}")
}

/// Decode a metadata value; anything unparseable or non-finite is ignored
pub fn decode_mtime(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// True when a local copy stamped `local` is at least as new as `remote`
pub fn is_current(local: f64, remote: f64) -> bool {
    local + MTIME_TOLERANCE >= remote
}

/// Modification time of a local path, `None` if it does not exist
pub fn local_mtime(path: &Path) -> io::Result<Option<f64>> {
    match std::fs::metadata(path) {
        Ok(metadata) => {
            let mtime = FileTime::from_last_modification_time(&metadata);
            Ok(Some(filetime_to_secs(mtime)))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Set both access and modification time of a local path
pub fn set_local_mtime(path: &Path, value: f64) -> io::Result<()> {
    let time = secs_to_filetime(value);
    filetime::set_file_times(path, time, time)
}

fn secs_to_filetime(value: f64) -> FileTime {
    let secs = value.floor();
    let nanos = ((value - secs) * 1_000_000_000.0).round();
    // rounding can carry into the next second
    if nanos >= 1_000_000_000.0 {
        FileTime::from_unix_time(secs as i64 + 1, 0)
    } else {
        FileTime::from_unix_time(secs as i64, nanos as u32)
    }
}

fn filetime_to_secs(time: FileTime) -> f64 {
    time.unix_seconds() as f64 + f64::from(time.nanoseconds()) / 1_000_000_000.0
}
