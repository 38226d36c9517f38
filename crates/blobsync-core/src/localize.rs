//! Hooks an orchestration framework calls around a job
//!
//! Each hook returns `Ok(None)` for paths that are not remote URIs so the
//! caller can hand them to another handler. Remote inputs may be staged
//! locally before a job runs; remote outputs may be redirected to a local
//! staging path and pushed back once the job succeeds.

use crate::aggregate::aggregate_mtime;
use crate::classify::{classify, EntryKind, ObjectKind};
use crate::config::LocalizeConfig;
use crate::error::{Access, Error, Result};
use crate::lifecycle::{clear, exists_as};
use crate::provider::ObjectProvider;
use crate::registry::RunContext;
use crate::transfer::{create_dir_marker, download_dir, download_file, upload_dir, upload_file};
use crate::uri::{is_remote_uri, ObjectUri, SEPARATOR};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a job should read or write a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// Use the remote URI directly
    Remote(ObjectUri),
    /// Use a local staging path
    Local(PathBuf),
}

/// An output produced by a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    /// Output name, for logging
    pub name: String,
    /// Path the job wrote to
    pub local_path: PathBuf,
    /// Whether the output is a file or a directory tree
    pub kind: EntryKind,
}

/// Stages remote paths for jobs and pushes results back
#[derive(Clone)]
pub struct Localizer {
    provider: Arc<dyn ObjectProvider>,
    root: Option<PathBuf>,
    force: bool,
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("root", &self.root)
            .field("force", &self.force)
            .finish_non_exhaustive()
    }
}

impl Localizer {
    pub fn new(provider: Arc<dyn ObjectProvider>, config: &LocalizeConfig) -> Self {
        Self {
            provider,
            root: config.root.clone(),
            force: config.force,
        }
    }

    /// Local staging root, if localization is enabled
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Staging path for a URI: `<root>/<bucket>/<path>`
    pub fn local_path_for(&self, root: &Path, uri: &ObjectUri) -> PathBuf {
        let mut path = root.join(uri.bucket());
        for part in uri.path().split(SEPARATOR).filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }

    /// Validate a job input and stage it locally when localization is on
    ///
    /// The remote classification picks the transfer; a declared `kind` that
    /// disagrees with it is an `InvalidUri` error.
    pub fn resolve_input(&self, job: &str, input: &str, kind: EntryKind) -> Result<Option<ResolvedPath>> {
        let Some(uri) = parse_remote(input)? else {
            return Ok(None);
        };

        let found = classify(self.provider.as_ref(), &uri)?;
        match found {
            ObjectKind::Absent => return Err(Error::not_found(&uri, Access::Read)),
            ObjectKind::Bucket => {
                return Err(Error::invalid_uri(
                    &uri,
                    Access::Read,
                    format!("[{job}] input path expected instead of a bare bucket"),
                ))
            }
            ObjectKind::File | ObjectKind::Directory if !kind.matches(found) => {
                return Err(Error::invalid_uri(
                    &uri,
                    Access::Read,
                    format!("[{job}] input declared as a {kind} but the remote path is a {found}"),
                ))
            }
            ObjectKind::File | ObjectKind::Directory => {}
        }

        let Some(root) = &self.root else {
            return Ok(Some(ResolvedPath::Remote(uri)));
        };

        let local = self.local_path_for(root, &uri);
        info!("[{}] Localizing {} {} ...", job, found, uri);
        if found == ObjectKind::Directory {
            download_dir(self.provider.as_ref(), &uri, &local, self.force)?;
        } else {
            download_file(self.provider.as_ref(), &uri, &local, self.force)?;
        }
        Ok(Some(ResolvedPath::Local(local)))
    }

    /// Validate a job output and redirect it to a staging path when localization is on
    ///
    /// The redirect is recorded in `ctx` so [`Localizer::push_outputs`] can
    /// find the remote URI again.
    pub fn resolve_output(
        &self,
        ctx: &mut RunContext,
        job: &str,
        output: &str,
        kind: EntryKind,
    ) -> Result<Option<ResolvedPath>> {
        let Some(uri) = parse_remote(output)? else {
            return Ok(None);
        };

        if classify(self.provider.as_ref(), &uri)? == ObjectKind::Bucket {
            return Err(Error::invalid_uri(
                &uri,
                Access::Write,
                format!("[{job}] output path expected instead of a bare bucket"),
            ));
        }

        let Some(root) = &self.root else {
            return Ok(Some(ResolvedPath::Remote(uri)));
        };

        let local = self.local_path_for(root, &uri);
        let uri = match kind {
            EntryKind::Directory => {
                let uri = uri.to_dir();
                create_dir_marker(self.provider.as_ref(), &uri)?;
                fs::create_dir_all(&local)?;
                uri
            }
            EntryKind::File => {
                if let Some(parent) = local.parent() {
                    fs::create_dir_all(parent)?;
                }
                uri
            }
        };

        debug!("[{}] Staging output {} at {:?}", job, uri, local);
        ctx.mappings_mut().record(job, local.clone(), uri);
        Ok(Some(ResolvedPath::Local(local)))
    }

    /// Check whether a remote output already exists
    pub fn output_exists(&self, path: &str, kind: EntryKind) -> Result<Option<bool>> {
        match parse_remote(path)? {
            Some(uri) => exists_as(self.provider.as_ref(), &uri, kind).map(Some),
            None => Ok(None),
        }
    }

    /// Modification time used for cache-validity checks
    pub fn mtime(&self, path: &str, dir_depth: usize) -> Result<Option<f64>> {
        match parse_remote(path)? {
            Some(uri) => aggregate_mtime(self.provider.as_ref(), &uri, dir_depth).map(Some),
            None => Ok(None),
        }
    }

    /// Remove a remote output before a job reruns
    pub fn clear_path(&self, path: &str, kind: EntryKind) -> Result<Option<usize>> {
        match parse_remote(path)? {
            Some(uri) => clear(self.provider.as_ref(), &uri, kind).map(Some),
            None => Ok(None),
        }
    }

    /// Upload staged outputs of a finished job back to their URIs
    ///
    /// Outputs without a recorded redirect are ignored. A mapping is consumed
    /// once its upload succeeds; on failure it stays for a retry. Returns how
    /// many outputs were pushed.
    pub fn push_outputs(&self, ctx: &mut RunContext, job: &str, outputs: &[JobOutput]) -> Result<usize> {
        let mut pushed = 0;
        for output in outputs {
            let Some(uri) = ctx.mappings().lookup(job, &output.local_path).cloned() else {
                continue;
            };

            info!("[{}] Uploading output '{}' to {} ...", job, output.name, uri);
            match output.kind {
                EntryKind::File => {
                    upload_file(self.provider.as_ref(), &output.local_path, &uri)?;
                }
                EntryKind::Directory => {
                    upload_dir(self.provider.as_ref(), &output.local_path, &uri)?;
                }
            }
            // consumed only once the upload went through, so a failed push can be retried
            ctx.mappings_mut().take(job, &output.local_path);
            pushed += 1;
        }
        Ok(pushed)
    }
}

fn parse_remote(path: &str) -> Result<Option<ObjectUri>> {
    if !is_remote_uri(path) {
        return Ok(None);
    }
    ObjectUri::parse(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_passes_local_paths_through() {
        assert_eq!(parse_remote("/data/input.txt").unwrap(), None);
        assert_eq!(parse_remote("relative/input.txt").unwrap(), None);
        assert!(parse_remote("gs://bucket/x").unwrap().is_some());
        assert!(parse_remote("gs://").is_err());
    }
}
