//! Version-control port: opening, cloning, and inspecting working copies.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::{BranchName, GitRef, RemoteUrl};

/// Failure reported by a [`VcsBackend`] or [`VcsHandle`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct VcsError {
    /// The operation that failed (e.g. `"open"`, `"clone"`, `"checkout"`).
    pub operation: &'static str,
    /// Backend-provided description.
    pub message: String,
}

impl VcsError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Entry point to a version-control system.
pub trait VcsBackend: Send + Sync {
    /// Opens the existing repository whose working directory is `path`.
    ///
    /// Must fail if `path` is not itself a repository; parent directories are
    /// not searched.
    fn open(&self, path: &Path) -> Result<Arc<dyn VcsHandle>, VcsError>;

    /// Clones `url` into `dest`, which must be empty or absent.
    fn clone_repo(&self, url: &RemoteUrl, dest: &Path) -> Result<Arc<dyn VcsHandle>, VcsError>;

    /// Allocates a fresh, empty directory for an ephemeral clone.
    ///
    /// The caller owns the directory from this point on and is responsible for
    /// removing it.
    fn scratch_dir(&self) -> Result<PathBuf, VcsError>;
}

/// An open repository.
pub trait VcsHandle: Send + Sync {
    /// Returns the current `HEAD` state.
    fn head(&self) -> Result<GitRef, VcsError>;

    /// Returns the working directory, or `None` for a bare repository.
    fn working_dir(&self) -> Option<PathBuf>;

    /// Returns the configured remote URLs, `origin` first.
    fn remote_urls(&self) -> Result<Vec<RemoteUrl>, VcsError>;

    /// Returns the names of all local branches.
    fn branches(&self) -> Result<BTreeSet<BranchName>, VcsError>;

    /// Creates `name` at `base` (a revision; `HEAD` when `None`).
    fn create_branch(&self, name: &BranchName, base: Option<&str>) -> Result<(), VcsError>;

    /// Checks out the local branch `name` and attaches `HEAD` to it.
    fn checkout(&self, name: &BranchName) -> Result<(), VcsError>;
}
