//! Ownership of ephemeral working directories.
//!
//! A [`WorkingCopy`] remembers the scratch directory the engine cloned into.
//! Only that directory is ever removed; caller-supplied paths are never
//! touched.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Tracks whether the working directory is an ephemeral clone.
#[derive(Debug, Default)]
pub struct WorkingCopy {
    ephemeral_root: Option<PathBuf>,
}

impl WorkingCopy {
    /// Takes ownership of `root`, which the engine created for a clone.
    pub(crate) fn adopt(&mut self, root: PathBuf) {
        self.ephemeral_root = Some(root);
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral_root.is_some()
    }

    pub fn ephemeral_root(&self) -> Option<&Path> {
        self.ephemeral_root.as_deref()
    }

    /// Removes the ephemeral directory, if any.
    ///
    /// Returns `true` if this call removed it. Subsequent calls are no-ops.
    /// A removal failure is logged, not raised: the flag is cleared either way
    /// so the directory is never deleted twice.
    pub fn cleanup(&mut self) -> bool {
        let Some(root) = self.ephemeral_root.take() else {
            return false;
        };
        match std::fs::remove_dir_all(&root) {
            Ok(()) => {
                info!(path = %root.display(), "Removed ephemeral working directory");
                true
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => {
                warn!(path = %root.display(), error = %err, "Could not remove ephemeral working directory");
                false
            }
        }
    }

    /// Gives up ownership without removing anything.
    pub fn release(&mut self) -> Option<PathBuf> {
        self.ephemeral_root.take()
    }
}

/// Removes a scratch directory that never became a working copy (e.g. after a
/// failed clone).
pub(crate) fn discard_scratch(root: &Path) {
    if let Err(err) = std::fs::remove_dir_all(root) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %root.display(), error = %err, "Could not remove scratch directory");
        }
    }
}
