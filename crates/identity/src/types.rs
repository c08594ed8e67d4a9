//! Shared value types for the identity domain.
//!
//! Unlike the newtype names in [`crate::identifiers`], these types carry
//! structure: a [`GitRef`] distinguishes a branch from a detached commit, and
//! [`FactKind`] names each field of the fact store for reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BranchName, CommitSha};

// ---------------------------------------------------------------------------
// Git refs
// ---------------------------------------------------------------------------

/// The state of a working copy's `HEAD`.
///
/// A detached `HEAD` is always reported as the commit it points at, never as a
/// branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GitRef {
    /// `HEAD` is attached to a local branch.
    Branch(BranchName),
    /// `HEAD` points directly at a commit.
    Detached(CommitSha),
}

impl GitRef {
    /// Returns the branch name or commit hash.
    pub fn as_str(&self) -> &str {
        match self {
            GitRef::Branch(name) => name.as_str(),
            GitRef::Detached(sha) => sha.as_str(),
        }
    }

    /// Returns the branch name when `HEAD` is attached.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            GitRef::Branch(name) => Some(name),
            GitRef::Detached(_) => None,
        }
    }

    /// Returns `true` when `HEAD` is detached.
    pub fn is_detached(&self) -> bool {
        matches!(self, GitRef::Detached(_))
    }
}

impl std::fmt::Display for GitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Fact names
// ---------------------------------------------------------------------------

/// Names one field of the fact store.
///
/// Used in resolution reports (which facts are still missing) and by
/// [`crate::LocalProject::require`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    LocalPath,
    VersionControlHandle,
    Ref,
    ForgeProject,
    ForgeService,
    RemoteUrl,
    FullName,
    Namespace,
    RepoName,
}

impl FactKind {
    /// Every fact, in fact-store order.
    pub const ALL: [FactKind; 9] = [
        FactKind::LocalPath,
        FactKind::VersionControlHandle,
        FactKind::Ref,
        FactKind::ForgeProject,
        FactKind::ForgeService,
        FactKind::RemoteUrl,
        FactKind::FullName,
        FactKind::Namespace,
        FactKind::RepoName,
    ];

    /// Returns the snake_case name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            FactKind::LocalPath => "local_path",
            FactKind::VersionControlHandle => "version_control_handle",
            FactKind::Ref => "ref",
            FactKind::ForgeProject => "forge_project",
            FactKind::ForgeService => "forge_service",
            FactKind::RemoteUrl => "remote_url",
            FactKind::FullName => "full_name",
            FactKind::Namespace => "namespace",
            FactKind::RepoName => "repo_name",
        }
    }
}

impl std::fmt::Display for FactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
