//! pkgsync version-control infrastructure adapter.
//!
//! Implements [`identity::VcsBackend`] and [`identity::VcsHandle`] with
//! [`git2`], so no `git` subprocess is ever spawned.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** libgit2 error codes, reference naming (`refs/heads/…`),
//! and scratch-directory allocation live here. The [`identity`] crate sees
//! only the port traits.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{BranchType, ErrorCode, Repository};
use tracing::{debug, info};

use identity::{BranchName, CommitSha, GitRef, RemoteUrl, VcsBackend, VcsError, VcsHandle};

const DEFAULT_SCRATCH_PREFIX: &str = "pkgsync-";

fn failed(operation: &'static str) -> impl Fn(git2::Error) -> VcsError {
    move |err| VcsError::new(operation, err.message())
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// A [`VcsBackend`] backed by libgit2.
#[derive(Debug, Clone)]
pub struct Git2Backend {
    scratch_prefix: String,
    scratch_parent: Option<PathBuf>,
}

impl Default for Git2Backend {
    fn default() -> Self {
        Self {
            scratch_prefix: DEFAULT_SCRATCH_PREFIX.to_owned(),
            scratch_parent: None,
        }
    }
}

impl Git2Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates scratch directories under `parent` instead of the system
    /// temporary directory.
    pub fn with_scratch_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(parent.into());
        self
    }
}

impl VcsBackend for Git2Backend {
    fn open(&self, path: &Path) -> Result<Arc<dyn VcsHandle>, VcsError> {
        let repo = Repository::open(path).map_err(failed("open"))?;
        debug!(path = %path.display(), "Opened git repository");
        Ok(Arc::new(Git2Repo::new(repo)))
    }

    fn clone_repo(&self, url: &RemoteUrl, dest: &Path) -> Result<Arc<dyn VcsHandle>, VcsError> {
        info!(%url, dest = %dest.display(), "Cloning git repository");
        let repo = RepoBuilder::new()
            .clone(url.as_str(), dest)
            .map_err(failed("clone"))?;
        Ok(Arc::new(Git2Repo::new(repo)))
    }

    fn scratch_dir(&self) -> Result<PathBuf, VcsError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.scratch_prefix);
        let dir = match &self.scratch_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| VcsError::new("scratch_dir", e.to_string()))?;
        Ok(dir.keep())
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// An open libgit2 repository.
///
/// `git2::Repository` is not `Sync`; the mutex makes the handle shareable.
pub struct Git2Repo {
    repo: Mutex<Repository>,
    workdir: Option<PathBuf>,
}

impl Git2Repo {
    pub fn new(repo: Repository) -> Self {
        let workdir = repo.workdir().map(Path::to_path_buf);
        Self {
            repo: Mutex::new(repo),
            workdir,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Repository> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Git2Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Repo")
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl VcsHandle for Git2Repo {
    fn head(&self) -> Result<GitRef, VcsError> {
        let repo = self.lock();
        if repo.head_detached().map_err(failed("head"))? {
            let commit = repo
                .head()
                .and_then(|h| h.peel_to_commit())
                .map_err(failed("head"))?;
            let sha = CommitSha::new(commit.id().to_string())
                .ok_or_else(|| VcsError::new("head", "empty commit id"))?;
            return Ok(GitRef::Detached(sha));
        }

        let name = match repo.head() {
            Ok(head) => head
                .shorthand()
                .map(str::to_owned)
                .ok_or_else(|| VcsError::new("head", "HEAD is not valid UTF-8"))?,
            // A fresh repository has a symbolic HEAD to a branch with no commits.
            Err(err) if err.code() == ErrorCode::UnbornBranch => {
                let head = repo.find_reference("HEAD").map_err(failed("head"))?;
                let target = head
                    .symbolic_target()
                    .ok_or_else(|| VcsError::new("head", "HEAD is not symbolic"))?;
                target
                    .strip_prefix("refs/heads/")
                    .unwrap_or(target)
                    .to_owned()
            }
            Err(err) => return Err(failed("head")(err)),
        };
        BranchName::new(name)
            .map(GitRef::Branch)
            .ok_or_else(|| VcsError::new("head", "empty branch name"))
    }

    fn working_dir(&self) -> Option<PathBuf> {
        self.workdir.clone()
    }

    fn remote_urls(&self) -> Result<Vec<RemoteUrl>, VcsError> {
        let repo = self.lock();
        let remotes = repo.remotes().map_err(failed("remote_urls"))?;
        let mut names: Vec<&str> = remotes.iter().flatten().collect();
        // stable sort: origin first, the rest in config order
        names.sort_by_key(|name| *name != "origin");

        let mut urls = Vec::with_capacity(names.len());
        for name in names {
            let remote = repo.find_remote(name).map_err(failed("remote_urls"))?;
            if let Some(url) = remote.url().and_then(|u| RemoteUrl::new(u)) {
                urls.push(url);
            }
        }
        Ok(urls)
    }

    fn branches(&self) -> Result<BTreeSet<BranchName>, VcsError> {
        let repo = self.lock();
        let mut names = BTreeSet::new();
        for entry in repo
            .branches(Some(BranchType::Local))
            .map_err(failed("branches"))?
        {
            let (branch, _) = entry.map_err(failed("branches"))?;
            if let Some(name) = branch
                .name()
                .map_err(failed("branches"))?
                .and_then(|n| BranchName::new(n))
            {
                names.insert(name);
            }
        }
        Ok(names)
    }

    fn create_branch(&self, name: &BranchName, base: Option<&str>) -> Result<(), VcsError> {
        let repo = self.lock();
        let base = base.unwrap_or("HEAD");
        let commit = repo
            .revparse_single(base)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(failed("create_branch"))?;
        repo.branch(name.as_str(), &commit, false)
            .map_err(failed("create_branch"))?;
        debug!(branch = %name, base, "Created branch");
        Ok(())
    }

    fn checkout(&self, name: &BranchName) -> Result<(), VcsError> {
        let repo = self.lock();
        let refname = format!("refs/heads/{name}");
        let target = repo
            .revparse_single(&refname)
            .map_err(failed("checkout"))?;
        let mut opts = CheckoutBuilder::new();
        opts.safe();
        repo.checkout_tree(&target, Some(&mut opts))
            .map_err(failed("checkout"))?;
        repo.set_head(&refname).map_err(failed("checkout"))?;
        debug!(branch = %name, "Checked out branch");
        Ok(())
    }
}
