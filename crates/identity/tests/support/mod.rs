//! Deterministic stub collaborators with call counters.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use identity::{
    BranchName, Collaborators, ForgeError, ForgeProject, ForgeService, FullName, GitRef, GitUrls,
    Namespace, ReachabilityProbe, RemoteUrl, RepoName, VcsBackend, VcsError, VcsHandle,
};

#[derive(Debug, Default)]
pub struct Calls {
    pub open: AtomicUsize,
    pub clone: AtomicUsize,
    pub get_project: AtomicUsize,
    pub probe: AtomicUsize,
}

impl Calls {
    pub fn clones(&self) -> usize {
        self.clone.load(Ordering::SeqCst)
    }

    pub fn project_lookups(&self) -> usize {
        self.get_project.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probe.load(Ordering::SeqCst)
    }

    /// Calls that would touch the network.
    pub fn network(&self) -> usize {
        self.clones() + self.project_lookups() + self.probes()
    }
}

pub fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

pub fn url(value: &str) -> RemoteUrl {
    RemoteUrl::new(value).unwrap()
}

// ---------------------------------------------------------------------------
// Version control
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct StubRepo {
    workdir: PathBuf,
    head: Mutex<GitRef>,
    remotes: Vec<RemoteUrl>,
    branches: Mutex<BTreeSet<BranchName>>,
    reject_checkout: bool,
}

impl StubRepo {
    pub fn new(workdir: impl Into<PathBuf>, head: GitRef, remotes: Vec<RemoteUrl>) -> Self {
        let branches = head.branch().cloned().into_iter().collect();
        Self {
            workdir: workdir.into(),
            head: Mutex::new(head),
            remotes,
            branches: Mutex::new(branches),
            reject_checkout: false,
        }
    }

    /// Every checkout fails, as with a dirty working tree.
    pub fn rejecting_checkout(mut self) -> Self {
        self.reject_checkout = true;
        self
    }
}

impl VcsHandle for StubRepo {
    fn head(&self) -> Result<GitRef, VcsError> {
        Ok(self.head.lock().unwrap().clone())
    }

    fn working_dir(&self) -> Option<PathBuf> {
        Some(self.workdir.clone())
    }

    fn remote_urls(&self) -> Result<Vec<RemoteUrl>, VcsError> {
        Ok(self.remotes.clone())
    }

    fn branches(&self) -> Result<BTreeSet<BranchName>, VcsError> {
        Ok(self.branches.lock().unwrap().clone())
    }

    fn create_branch(&self, name: &BranchName, _base: Option<&str>) -> Result<(), VcsError> {
        if !self.branches.lock().unwrap().insert(name.clone()) {
            return Err(VcsError::new("create_branch", format!("{name} exists")));
        }
        Ok(())
    }

    fn checkout(&self, name: &BranchName) -> Result<(), VcsError> {
        if self.reject_checkout {
            return Err(VcsError::new("checkout", "conflict"));
        }
        if !self.branches.lock().unwrap().contains(name) {
            return Err(VcsError::new("checkout", format!("no branch {name}")));
        }
        *self.head.lock().unwrap() = GitRef::Branch(name.clone());
        Ok(())
    }
}

/// Serves pre-registered repositories by path; clones create a directory
/// and a repository on `main` whose only remote is the clone URL.
#[derive(Default)]
pub struct StubBackend {
    pub calls: Arc<Calls>,
    repos: Mutex<BTreeMap<PathBuf, Arc<StubRepo>>>,
    scratch_dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_clones: bool,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_clones() -> Self {
        Self {
            fail_clones: true,
            ..Self::default()
        }
    }

    /// Every scratch directory handed out so far.
    pub fn scratch_dirs(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        self.scratch_dirs.clone()
    }

    pub fn with_repo(self, repo: StubRepo) -> Self {
        self.repos
            .lock()
            .unwrap()
            .insert(repo.workdir.clone(), Arc::new(repo));
        self
    }
}

impl VcsBackend for StubBackend {
    fn open(&self, path: &Path) -> Result<Arc<dyn VcsHandle>, VcsError> {
        self.calls.open.fetch_add(1, Ordering::SeqCst);
        match self.repos.lock().unwrap().get(path) {
            Some(repo) => Ok(repo.clone()),
            None => Err(VcsError::new("open", format!("{} is not a repository", path.display()))),
        }
    }

    fn clone_repo(&self, url: &RemoteUrl, dest: &Path) -> Result<Arc<dyn VcsHandle>, VcsError> {
        self.calls.clone.fetch_add(1, Ordering::SeqCst);
        if self.fail_clones {
            return Err(VcsError::new("clone", "network unreachable"));
        }
        std::fs::create_dir_all(dest).map_err(|e| VcsError::new("clone", e.to_string()))?;
        let repo = Arc::new(StubRepo::new(
            dest,
            GitRef::Branch(branch("main")),
            vec![url.clone()],
        ));
        self.repos
            .lock()
            .unwrap()
            .insert(dest.to_path_buf(), repo.clone());
        Ok(repo)
    }

    fn scratch_dir(&self) -> Result<PathBuf, VcsError> {
        let dir = tempfile::Builder::new()
            .prefix("identity-test-")
            .tempdir()
            .map(|d| d.keep())
            .map_err(|e| VcsError::new("scratch_dir", e.to_string()))?;
        self.scratch_dirs.lock().unwrap().push(dir.clone());
        Ok(dir)
    }
}

// ---------------------------------------------------------------------------
// Forge
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StubForge {
    host: String,
    pub calls: Arc<Calls>,
    projects: Arc<BTreeMap<String, RemoteUrl>>,
}

impl StubForge {
    pub fn new(host: &str, calls: Arc<Calls>) -> Self {
        Self {
            host: host.to_owned(),
            calls,
            projects: Arc::new(BTreeMap::new()),
        }
    }

    pub fn with_project(mut self, full_name: &str, clone_url: &str) -> Self {
        Arc::make_mut(&mut self.projects).insert(full_name.to_owned(), url(clone_url));
        self
    }
}

impl ForgeService for StubForge {
    fn name(&self) -> &str {
        "stub"
    }

    fn hostname(&self) -> &str {
        &self.host
    }

    fn get_project(
        &self,
        namespace: &Namespace,
        repo: &RepoName,
    ) -> Result<Arc<dyn ForgeProject>, ForgeError> {
        self.calls.get_project.fetch_add(1, Ordering::SeqCst);
        let full = FullName::join(namespace, repo);
        match self.projects.get(full.as_str()) {
            Some(clone_url) => Ok(Arc::new(StubProject {
                namespace: namespace.clone(),
                repo: repo.clone(),
                clone_url: clone_url.clone(),
                service: self.clone(),
            })),
            None => Err(ForgeError::NotFound { full_name: full }),
        }
    }
}

pub struct StubProject {
    namespace: Namespace,
    repo: RepoName,
    clone_url: RemoteUrl,
    service: StubForge,
}

impl ForgeProject for StubProject {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn repo_name(&self) -> &RepoName {
        &self.repo
    }

    fn git_urls(&self) -> Result<GitUrls, ForgeError> {
        Ok(GitUrls {
            git: self.clone_url.clone(),
            ssh: None,
        })
    }

    fn service(&self) -> Arc<dyn ForgeService> {
        Arc::new(self.service.clone())
    }
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

pub struct StubProbe {
    reachable: bool,
    calls: Arc<Calls>,
}

impl StubProbe {
    pub fn new(reachable: bool, calls: Arc<Calls>) -> Self {
        Self { reachable, calls }
    }
}

impl ReachabilityProbe for StubProbe {
    fn probe(&self, _url: &str) -> bool {
        self.calls.probe.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// A backend, a forge for `git.example`, and an unreachable probe, all
/// counting into one shared [`Calls`].
pub struct World {
    pub calls: Arc<Calls>,
    pub collaborators: Collaborators,
}

impl World {
    pub fn new(backend: StubBackend, forge: Option<StubForge>, reachable: bool) -> Self {
        let calls = backend.calls.clone();
        let mut collaborators = Collaborators::local(Arc::new(backend))
            .with_probe(Arc::new(StubProbe::new(reachable, calls.clone())));
        if let Some(forge) = forge {
            collaborators = collaborators.with_forge(Arc::new(forge));
        }
        Self {
            calls,
            collaborators,
        }
    }

    /// Forge sharing this world's counters.
    pub fn forge(calls: &Arc<Calls>) -> StubForge {
        StubForge::new("git.example", calls.clone())
    }
}
