//! [`LocalProject`]: one resolved project identity and its working copy.
//!
//! A project is built from a [`ProjectSpec`] holding whatever the caller
//! knows. Caller-supplied facts are locked; the engine derives the rest.
//! Accessors only read the fact store; every side effect happens inside
//! [`LocalProject::resolve`].
//!
//! Dropping a project removes its ephemeral clone, if it made one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{Engine, Resolution};
use crate::facts::Facts;
use crate::ports::{Collaborators, ForgeProject, ForgeService, VcsHandle};
use crate::{
    BranchName, FactKind, FullName, GitRef, IdentityError, Namespace, RemoteUrl, RepoName,
};

// ---------------------------------------------------------------------------
// Construction input
// ---------------------------------------------------------------------------

/// The facts a caller knows about a project, plus resolution options.
#[derive(Clone)]
pub struct ProjectSpec {
    local_path: Option<PathBuf>,
    vcs: Option<Arc<dyn VcsHandle>>,
    git_ref: Option<BranchName>,
    project: Option<Arc<dyn ForgeProject>>,
    service: Option<Arc<dyn ForgeService>>,
    remote_url: Option<RemoteUrl>,
    full_name: Option<String>,
    namespace: Option<Namespace>,
    repo_name: Option<RepoName>,
    path_or_url: Option<String>,
    offline: bool,
    auto_resolve: bool,
}

impl Default for ProjectSpec {
    fn default() -> Self {
        Self {
            local_path: None,
            vcs: None,
            git_ref: None,
            project: None,
            service: None,
            remote_url: None,
            full_name: None,
            namespace: None,
            repo_name: None,
            path_or_url: None,
            offline: false,
            auto_resolve: true,
        }
    }
}

impl ProjectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn vcs(mut self, handle: Arc<dyn VcsHandle>) -> Self {
        self.vcs = Some(handle);
        self
    }

    /// Branch to check out once the working copy is resolved. Created from
    /// `HEAD` if it does not exist.
    pub fn git_ref(mut self, branch: BranchName) -> Self {
        self.git_ref = Some(branch);
        self
    }

    pub fn forge_project(mut self, project: Arc<dyn ForgeProject>) -> Self {
        self.project = Some(project);
        self
    }

    pub fn forge_service(mut self, service: Arc<dyn ForgeService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn remote_url(mut self, url: RemoteUrl) -> Self {
        self.remote_url = Some(url);
        self
    }

    /// `"namespace/repo"`; validated at construction.
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn repo_name(mut self, repo_name: RepoName) -> Self {
        self.repo_name = Some(repo_name);
        self
    }

    /// An input that is either a local directory or a remote URL.
    ///
    /// Classified once at construction. An explicit [`Self::local_path`] or
    /// [`Self::remote_url`] wins over the classified value.
    pub fn path_or_url(mut self, value: impl Into<String>) -> Self {
        self.path_or_url = Some(value.into());
        self
    }

    /// Disables every rule that needs the network, and the URL probe.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Skips resolution at construction; call [`LocalProject::resolve`] later.
    pub fn defer_resolution(mut self) -> Self {
        self.auto_resolve = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable, serialisable view of a project's facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentitySnapshot {
    pub local_path: Option<PathBuf>,
    #[serde(rename = "ref")]
    pub git_ref: Option<GitRef>,
    pub remote_url: Option<RemoteUrl>,
    pub full_name: Option<FullName>,
    pub namespace: Option<Namespace>,
    pub repo_name: Option<RepoName>,
    /// Kind of the resolved forge service (e.g. `"github"`).
    pub forge: Option<String>,
    /// `namespace/repo` of the forge project handle, as the forge reports it.
    pub forge_project: Option<FullName>,
    pub has_version_control: bool,
    pub is_ephemeral: bool,
    pub offline: bool,
    /// Facts that were supplied by the caller.
    pub explicit: Vec<FactKind>,
}

// ---------------------------------------------------------------------------
// LocalProject
// ---------------------------------------------------------------------------

/// A project identity resolved against a set of collaborators.
pub struct LocalProject {
    facts: Facts,
    collaborators: Collaborators,
    engine: Engine<'static>,
    pending_checkout: Option<BranchName>,
    last_resolution: Option<Resolution>,
}

impl LocalProject {
    /// Seeds the fact store from `spec` and, unless deferred, resolves it.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::UnusablePathOrUrl`] if the path-or-URL input is
    ///   neither a directory nor reachable.
    /// - [`IdentityError::InvalidFact`] / [`IdentityError::Contradiction`] for
    ///   malformed or inconsistent names.
    /// - Any error from [`Self::resolve`].
    pub fn new(spec: ProjectSpec, collaborators: Collaborators) -> Result<Self, IdentityError> {
        let mut local_path = spec.local_path;
        let mut remote_url = spec.remote_url;
        if let Some(value) = spec.path_or_url {
            let url_known = remote_url.is_some();
            match classify(&value, url_known, spec.offline, &collaborators) {
                Some(Seed::Path(path)) => {
                    local_path.get_or_insert(path);
                }
                Some(Seed::Url(url)) => {
                    remote_url.get_or_insert(url);
                }
                None if local_path.is_some() || url_known => {
                    debug!(value = %value, "Ignoring path-or-URL input; explicit location given");
                }
                None => return Err(IdentityError::UnusablePathOrUrl { value }),
            }
        }

        let mut facts = Facts {
            offline: spec.offline,
            ..Facts::default()
        };
        if let Some(path) = local_path {
            facts.local_path.set_explicit(path);
        }
        if let Some(handle) = spec.vcs {
            facts.vcs.set_explicit(handle);
        }
        if let Some(project) = spec.project {
            facts.project.set_explicit(project);
        }
        if let Some(service) = spec.service {
            facts.service.set_explicit(service);
        }
        if let Some(url) = remote_url {
            facts.remote_url.set_explicit(url);
        }
        seed_names(&mut facts, spec.full_name, spec.namespace, spec.repo_name)?;

        let mut project = Self {
            facts,
            collaborators,
            engine: Engine::standard(),
            pending_checkout: spec.git_ref,
            last_resolution: None,
        };
        if spec.auto_resolve {
            project.resolve()?;
        }
        Ok(project)
    }

    /// Runs the engine to its fixpoint, then checks out the requested branch
    /// if one is still pending.
    ///
    /// The requested branch becomes the `ref` fact only once it is checked
    /// out. A failed checkout stays pending and fails every later call until
    /// it succeeds.
    ///
    /// Calling this again on a converged project changes nothing.
    pub fn resolve(&mut self) -> Result<Resolution, IdentityError> {
        let resolution = self.engine.run(&mut self.facts, &self.collaborators)?;
        self.checkout_requested_ref()?;
        self.last_resolution = Some(resolution.clone());
        Ok(resolution)
    }

    fn checkout_requested_ref(&mut self) -> Result<(), IdentityError> {
        let Some(branch) = self.pending_checkout.clone() else {
            return Ok(());
        };
        let Some(handle) = self.facts.vcs().cloned() else {
            return Err(IdentityError::Unresolvable {
                missing: vec![FactKind::VersionControlHandle],
            });
        };
        if !handle.branches()?.contains(&branch) {
            debug!(%branch, "Creating branch from HEAD");
            handle.create_branch(&branch, None)?;
        }
        handle.checkout(&branch)?;
        info!(%branch, "Checked out requested branch");
        self.facts.git_ref.set_explicit(GitRef::Branch(branch));
        self.pending_checkout = None;
        Ok(())
    }

    /// Fails with [`IdentityError::Unresolvable`] unless every fact in
    /// `required` is set.
    pub fn require(&self, required: &[FactKind]) -> Result<(), IdentityError> {
        let missing: Vec<FactKind> = required
            .iter()
            .copied()
            .filter(|f| !self.facts.is_set(*f))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::Unresolvable { missing })
        }
    }

    /// Removes the ephemeral clone. Returns `true` if this call removed it;
    /// later calls do nothing.
    pub fn cleanup(&mut self) -> bool {
        self.facts.working_copy.cleanup()
    }

    /// Hands the ephemeral clone over to the caller: it will no longer be
    /// removed by [`Self::cleanup`] or on drop.
    pub fn keep_working_dir(&mut self) -> Option<PathBuf> {
        self.facts.working_copy.release()
    }

    // -- accessors ----------------------------------------------------------

    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.facts.local_path()
    }

    pub fn vcs(&self) -> Option<&Arc<dyn VcsHandle>> {
        self.facts.vcs()
    }

    pub fn git_ref(&self) -> Option<&GitRef> {
        self.facts.git_ref()
    }

    pub fn forge_project(&self) -> Option<&Arc<dyn ForgeProject>> {
        self.facts.project()
    }

    pub fn forge_service(&self) -> Option<&Arc<dyn ForgeService>> {
        self.facts.service()
    }

    pub fn remote_url(&self) -> Option<&RemoteUrl> {
        self.facts.remote_url()
    }

    pub fn full_name(&self) -> Option<&FullName> {
        self.facts.full_name()
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.facts.namespace()
    }

    pub fn repo_name(&self) -> Option<&RepoName> {
        self.facts.repo_name()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.facts.is_ephemeral()
    }

    pub fn is_offline(&self) -> bool {
        self.facts.is_offline()
    }

    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.last_resolution.as_ref()
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        let f = &self.facts;
        IdentitySnapshot {
            local_path: f.local_path().map(Path::to_path_buf),
            git_ref: f.git_ref().cloned(),
            remote_url: f.remote_url().cloned(),
            full_name: f.full_name().cloned(),
            namespace: f.namespace().cloned(),
            repo_name: f.repo_name().cloned(),
            forge: f.service().map(|s| s.name().to_owned()),
            forge_project: f
                .project()
                .map(|p| FullName::join(p.namespace(), p.repo_name())),
            has_version_control: f.vcs().is_some(),
            is_ephemeral: f.is_ephemeral(),
            offline: f.is_offline(),
            explicit: FactKind::ALL
                .into_iter()
                .filter(|k| f.is_explicit(*k))
                .collect(),
        }
    }
}

impl Drop for LocalProject {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for LocalProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProject")
            .field("identity", &self.snapshot())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

enum Seed {
    Path(PathBuf),
    Url(RemoteUrl),
}

/// Directory first; otherwise a URL only if online and the probe succeeds.
/// Never probes when the remote URL is already known.
fn classify(value: &str, url_known: bool, offline: bool, collab: &Collaborators) -> Option<Seed> {
    let path = Path::new(value);
    if path.is_dir() {
        debug!(path = value, "Treating input as a local working directory");
        return Some(Seed::Path(path.to_path_buf()));
    }
    if url_known || offline || !collab.probe.probe(value) {
        return None;
    }
    let url = RemoteUrl::new(value)?;
    debug!(url = value, "Treating input as a remote URL");
    Some(Seed::Url(url))
}

/// Locks the caller's names and whatever they imply, rejecting contradictions.
fn seed_names(
    facts: &mut Facts,
    full_name: Option<String>,
    namespace: Option<Namespace>,
    repo_name: Option<RepoName>,
) -> Result<(), IdentityError> {
    let full_name = match full_name {
        Some(raw) => Some(FullName::parse(raw.clone()).ok_or(IdentityError::InvalidFact {
            fact: FactKind::FullName,
            value: raw,
        })?),
        None => None,
    };

    let (namespace, repo_name, full_name) = match full_name {
        Some(full) => {
            let (implied_ns, implied_repo) = full.split();
            let ns = namespace.unwrap_or_else(|| implied_ns.clone());
            let repo = repo_name.unwrap_or_else(|| implied_repo.clone());
            if ns != implied_ns || repo != implied_repo {
                return Err(IdentityError::Contradiction {
                    full_name: full.to_string(),
                    namespace: ns.to_string(),
                    repo_name: repo.to_string(),
                });
            }
            (Some(ns), Some(repo), Some(full))
        }
        None => {
            let full = match (&namespace, &repo_name) {
                (Some(ns), Some(repo)) => Some(FullName::join(ns, repo)),
                _ => None,
            };
            (namespace, repo_name, full)
        }
    };

    if let Some(ns) = namespace {
        facts.namespace.set_explicit(ns);
    }
    if let Some(repo) = repo_name {
        facts.repo_name.set_explicit(repo);
    }
    if let Some(full) = full_name {
        facts.full_name.set_explicit(full);
    }
    Ok(())
}
