//! The derivation rule table.
//!
//! Each [`Rule`] checks its own preconditions against the [`Facts`] and
//! reports whether it changed anything. Rules never loop and never decide
//! when to stop; that is the engine's job.
//!
//! | # | Rule | Fills | Side effect |
//! |---|------|-------|-------------|
//! | 1 | `names` | the missing one of namespace / repo / full name | none |
//! | 2 | `vcs_from_path` | handle (open, or clone into the path) | filesystem, network |
//! | 3 | `vcs_from_url` | handle + ephemeral clone | network |
//! | 4 | `project_from_names` | forge project | network |
//! | 5 | `service_from_project` | forge service | none |
//! | 6 | `ref_from_vcs` | ref | none |
//! | 7 | `path_from_vcs` | local path | none |
//! | 8 | `url_from_project` | remote URL | none |
//! | 9 | `repo_from_project` | repo name | none |
//! | 10 | `namespace_from_project` | namespace | none |
//! | 11 | `url_from_vcs` | remote URL | filesystem |
//! | 12 | `names_from_url` | namespace + repo name (refined) | none |
//! | 13 | `service_from_url` | forge service (registry lookup) | none |

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::facts::{Change, Facts};
use crate::lifecycle::discard_scratch;
use crate::ports::{Collaborators, ForgeError, VcsError};
use crate::remote_url;
use crate::FullName;

/// What a rule touches outside the fact store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Pure,
    Filesystem,
    Network,
}

/// A collaborator call made by a rule failed.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error(transparent)]
    Forge(#[from] ForgeError),
}

type Apply = fn(&mut Facts, &Collaborators) -> Result<Change, RuleError>;

/// One derivation rule.
pub struct Rule {
    /// Stable name used in logs and reports.
    pub name: &'static str,
    /// The strongest side effect the rule may cause.
    pub effect: Effect,
    /// The rule is skipped entirely when the project is offline.
    pub online_only: bool,
    pub(crate) apply: Apply,
}

impl Rule {
    pub(crate) fn apply(
        &self,
        facts: &mut Facts,
        collaborators: &Collaborators,
    ) -> Result<Change, RuleError> {
        (self.apply)(facts, collaborators)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("effect", &self.effect)
            .field("online_only", &self.online_only)
            .finish()
    }
}

/// The rule table, in evaluation order.
pub static RULES: [Rule; 13] = [
    Rule {
        name: "names",
        effect: Effect::Pure,
        online_only: false,
        apply: names,
    },
    Rule {
        name: "vcs_from_path",
        effect: Effect::Filesystem,
        online_only: false,
        apply: vcs_from_path,
    },
    Rule {
        name: "vcs_from_url",
        effect: Effect::Network,
        online_only: true,
        apply: vcs_from_url,
    },
    Rule {
        name: "project_from_names",
        effect: Effect::Network,
        online_only: true,
        apply: project_from_names,
    },
    Rule {
        name: "service_from_project",
        effect: Effect::Pure,
        online_only: true,
        apply: service_from_project,
    },
    Rule {
        name: "ref_from_vcs",
        effect: Effect::Pure,
        online_only: false,
        apply: ref_from_vcs,
    },
    Rule {
        name: "path_from_vcs",
        effect: Effect::Pure,
        online_only: false,
        apply: path_from_vcs,
    },
    Rule {
        name: "url_from_project",
        effect: Effect::Pure,
        online_only: true,
        apply: url_from_project,
    },
    Rule {
        name: "repo_from_project",
        effect: Effect::Pure,
        online_only: false,
        apply: repo_from_project,
    },
    Rule {
        name: "namespace_from_project",
        effect: Effect::Pure,
        online_only: false,
        apply: namespace_from_project,
    },
    Rule {
        name: "url_from_vcs",
        effect: Effect::Filesystem,
        online_only: false,
        apply: url_from_vcs,
    },
    Rule {
        name: "names_from_url",
        effect: Effect::Pure,
        online_only: false,
        apply: names_from_url,
    },
    Rule {
        name: "service_from_url",
        effect: Effect::Pure,
        online_only: false,
        apply: service_from_url,
    },
];

fn names(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if let (Some(ns), Some(repo)) = (facts.namespace.get(), facts.repo_name.get()) {
        let joined = FullName::join(ns, repo);
        return Ok(facts.full_name.track(joined));
    }
    let Some((ns, repo)) = facts.full_name.get().map(FullName::split) else {
        return Ok(Change::Unchanged);
    };
    Ok(facts.namespace.fill(ns) | facts.repo_name.fill(repo))
}

fn vcs_from_path(facts: &mut Facts, collab: &Collaborators) -> Result<Change, RuleError> {
    if facts.vcs.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(path) = facts.local_path.get().cloned() else {
        return Ok(Change::Unchanged);
    };
    match collab.vcs.open(&path) {
        Ok(handle) => {
            debug!(path = %path.display(), "Opened existing repository");
            Ok(facts.vcs.fill(handle))
        }
        Err(open_err) => match facts.remote_url.get() {
            Some(url) if !facts.offline => {
                info!(%url, path = %path.display(), "Cloning into working directory");
                let handle = collab.vcs.clone_repo(url, &path)?;
                Ok(facts.vcs.fill(handle))
            }
            _ => Err(open_err.into()),
        },
    }
}

fn vcs_from_url(facts: &mut Facts, collab: &Collaborators) -> Result<Change, RuleError> {
    if facts.vcs.is_set() || facts.local_path.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(url) = facts.remote_url.get().cloned() else {
        return Ok(Change::Unchanged);
    };
    let root = collab.vcs.scratch_dir()?;
    info!(%url, path = %root.display(), "Cloning into ephemeral directory");
    match collab.vcs.clone_repo(&url, &root) {
        Ok(handle) => {
            facts.working_copy.adopt(root);
            Ok(facts.vcs.fill(handle))
        }
        Err(err) => {
            discard_scratch(&root);
            Err(err.into())
        }
    }
}

fn project_from_names(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.project.is_set() {
        return Ok(Change::Unchanged);
    }
    let (Some(ns), Some(repo), Some(service)) = (
        facts.namespace.get(),
        facts.repo_name.get(),
        facts.service.get(),
    ) else {
        return Ok(Change::Unchanged);
    };
    debug!(forge = service.name(), namespace = %ns, repo = %repo, "Looking up forge project");
    let project = service.get_project(ns, repo)?;
    Ok(facts.project.fill(project))
}

fn service_from_project(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.service.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(project) = facts.project.get() else {
        return Ok(Change::Unchanged);
    };
    let service = project.service();
    Ok(facts.service.fill(service))
}

fn ref_from_vcs(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.git_ref.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(handle) = facts.vcs.get() else {
        return Ok(Change::Unchanged);
    };
    let head = handle.head()?;
    Ok(facts.git_ref.fill(head))
}

fn path_from_vcs(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.local_path.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(dir) = facts.vcs.get().and_then(|h| h.working_dir()) else {
        return Ok(Change::Unchanged);
    };
    Ok(facts.local_path.fill(dir))
}

fn url_from_project(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.remote_url.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(project) = facts.project.get() else {
        return Ok(Change::Unchanged);
    };
    let urls = project.git_urls()?;
    Ok(facts.remote_url.fill(urls.git))
}

fn repo_from_project(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.repo_name.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(repo) = facts.project.get().map(|p| p.repo_name().clone()) else {
        return Ok(Change::Unchanged);
    };
    Ok(facts.repo_name.fill(repo))
}

fn namespace_from_project(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.namespace.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(ns) = facts.project.get().map(|p| p.namespace().clone()) else {
        return Ok(Change::Unchanged);
    };
    Ok(facts.namespace.fill(ns))
}

fn url_from_vcs(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.remote_url.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(handle) = facts.vcs.get() else {
        return Ok(Change::Unchanged);
    };
    // The first remote may be a fork; callers wanting upstream should say so.
    match handle.remote_urls()?.into_iter().next() {
        Some(url) => {
            debug!(%url, "Remote URL read from repository");
            Ok(facts.remote_url.fill(url))
        }
        None => Ok(Change::Unchanged),
    }
}

fn names_from_url(facts: &mut Facts, _: &Collaborators) -> Result<Change, RuleError> {
    if facts.namespace.is_explicit() && facts.repo_name.is_explicit() {
        return Ok(Change::Unchanged);
    }
    let Some(location) = facts.remote_url.get().and_then(remote_url::parse) else {
        return Ok(Change::Unchanged);
    };
    let change =
        facts.namespace.refine(location.namespace) | facts.repo_name.refine(location.repo_name);
    if change.is_changed() {
        debug!(
            namespace = ?facts.namespace.get(),
            repo = ?facts.repo_name.get(),
            "Parsed namespace and repo name from URL"
        );
    }
    Ok(change)
}

fn service_from_url(facts: &mut Facts, collab: &Collaborators) -> Result<Change, RuleError> {
    if facts.service.is_set() {
        return Ok(Change::Unchanged);
    }
    let Some(service) = facts
        .remote_url
        .get()
        .and_then(remote_url::host)
        .and_then(|host| collab.forges.lookup(&host))
    else {
        return Ok(Change::Unchanged);
    };
    Ok(facts.service.fill(service))
}
