//! `pkgsync resolve`: derive a project's identity and print it as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Args;
use serde::Serialize;
use tracing::info;

use forge::{ForgeEndpoint, HttpProbe};
use identity::{
    BranchName, Collaborators, IdentitySnapshot, LocalProject, Namespace, ProjectSpec, RemoteUrl,
    RepoName, Resolution,
};
use vcs::Git2Backend;

use crate::config::Config;

/// Per-request timeout for forge API calls and probes.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, Args)]
pub struct ResolveArgs {
    /// A local directory or a remote URL.
    pub path_or_url: Option<String>,

    /// Local working directory.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Remote clone URL.
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub namespace: Option<String>,

    #[arg(long)]
    pub repo: Option<String>,

    /// `namespace/repo`.
    #[arg(long)]
    pub full_name: Option<String>,

    /// Branch to check out, created from HEAD if missing.
    #[arg(long = "ref", value_name = "BRANCH")]
    pub git_ref: Option<String>,

    /// Never touch the network (overrides the configuration file).
    #[arg(long)]
    pub offline: bool,

    /// Validate and print the inputs without deriving anything.
    #[arg(long)]
    pub no_resolve: bool,

    /// Keep an ephemeral clone on disk instead of removing it on exit.
    #[arg(long)]
    pub keep_clone: bool,

    /// Overall time limit in seconds (overrides the configuration file).
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// What `resolve` prints.
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub identity: IdentitySnapshot,
    pub resolution: Option<Resolution>,
    /// Set when `--keep-clone` kept an ephemeral clone.
    pub kept_clone: Option<PathBuf>,
}

impl ResolveArgs {
    /// Builds the project description. Name validation beyond non-emptiness
    /// is left to [`LocalProject::new`].
    pub fn to_spec(&self, offline: bool) -> anyhow::Result<ProjectSpec> {
        let mut spec = ProjectSpec::new().offline(offline);
        if let Some(value) = &self.path_or_url {
            spec = spec.path_or_url(value.clone());
        }
        if let Some(path) = &self.path {
            spec = spec.local_path(path.clone());
        }
        if let Some(url) = &self.url {
            spec = spec.remote_url(non_empty(RemoteUrl::new(url.clone()), "--url")?);
        }
        if let Some(ns) = &self.namespace {
            spec = spec.namespace(non_empty(Namespace::new(ns.clone()), "--namespace")?);
        }
        if let Some(repo) = &self.repo {
            spec = spec.repo_name(non_empty(RepoName::new(repo.clone()), "--repo")?);
        }
        if let Some(full_name) = &self.full_name {
            spec = spec.full_name(full_name.clone());
        }
        if let Some(branch) = &self.git_ref {
            spec = spec.git_ref(non_empty(BranchName::new(branch.clone()), "--ref")?);
        }
        if self.no_resolve {
            spec = spec.defer_resolution();
        }
        Ok(spec)
    }
}

fn non_empty<T>(value: Option<T>, flag: &str) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow!("{flag} must not be empty"))
}

/// Real collaborators: git2, the configured forges, and an HTTP probe unless
/// offline. Offline resolution still maps hosts to forges without calling
/// them. Constructs blocking HTTP clients, so must run off the async workers.
pub fn collaborators(forges: &[ForgeEndpoint], offline: bool) -> anyhow::Result<Collaborators> {
    let mut collaborators = Collaborators::local(Arc::new(Git2Backend::new()));
    collaborators.forges =
        forge::build_registry(forges, HTTP_TIMEOUT).context("cannot set up forge clients")?;
    if offline {
        return Ok(collaborators);
    }
    Ok(collaborators.with_probe(Arc::new(
        HttpProbe::new(HTTP_TIMEOUT).context("cannot set up reachability probe")?,
    )))
}

/// Resolves synchronously. An ephemeral clone is removed before this
/// returns unless `keep_clone` is set.
pub fn resolve_blocking(
    spec: ProjectSpec,
    collaborators: Collaborators,
    keep_clone: bool,
) -> anyhow::Result<ResolveOutput> {
    let mut project = LocalProject::new(spec, collaborators)?;
    let kept_clone = if keep_clone {
        project.keep_working_dir()
    } else {
        None
    };
    let output = ResolveOutput {
        identity: project.snapshot(),
        resolution: project.last_resolution().cloned(),
        kept_clone,
    };
    if project.cleanup() {
        info!("Removed ephemeral clone");
    }
    Ok(output)
}

pub async fn run(args: ResolveArgs, config: Config) -> anyhow::Result<()> {
    let offline = args.offline || config.offline;
    let limit = Duration::from_secs(args.timeout_secs.unwrap_or(config.resolve_timeout_secs));
    let spec = args.to_spec(offline)?;
    let keep_clone = args.keep_clone;
    let forges = config.forges;

    let task = tokio::task::spawn_blocking(move || {
        let collaborators = collaborators(&forges, offline)?;
        resolve_blocking(spec, collaborators, keep_clone)
    });
    let output = tokio::time::timeout(limit, task)
        .await
        .map_err(|_| anyhow!("resolution did not finish within {}s", limit.as_secs()))?
        .context("resolution task panicked")??;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
