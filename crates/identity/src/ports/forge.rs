//! Forge port: remote project and service handles, plus the host registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::{FullName, Namespace, RemoteUrl, RepoName};

/// Failure reported by a [`ForgeService`] or [`ForgeProject`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// The forge has no project with this name.
    #[error("Project '{full_name}' not found")]
    NotFound {
        /// The name that was looked up.
        full_name: FullName,
    },

    /// The forge rejected the credentials (HTTP 401/403).
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The forge answered with an unexpected status.
    #[error("Forge API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The response body could not be understood.
    #[error("Malformed response: {message}")]
    Decode { message: String },
}

/// Clone URLs published by a forge project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUrls {
    /// Anonymous clone URL (usually HTTPS).
    pub git: RemoteUrl,
    /// SSH clone URL, when the forge publishes one.
    pub ssh: Option<RemoteUrl>,
}

/// A client for one forge instance, carrying its endpoint and credentials.
pub trait ForgeService: Send + Sync {
    /// Short forge kind, e.g. `"github"`.
    fn name(&self) -> &str;

    /// The host clone URLs of this instance use, e.g. `"github.com"`.
    fn hostname(&self) -> &str;

    /// Looks up a project. Performs a network request.
    fn get_project(
        &self,
        namespace: &Namespace,
        repo: &RepoName,
    ) -> Result<Arc<dyn ForgeProject>, ForgeError>;
}

/// A project on a forge.
pub trait ForgeProject: Send + Sync {
    /// Namespace as reported by the forge.
    fn namespace(&self) -> &Namespace;

    /// Repository name as reported by the forge.
    fn repo_name(&self) -> &RepoName;

    /// Clone URLs; cached on the handle, no request is made.
    fn git_urls(&self) -> Result<GitUrls, ForgeError>;

    /// The service this project was obtained from.
    fn service(&self) -> Arc<dyn ForgeService>;
}

/// Maps clone-URL hosts to the forge service that serves them.
#[derive(Clone, Default)]
pub struct ForgeRegistry {
    by_host: BTreeMap<String, Arc<dyn ForgeService>>,
}

impl ForgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` under its [`ForgeService::hostname`], replacing any
    /// previous registration for that host.
    pub fn register(&mut self, service: Arc<dyn ForgeService>) {
        self.by_host
            .insert(service.hostname().to_ascii_lowercase(), service);
    }

    /// Returns the service registered for `host` (case-insensitive).
    pub fn lookup(&self, host: &str) -> Option<Arc<dyn ForgeService>> {
        self.by_host.get(&host.to_ascii_lowercase()).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.by_host.is_empty()
    }

    /// Registered hostnames in sorted order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.by_host.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ForgeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.hosts()).finish()
    }
}
