//! pkgsync forge infrastructure adapter.
//!
//! Implements the forge-facing ports defined in the [`identity`] crate
//! (`ForgeService`, `ForgeProject`, `ReachabilityProbe`) over the GitHub and
//! GitLab REST APIs using a blocking [`reqwest`] client.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain identity rules.
//! API paths, authentication headers, status-code mapping and response
//! decoding are handled here; the [`identity`] crate never sees them.
//!
//! ## Blocking I/O
//!
//! Every call blocks the current thread. Async callers must construct and use
//! these types inside `tokio::task::spawn_blocking`; the blocking client owns
//! an internal runtime that panics if dropped on an async worker.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use identity::{ForgeError, ForgeRegistry, ForgeService};

pub mod github;
pub mod gitlab;
mod http;
pub mod probe;

pub use github::{GithubProject, GithubService};
pub use gitlab::{GitlabProject, GitlabService};
pub use http::DEFAULT_TIMEOUT;
pub use probe::HttpProbe;

/// Which REST API a forge speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgeKind {
    Github,
    Gitlab,
}

/// One forge instance to register: kind, clone-URL host, and optional API
/// base and credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgeEndpoint {
    pub kind: ForgeKind,
    pub host: String,
    /// Defaults to the public API for `github.com`/`gitlab.com`, otherwise to
    /// the self-hosted API path on `host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl ForgeEndpoint {
    pub fn new(kind: ForgeKind, host: impl Into<String>) -> Self {
        Self {
            kind,
            host: host.into(),
            api_url: None,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `github.com` and `gitlab.com`, unauthenticated.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(ForgeKind::Github, github::GITHUB_HOST),
            Self::new(ForgeKind::Gitlab, gitlab::GITLAB_HOST),
        ]
    }

    /// The API base URL this endpoint resolves to.
    pub fn resolved_api_url(&self) -> String {
        if let Some(url) = &self.api_url {
            return url.clone();
        }
        match self.kind {
            ForgeKind::Github if self.host.eq_ignore_ascii_case(github::GITHUB_HOST) => {
                github::GITHUB_API_URL.to_owned()
            }
            ForgeKind::Github => github::enterprise_api_url(&self.host),
            ForgeKind::Gitlab => gitlab::api_url_for(&self.host),
        }
    }

    /// Builds the service client. Makes no request.
    pub fn connect(&self, timeout: Duration) -> Result<Arc<dyn ForgeService>, ForgeError> {
        let api_url = self.resolved_api_url();
        let token = self.token.clone();
        let service: Arc<dyn ForgeService> = match self.kind {
            ForgeKind::Github => Arc::new(GithubService::new(&self.host, &api_url, token, timeout)?),
            ForgeKind::Gitlab => Arc::new(GitlabService::new(&self.host, &api_url, token, timeout)?),
        };
        Ok(service)
    }
}

impl std::fmt::Debug for ForgeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeEndpoint")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connects every endpoint and registers it by host. Later entries replace
/// earlier ones for the same host.
pub fn build_registry(
    endpoints: &[ForgeEndpoint],
    timeout: Duration,
) -> Result<ForgeRegistry, ForgeError> {
    let mut registry = ForgeRegistry::new();
    for endpoint in endpoints {
        registry.register(endpoint.connect(timeout)?);
    }
    Ok(registry)
}
