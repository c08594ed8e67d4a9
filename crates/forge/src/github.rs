//! GitHub REST client.
//!
//! `GET {api}/repos/{owner}/{repo}`; the response's `owner.login`, `name`,
//! `clone_url` and `ssh_url` become the project's identity and clone URLs.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use identity::{
    ForgeError, ForgeProject, ForgeService, FullName, GitUrls, Namespace, RemoteUrl, RepoName,
};

use crate::http::ApiClient;

pub const GITHUB_HOST: &str = "github.com";
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// API base for a GitHub Enterprise host.
pub fn enterprise_api_url(host: &str) -> String {
    format!("https://{host}/api/v3")
}

/// A GitHub (or GitHub Enterprise) instance.
#[derive(Debug, Clone)]
pub struct GithubService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    host: String,
    api: ApiClient,
}

impl GithubService {
    /// A client for `github.com`.
    pub fn public(token: Option<String>, timeout: Duration) -> Result<Self, ForgeError> {
        Self::new(GITHUB_HOST, GITHUB_API_URL, token, timeout)
    }

    pub fn new(
        host: &str,
        api_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ForgeError> {
        let mut headers = vec![
            ("Accept", "application/vnd.github+json".to_owned()),
            ("X-GitHub-Api-Version", "2022-11-28".to_owned()),
        ];
        if let Some(token) = token {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        Ok(Self {
            inner: Arc::new(Inner {
                host: host.to_owned(),
                api: ApiClient::new(api_url, headers, timeout)?,
            }),
        })
    }
}

impl ForgeService for GithubService {
    fn name(&self) -> &str {
        "github"
    }

    fn hostname(&self) -> &str {
        &self.inner.host
    }

    fn get_project(
        &self,
        namespace: &Namespace,
        repo: &RepoName,
    ) -> Result<Arc<dyn ForgeProject>, ForgeError> {
        let full_name = FullName::join(namespace, repo);
        let path = format!("/repos/{full_name}");
        let payload: RepoPayload = self.inner.api.get_json(&path, &full_name)?;
        let project = payload.into_project(self.clone())?;
        info!(
            host = %self.inner.host,
            project = %FullName::join(&project.namespace, &project.repo),
            "Found GitHub repository"
        );
        Ok(Arc::new(project))
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct RepoPayload {
    owner: OwnerPayload,
    name: String,
    clone_url: String,
    ssh_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

impl RepoPayload {
    pub(crate) fn into_project(self, service: GithubService) -> Result<GithubProject, ForgeError> {
        let decode = |field: &str| ForgeError::Decode {
            message: format!("GitHub repository response has an empty `{field}`"),
        };
        Ok(GithubProject {
            namespace: Namespace::new(self.owner.login).ok_or_else(|| decode("owner.login"))?,
            repo: RepoName::new(self.name).ok_or_else(|| decode("name"))?,
            urls: GitUrls {
                git: RemoteUrl::new(self.clone_url).ok_or_else(|| decode("clone_url"))?,
                ssh: self.ssh_url.and_then(RemoteUrl::new),
            },
            service,
        })
    }
}

/// A repository on a [`GithubService`].
#[derive(Debug, Clone)]
pub struct GithubProject {
    namespace: Namespace,
    repo: RepoName,
    urls: GitUrls,
    service: GithubService,
}

impl ForgeProject for GithubProject {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn repo_name(&self) -> &RepoName {
        &self.repo
    }

    fn git_urls(&self) -> Result<GitUrls, ForgeError> {
        Ok(self.urls.clone())
    }

    fn service(&self) -> Arc<dyn ForgeService> {
        Arc::new(self.service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::DEFAULT_TIMEOUT;
    use pretty_assertions::assert_eq;

    fn service() -> GithubService {
        GithubService::public(None, DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_payload_maps_to_project() {
        let payload: RepoPayload = serde_json::from_str(
            r#"{
                "id": 1296269,
                "name": "Hello-World",
                "full_name": "octocat/Hello-World",
                "owner": { "login": "octocat", "id": 1 },
                "clone_url": "https://github.com/octocat/Hello-World.git",
                "ssh_url": "git@github.com:octocat/Hello-World.git",
                "private": false
            }"#,
        )
        .unwrap();

        let project = payload.into_project(service()).unwrap();

        assert_eq!(project.namespace().as_str(), "octocat");
        assert_eq!(project.repo_name().as_str(), "Hello-World");
        assert_eq!(
            project.git_urls().unwrap(),
            GitUrls {
                git: RemoteUrl::new("https://github.com/octocat/Hello-World.git").unwrap(),
                ssh: RemoteUrl::new("git@github.com:octocat/Hello-World.git"),
            }
        );
        assert_eq!(project.service().hostname(), "github.com");
    }

    #[test]
    fn test_empty_owner_is_a_decode_error() {
        let payload: RepoPayload = serde_json::from_str(
            r#"{"name":"x","owner":{"login":""},"clone_url":"https://github.com/x.git"}"#,
        )
        .unwrap();

        assert!(matches!(
            payload.into_project(service()),
            Err(ForgeError::Decode { .. })
        ));
    }

    #[test]
    fn test_enterprise_api_url() {
        assert_eq!(
            enterprise_api_url("git.corp.example"),
            "https://git.corp.example/api/v3"
        );
    }
}
