//! GitLab REST client.
//!
//! Projects are addressed by their URL-encoded path, so nested subgroups
//! (`group/sub/repo`) need no extra lookups.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use identity::{
    ForgeError, ForgeProject, ForgeService, FullName, GitUrls, Namespace, RemoteUrl, RepoName,
};

use crate::http::ApiClient;

pub const GITLAB_HOST: &str = "gitlab.com";

/// API base for a GitLab host.
pub fn api_url_for(host: &str) -> String {
    format!("https://{host}/api/v4")
}

/// The `:id` path parameter for a project: its full path, URL-encoded.
pub(crate) fn project_id(full_name: &FullName) -> String {
    urlencoding::encode(full_name.as_str()).into_owned()
}

/// A GitLab instance.
#[derive(Debug, Clone)]
pub struct GitlabService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    host: String,
    api: ApiClient,
}

impl GitlabService {
    /// A client for `gitlab.com`.
    pub fn public(token: Option<String>, timeout: Duration) -> Result<Self, ForgeError> {
        Self::new(GITLAB_HOST, &api_url_for(GITLAB_HOST), token, timeout)
    }

    pub fn new(
        host: &str,
        api_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ForgeError> {
        let headers = token
            .map(|token| vec![("PRIVATE-TOKEN", token)])
            .unwrap_or_default();
        Ok(Self {
            inner: Arc::new(Inner {
                host: host.to_owned(),
                api: ApiClient::new(api_url, headers, timeout)?,
            }),
        })
    }
}

impl ForgeService for GitlabService {
    fn name(&self) -> &str {
        "gitlab"
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
        let path = format!("/projects/{}", project_id(&full_name));
        let payload: ProjectPayload = self.inner.api.get_json(&path, &full_name)?;
        let project = payload.into_project(self.clone())?;
        info!(
            host = %self.inner.host,
            project = %FullName::join(&project.namespace, &project.repo),
            "Found GitLab project"
        );
        Ok(Arc::new(project))
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectPayload {
    path: String,
    namespace: NamespacePayload,
    http_url_to_repo: String,
    ssh_url_to_repo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamespacePayload {
    full_path: String,
}

impl ProjectPayload {
    pub(crate) fn into_project(self, service: GitlabService) -> Result<GitlabProject, ForgeError> {
        let decode = |field: &str| ForgeError::Decode {
            message: format!("GitLab project response has an empty `{field}`"),
        };
        Ok(GitlabProject {
            namespace: Namespace::new(self.namespace.full_path)
                .ok_or_else(|| decode("namespace.full_path"))?,
            repo: RepoName::new(self.path).ok_or_else(|| decode("path"))?,
            urls: GitUrls {
                git: RemoteUrl::new(self.http_url_to_repo)
                    .ok_or_else(|| decode("http_url_to_repo"))?,
                ssh: self.ssh_url_to_repo.and_then(RemoteUrl::new),
            },
            service,
        })
    }
}

/// A project on a [`GitlabService`].
#[derive(Debug, Clone)]
pub struct GitlabProject {
    namespace: Namespace,
    repo: RepoName,
    urls: GitUrls,
    service: GitlabService,
}

impl ForgeProject for GitlabProject {
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

    #[test]
    fn test_project_id_encodes_subgroups() {
        let name = FullName::parse("gitlab-org/charts/gitlab").unwrap();
        assert_eq!(project_id(&name), "gitlab-org%2Fcharts%2Fgitlab");
    }

    #[test]
    fn test_payload_maps_nested_namespace() {
        let payload: ProjectPayload = serde_json::from_str(
            r#"{
                "id": 3828396,
                "path": "gitlab",
                "path_with_namespace": "gitlab-org/charts/gitlab",
                "namespace": { "id": 2, "full_path": "gitlab-org/charts" },
                "http_url_to_repo": "https://gitlab.com/gitlab-org/charts/gitlab.git",
                "ssh_url_to_repo": "git@gitlab.com:gitlab-org/charts/gitlab.git"
            }"#,
        )
        .unwrap();
        let service = GitlabService::public(None, DEFAULT_TIMEOUT).unwrap();

        let project = payload.into_project(service).unwrap();

        assert_eq!(project.namespace().as_str(), "gitlab-org/charts");
        assert_eq!(project.repo_name().as_str(), "gitlab");
        assert_eq!(
            project.git_urls().unwrap().git.as_str(),
            "https://gitlab.com/gitlab-org/charts/gitlab.git"
        );
        assert_eq!(project.service().name(), "gitlab");
    }

    #[test]
    fn test_api_url_for_self_hosted() {
        assert_eq!(
            api_url_for("gitlab.example.org"),
            "https://gitlab.example.org/api/v4"
        );
    }
}
