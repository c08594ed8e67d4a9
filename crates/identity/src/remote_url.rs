//! Parsing clone URLs into host, namespace, and repository name.
//!
//! Accepted forms:
//!
//! | Form | Example |
//! |------|---------|
//! | scheme URL | `https://github.com/acme/widget.git`, `ssh://git@host:2222/acme/widget` |
//! | scp-like | `git@github.com:acme/widget.git` |
//!
//! The namespace is every path segment except the last, so GitLab subgroups
//! (`https://gitlab.com/group/sub/widget`) keep their full path. Local paths and
//! `file://` URLs have no forge location.

use url::Url;

use crate::{Namespace, RemoteUrl, RepoName};

/// Where a clone URL points on a forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    /// Lower-cased host, without user or port.
    pub host: String,
    pub namespace: Namespace,
    pub repo_name: RepoName,
}

/// Parses `url`, returning `None` when it has no forge location.
pub fn parse(url: &RemoteUrl) -> Option<RemoteLocation> {
    let raw = url.as_str().trim().trim_end_matches('/');

    if raw.contains("://") {
        let parsed = Url::parse(raw).ok()?;
        if parsed.scheme() == "file" {
            return None;
        }
        let host = parsed.host_str()?.to_ascii_lowercase();
        let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
        return locate(host, &segments);
    }

    // scp-like: [user@]host:path. A '/' before the ':' means a local path.
    let (authority, path) = raw.split_once(':')?;
    if authority.is_empty() || authority.contains('/') {
        return None;
    }
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, h)| h)
        .to_ascii_lowercase();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    locate(host, &segments)
}

/// Returns only the host of `url`, if it has one.
pub fn host(url: &RemoteUrl) -> Option<String> {
    parse(url).map(|loc| loc.host)
}

fn locate(host: String, segments: &[&str]) -> Option<RemoteLocation> {
    let (last, rest) = segments.split_last()?;
    if rest.is_empty() || host.is_empty() {
        return None;
    }
    let repo = last.strip_suffix(".git").unwrap_or(last);
    Some(RemoteLocation {
        host,
        namespace: Namespace::new(rest.join("/"))?,
        repo_name: RepoName::new(repo)?,
    })
}
