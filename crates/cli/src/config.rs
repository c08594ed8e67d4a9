//! `pkgsync` configuration file.
//!
//! ```toml
//! offline = false
//! resolve_timeout_secs = 120
//!
//! [[forges]]
//! kind = "gitlab"
//! host = "gitlab.example.org"
//! token = "glpat-…"
//! ```
//!
//! A file that lists no `[[forges]]` keeps the defaults (`github.com` and
//! `gitlab.com`); a file that lists any replaces them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use forge::{ForgeEndpoint, ForgeKind};

pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Never touch the network.
    pub offline: bool,
    /// Upper bound on one `resolve`, clones and API calls included.
    pub resolve_timeout_secs: u64,
    pub forges: Vec<ForgeEndpoint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offline: false,
            resolve_timeout_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
            forges: ForgeEndpoint::defaults(),
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid pkgsync configuration")
    }

    /// Loads `explicit` if given (it must exist), else the default location
    /// if it exists, else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    tracing::debug!("No configuration file; using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config =
            Self::parse(&text).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), forges = config.forges.len(), "Loaded configuration");
        Ok(config)
    }

    /// Sets `token` on every endpoint of `kind` that has none.
    pub fn fill_token(&mut self, kind: ForgeKind, token: &str) {
        for endpoint in self.forges.iter_mut().filter(|e| e.kind == kind) {
            endpoint.token.get_or_insert_with(|| token.to_owned());
        }
    }
}

/// `<config dir>/pkgsync/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pkgsync").join("config.toml"))
}
