//! Blocking JSON GET shared by the forge clients.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use identity::{ForgeError, FullName};

const USER_AGENT: &str = concat!("pkgsync/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(timeout: Duration) -> Result<Client, ForgeError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| ForgeError::Transport {
            message: format!("failed to create HTTP client: {e}"),
        })
}

/// A REST endpoint plus the headers sent with every request (credentials,
/// media type).
#[derive(Clone)]
pub(crate) struct ApiClient {
    client: Client,
    base_url: String,
    headers: Vec<(&'static str, String)>,
}

impl ApiClient {
    pub(crate) fn new(
        base_url: &str,
        headers: Vec<(&'static str, String)>,
        timeout: Duration,
    ) -> Result<Self, ForgeError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            headers,
        })
    }

    /// GETs `{base_url}{path}` and decodes the body. `full_name` names the
    /// project in a [`ForgeError::NotFound`].
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        full_name: &FullName,
    ) -> Result<T, ForgeError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "Forge API request");

        let mut request = self.client.get(&url);
        for (header, value) in &self.headers {
            request = request.header(*header, value);
        }
        let response = request.send().map_err(|e| {
            warn!(%url, error = %e, "Forge API request failed");
            ForgeError::Transport {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, &body, full_name));
        }
        response.json::<T>().map_err(|e| ForgeError::Decode {
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field(
                "headers",
                &self.headers.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Maps a non-success status to a [`ForgeError`].
///
/// GitHub and GitLab both put a human-readable `message` in error bodies;
/// it is used when present.
pub(crate) fn status_error(status: StatusCode, body: &str, full_name: &FullName) -> ForgeError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_owned()
        });
    match status {
        StatusCode::NOT_FOUND => ForgeError::NotFound {
            full_name: full_name.clone(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ForgeError::Unauthorized { message },
        _ => ForgeError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
