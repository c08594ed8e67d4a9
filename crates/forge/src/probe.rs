//! Reachability checks for URLs given as project input.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use identity::{ForgeError, ReachabilityProbe};

use crate::http::build_client;

/// Probes URLs with an HTTP `HEAD` request.
///
/// Any 2xx or 3xx answer counts as reachable. Transport errors and other
/// statuses do not.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ForgeError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

impl ReachabilityProbe for HttpProbe {
    fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) => {
                let status = response.status();
                debug!(url, %status, "Probe answered");
                status.is_success() || status.is_redirection()
            }
            Err(err) => {
                warn!(url, error = %err, "Probe failed; treating as unreachable");
                false
            }
        }
    }
}
