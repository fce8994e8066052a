//! Choosing a delivery path for a built scan
//!
//! 1. A usable bearer credential sends the scan to the primary API.
//! 2. Otherwise an enabled `[server]` section sends it to the self-hosted
//!    server.
//!
//! Every failure is logged and reported as [`DeliveryOutcome::Failed`];
//! nothing here returns an error to the hook caller.

use std::future::Future;

use super::client::{ApiClient, SessionEndUpdate};
use super::credentials::CredentialSource;
use super::server::ServerClient;
use crate::config::{ApiConfig, ServerConfig};
use crate::error::{Error, Result};
use crate::types::Scan;

/// How a scan left the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the primary API with a bearer credential
    Direct,
    /// Accepted by the self-hosted server
    Server,
    /// A path was attempted and failed
    Failed,
    /// No credential and no enabled server
    Skipped,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Direct => "direct",
            DeliveryOutcome::Server => "server",
            DeliveryOutcome::Failed => "failed",
            DeliveryOutcome::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct DeliveryCoordinator {
    api: ApiConfig,
    server: ServerConfig,
    credentials: Box<dyn CredentialSource>,
    device_id: String,
}

impl DeliveryCoordinator {
    pub fn new(
        api: ApiConfig,
        server: ServerConfig,
        credentials: Box<dyn CredentialSource>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            server,
            credentials,
            device_id: device_id.into(),
        }
    }

    /// Deliver a scan on the first available path.
    pub fn deliver(&self, scan: &Scan) -> DeliveryOutcome {
        if let Some(token) = self.credentials.current_token() {
            return match self.deliver_direct(&token, scan) {
                Ok(()) => {
                    tracing::info!(scan_id = %scan.id, "Scan delivered");
                    DeliveryOutcome::Direct
                }
                Err(e) => {
                    tracing::warn!(scan_id = %scan.id, error = %e, "Scan delivery failed");
                    DeliveryOutcome::Failed
                }
            };
        }

        if self.server.enabled {
            return match self.deliver_to_server(scan) {
                Ok(()) => {
                    tracing::info!(scan_id = %scan.id, "Scan delivered to server");
                    DeliveryOutcome::Server
                }
                Err(e) => {
                    tracing::warn!(scan_id = %scan.id, error = %e, "Server delivery failed");
                    DeliveryOutcome::Failed
                }
            };
        }

        tracing::debug!(scan_id = %scan.id, "No credential or server configured, scan not sent");
        DeliveryOutcome::Skipped
    }

    /// Patch session-end data onto a delivered scan. Returns whether the API
    /// accepted it; `false` without a credential.
    pub fn patch_session_end(&self, scan_id: &str, update: &SessionEndUpdate) -> bool {
        let Some(token) = self.credentials.current_token() else {
            return false;
        };

        let result = ApiClient::new(&self.api, &token, &self.device_id)
            .and_then(|client| block_on(client.patch_session_end(scan_id, update)));
        match result {
            Ok(()) => {
                tracing::info!(scan_id, "Session end recorded");
                true
            }
            Err(e) => {
                tracing::warn!(scan_id, error = %e, "Session end update failed");
                false
            }
        }
    }

    fn deliver_direct(&self, token: &str, scan: &Scan) -> Result<()> {
        let client = ApiClient::new(&self.api, token, &self.device_id)?;
        block_on(client.submit_scan(scan))
    }

    fn deliver_to_server(&self, scan: &Scan) -> Result<()> {
        let client = ServerClient::new(&self.server)?;
        block_on(client.submit_scan(scan))
    }
}

/// Run one request on a current-thread runtime; a hook process makes at most
/// a couple of sequential requests.
fn block_on<F>(future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Delivery(format!("failed to create runtime: {}", e)))?;
    runtime.block_on(future)
}
