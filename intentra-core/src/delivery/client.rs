//! HTTP client for the primary scans API

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::Scan;

pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

const CLIENT_USER_AGENT: &str = concat!("intentra/", env!("CARGO_PKG_VERSION"));

/// Body of `PATCH /api/v1/scans/{id}/session`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionEndUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_end_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_duration_ms: Option<u64>,
}

impl SessionEndUpdate {
    pub fn is_empty(&self) -> bool {
        self.session_end_reason.is_none() && self.session_duration_ms.is_none()
    }
}

/// Authenticated client for one device and bearer token
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, token: &str, device_id: &str) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Config(format!("invalid access token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        headers.insert(
            DEVICE_ID_HEADER,
            HeaderValue::from_str(device_id)
                .map_err(|e| Error::Config(format!("invalid device id: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// `POST /api/v1/scans`
    pub async fn submit_scan(&self, scan: &Scan) -> Result<()> {
        let url = format!("{}/api/v1/scans", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(scan)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("HTTP request failed: {}", e)))?;
        check_status(response).await
    }

    /// `PATCH /api/v1/scans/{id}/session`
    pub async fn patch_session_end(&self, scan_id: &str, update: &SessionEndUpdate) -> Result<()> {
        let url = format!(
            "{}/api/v1/scans/{}/session",
            self.base_url,
            urlencoding::encode(scan_id)
        );
        let response = self
            .http_client
            .patch(&url)
            .json(update)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("HTTP request failed: {}", e)))?;
        check_status(response).await
    }
}

pub(crate) async fn check_status(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    Err(Error::Delivery(format!("API error ({}): {}", status, error_text)))
}
