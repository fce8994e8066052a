//! Client for a self-hosted scans server
//!
//! Used when no bearer credential is available and `[server]` is enabled.
//! Requests are authenticated with an HMAC signature or a client certificate.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};

use super::client::check_status;
use super::signer::HmacSigner;
use crate::config::{AuthMode, ServerConfig};
use crate::error::{Error, Result};
use crate::types::Scan;

const CLIENT_USER_AGENT: &str = concat!("intentra/", env!("CARGO_PKG_VERSION"));

pub struct ServerClient {
    http_client: reqwest::Client,
    scans_url: String,
    signer: Option<HmacSigner>,
}

impl ServerClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("server.endpoint is required".to_string()))?
            .trim_end_matches('/');

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers);

        let signer = match config.auth_mode {
            AuthMode::Hmac => {
                let (Some(key_id), Some(secret)) = (&config.key_id, &config.secret) else {
                    return Err(Error::Config(
                        "server.key_id and server.secret are required for hmac auth".to_string(),
                    ));
                };
                Some(HmacSigner::new(key_id.clone(), secret.clone()))
            }
            AuthMode::Mtls => {
                builder = builder.identity(load_identity(config)?);
                if let Some(ca_file) = &config.ca_file {
                    let pem = read_pem(ca_file)?;
                    let ca = reqwest::Certificate::from_pem(&pem)
                        .map_err(|e| Error::Config(format!("invalid server.ca_file: {}", e)))?;
                    builder = builder.add_root_certificate(ca);
                }
                None
            }
        };

        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            scans_url: format!("{}/scans", endpoint),
            signer,
        })
    }

    /// `POST <endpoint>/scans`
    pub async fn submit_scan(&self, scan: &Scan) -> Result<()> {
        let body = serde_json::to_vec(scan)?;

        let mut request = self.http_client.post(&self.scans_url);
        if let Some(signer) = &self.signer {
            for (name, value) in signer.sign(&body).pairs() {
                request = request.header(name, value);
            }
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("HTTP request failed: {}", e)))?;
        check_status(response).await
    }
}

/// Client certificate and key, concatenated into one PEM identity.
fn load_identity(config: &ServerConfig) -> Result<reqwest::Identity> {
    let (Some(cert_file), Some(key_file)) = (&config.cert_file, &config.key_file) else {
        return Err(Error::Config(
            "server.cert_file and server.key_file are required for mtls auth".to_string(),
        ));
    };

    let mut pem = read_pem(cert_file)?;
    pem.push(b'\n');
    pem.extend(read_pem(key_file)?);

    reqwest::Identity::from_pem(&pem)
        .map_err(|e| Error::Config(format!("invalid client certificate: {}", e)))
}

fn read_pem(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Config(format!("failed to read {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hmac_config(endpoint: &str) -> ServerConfig {
        ServerConfig {
            enabled: true,
            endpoint: Some(endpoint.to_string()),
            auth_mode: AuthMode::Hmac,
            key_id: Some("key-1".to_string()),
            secret: Some("s3cret".to_string()),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_hmac_client_builds_scans_url() {
        let config = hmac_config("https://intentra.example.com/api/v1/");
        let client = ServerClient::new(&config).unwrap();
        assert_eq!(client.scans_url, "https://intentra.example.com/api/v1/scans");
        assert!(client.signer.is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = hmac_config("https://intentra.example.com");
        config.secret = None;
        assert!(ServerClient::new(&config).is_err());
    }

    #[test]
    fn test_mtls_with_missing_files_is_rejected() {
        let config = ServerConfig {
            enabled: true,
            endpoint: Some("https://intentra.example.com".to_string()),
            auth_mode: AuthMode::Mtls,
            cert_file: Some("/nonexistent/client.pem".into()),
            key_file: Some("/nonexistent/client.key".into()),
            ..ServerConfig::default()
        };
        assert!(matches!(ServerClient::new(&config), Err(Error::Config(_))));
    }
}
