//! ICANN CZDS API client.
//!
//! Authenticates against the ICANN accounts API, lists the zone file
//! download links the account is approved for, and downloads individual
//! zone files to a local directory. Access tokens are cached and refreshed
//! once per request when the API answers 401.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode, header};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{CzdsError, Result};
use crate::http::{execute_request_with_retry, read_body};
use crate::traits::{ZoneFeed, tld_from_url};

/// Timeout for the authentication request.
const AUTH_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for the link-listing request.
const LINKS_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for a single zone file download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
/// Retries for transient transport failures.
const MAX_RETRIES: u32 = 2;

/// Connection settings for [`CzdsClient`].
#[derive(Debug, Clone)]
pub struct CzdsConfig {
    /// ICANN account username.
    pub username: String,
    /// ICANN account password.
    pub password: String,
    /// Base URL of the accounts API.
    pub auth_url: String,
    /// Base URL of the CZDS API.
    pub czds_url: String,
    /// Directory where downloaded zone files are stored.
    pub zone_files_dir: PathBuf,
}

impl Default for CzdsConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            auth_url: "https://account-api.icann.org".to_string(),
            czds_url: "https://czds-api.icann.org".to_string(),
            zone_files_dir: PathBuf::from("zonefiles"),
        }
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// ICANN CZDS API client.
pub struct CzdsClient {
    config: CzdsConfig,
    http: reqwest::Client,
    access_token: RwLock<Option<String>>,
}

impl CzdsClient {
    /// Create a client and ensure the zone file directory exists.
    pub fn new(config: CzdsConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.zone_files_dir).map_err(|e| CzdsError::IoError {
            detail: format!(
                "Failed to create zone files dir {}: {e}",
                config.zone_files_dir.display()
            ),
        })?;

        Ok(Self {
            config,
            http: reqwest::Client::new(),
            access_token: RwLock::new(None),
        })
    }

    /// Whether an access token is currently cached.
    pub async fn has_token(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    /// Authenticate with ICANN and cache the access token.
    pub async fn authenticate(&self) -> Result<()> {
        let endpoint = format!("{}/api/authenticate", self.config.auth_url);
        let payload = serde_json::json!({
            "username": self.config.username,
            "password": self.config.password,
        });

        let request = self
            .http
            .post(&endpoint)
            .json(&payload)
            .header(header::ACCEPT, "application/json")
            .timeout(AUTH_TIMEOUT);

        let response = execute_request_with_retry(request, "POST", "/api/authenticate", MAX_RETRIES)
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    CzdsError::AuthenticationFailed {
                        status: None,
                        detail: e.to_string(),
                    }
                } else {
                    e
                }
            })?;

        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            return Err(CzdsError::AuthenticationFailed {
                status: Some(status.as_u16()),
                detail: body,
            });
        }

        let auth: AuthResponse =
            serde_json::from_str(&body).map_err(|e| CzdsError::ParseError {
                detail: format!("Invalid authentication response: {e}"),
            })?;

        *self.access_token.write().await = Some(auth.access_token);
        log::info!("[czds] Authenticated as {}", self.config.username);

        Ok(())
    }

    /// Return the cached access token, authenticating first if necessary.
    async fn ensure_token(&self) -> Result<String> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }
        self.authenticate().await?;
        self.access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| CzdsError::AuthenticationFailed {
                status: None,
                detail: "No access token after authentication".to_string(),
            })
    }

    /// Perform an authorized GET, re-authenticating once on 401.
    async fn authorized_get(
        &self,
        url: &str,
        timeout: Duration,
        action: &str,
    ) -> Result<Response> {
        let token = self.ensure_token().await?;
        let request = self
            .http
            .get(url)
            .bearer_auth(&token)
            .header(header::ACCEPT, "application/json")
            .timeout(timeout);

        let response = execute_request_with_retry(request, "GET", action, MAX_RETRIES).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Token expired: refresh once and replay the request.
        log::warn!("[czds] Access token expired, re-authenticating...");
        self.authenticate().await?;
        let token = self.ensure_token().await?;
        let retry = self
            .http
            .get(url)
            .bearer_auth(&token)
            .header(header::ACCEPT, "application/json")
            .timeout(timeout);

        let response = execute_request_with_retry(retry, "GET", action, MAX_RETRIES).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = read_body(response).await.unwrap_or_default();
            return Err(CzdsError::Unauthorized {
                detail: format!("Still unauthorized after re-authentication: {body}"),
            });
        }

        Ok(response)
    }

    /// Pick the local filename for a download response.
    ///
    /// Prefers the `Content-Disposition` filename; falls back to `<tld>.txt.gz`.
    fn local_filename(response: &Response, tld: &str) -> String {
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split("filename=").nth(1))
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{tld}.txt.gz"))
    }
}

#[async_trait]
impl ZoneFeed for CzdsClient {
    async fn zone_links(&self) -> Result<Vec<String>> {
        let url = format!("{}/czds/downloads/links", self.config.czds_url);
        let response = self
            .authorized_get(&url, LINKS_TIMEOUT, "/czds/downloads/links")
            .await?;

        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            return Err(CzdsError::HttpStatus {
                status: status.as_u16(),
                detail: body,
            });
        }

        let links: Vec<String> =
            serde_json::from_str(&body).map_err(|e| CzdsError::ParseError {
                detail: format!("Invalid zone link list: {e}"),
            })?;

        log::info!("[czds] Found {} zone files available", links.len());
        Ok(links)
    }

    async fn download_zone_file(&self, url: &str) -> Result<Option<PathBuf>> {
        let tld = tld_from_url(url);
        log::info!("[czds] Downloading zone file for {tld}...");

        let response = self.authorized_get(url, DOWNLOAD_TIMEOUT, url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            log::warn!("[czds] Zone file not found for {tld}");
            return Ok(None);
        }

        if !status.is_success() {
            let body = read_body(response).await.unwrap_or_default();
            return Err(CzdsError::HttpStatus {
                status: status.as_u16(),
                detail: body,
            });
        }

        let filename = Self::local_filename(&response, &tld);
        let file_path = self.config.zone_files_dir.join(filename);

        let content = response.bytes().await.map_err(|e| CzdsError::NetworkError {
            detail: format!("Failed to read zone file body: {e}"),
        })?;

        tokio::fs::write(&file_path, &content)
            .await
            .map_err(|e| CzdsError::IoError {
                detail: format!("Failed to write {}: {e}", file_path.display()),
            })?;

        log::info!(
            "[czds] Downloaded {tld} zone file to {}",
            file_path.display()
        );
        Ok(Some(file_path))
    }
}
