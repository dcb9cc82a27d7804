//! WHOIS enrichment service.
//!
//! Optional lookup used to enrich newly-registered domains. Disabled by
//! default; when enabled, queries are rate limited and failures degrade to
//! `None` rather than surfacing to callers.

use std::time::{Duration, Instant};

use regex::Regex;
use tokio::sync::Mutex;
use whois_rust::{WhoIs, WhoIsLookupOptions};

use crate::error::{CoreError, CoreResult};
use crate::types::WhoisInfo;

/// Bundled WHOIS server map (TLD → server host).
const DEFAULT_WHOIS_SERVERS: &str = include_str!("whois_servers.json");

/// WHOIS lookup settings.
#[derive(Debug, Clone)]
pub struct WhoisConfig {
    /// Whether lookups are performed at all.
    pub enabled: bool,
    /// Maximum queries per second.
    pub rate_limit: u32,
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_limit: 5,
        }
    }
}

/// Rate-limited WHOIS lookup service.
pub struct WhoisService {
    config: WhoisConfig,
    client: Option<WhoIs>,
    last_query: Mutex<Option<Instant>>,
}

impl WhoisService {
    /// Create the service. The WHOIS client is only built when enabled.
    pub fn new(config: WhoisConfig) -> CoreResult<Self> {
        let client = if config.enabled {
            let client = WhoIs::from_string(DEFAULT_WHOIS_SERVERS).map_err(|e| {
                CoreError::ValidationError(format!("Failed to initialize WHOIS client: {e}"))
            })?;
            Some(client)
        } else {
            None
        };

        Ok(Self {
            config,
            client,
            last_query: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Perform a WHOIS lookup for a fully qualified domain name.
    ///
    /// Returns `None` when the service is disabled or the lookup fails;
    /// enrichment is best-effort and never blocks its caller's flow.
    pub async fn lookup(&self, domain: &str) -> Option<WhoisInfo> {
        let client = self.client.as_ref()?;

        self.rate_limit_wait().await;

        let options = match WhoIsLookupOptions::from_string(domain) {
            Ok(options) => options,
            Err(e) => {
                log::debug!("WHOIS lookup skipped for {domain}: {e}");
                return None;
            }
        };

        match client.lookup_async(options).await {
            Ok(raw) => Some(parse_whois_response(domain, &raw)),
            Err(e) => {
                log::debug!("WHOIS lookup failed for {domain}: {e}");
                None
            }
        }
    }

    /// Wait as needed to respect the configured queries-per-second cap.
    ///
    /// The lock is held across the sleep so concurrent lookups serialize.
    async fn rate_limit_wait(&self) {
        let min_interval = Duration::from_secs_f64(1.0 / f64::from(self.config.rate_limit.max(1)));
        let mut last_query = self.last_query.lock().await;
        if let Some(last) = *last_query {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }
        *last_query = Some(Instant::now());
    }
}

/// Parse structured fields from a raw WHOIS response.
fn parse_whois_response(domain: &str, raw: &str) -> WhoisInfo {
    WhoisInfo {
        domain: domain.to_string(),
        registrar: extract_field(
            raw,
            &[
                r"(?i)Registrar:\s*(.+)",
                r"(?i)Registrar Name:\s*(.+)",
                r"(?i)Sponsoring Registrar:\s*(.+)",
            ],
        ),
        creation_date: extract_field(
            raw,
            &[
                r"(?i)Creation Date:\s*(.+)",
                r"(?i)Created Date:\s*(.+)",
                r"(?i)Created:\s*(.+)",
                r"(?i)Registration Time:\s*(.+)",
                r"(?i)Registration Date:\s*(.+)",
            ],
        ),
        expiration_date: extract_field(
            raw,
            &[
                r"(?i)Expir(?:y|ation) Date:\s*(.+)",
                r"(?i)Registry Expiry Date:\s*(.+)",
                r"(?i)Expiration Time:\s*(.+)",
                r"(?i)paid-till:\s*(.+)",
            ],
        ),
        updated_date: extract_field(
            raw,
            &[
                r"(?i)Updated Date:\s*(.+)",
                r"(?i)Last Updated:\s*(.+)",
                r"(?i)Last Modified:\s*(.+)",
            ],
        ),
        name_servers: extract_name_servers(raw),
        status: extract_status(raw),
        raw: raw.to_string(),
    }
}

/// Try multiple regex patterns and return the first match.
fn extract_field(text: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        let Some(m) = re.captures(text).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let value = m.as_str().trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }
    None
}

/// Extract name servers from WHOIS text.
fn extract_name_servers(text: &str) -> Vec<String> {
    let mut servers = Vec::new();
    let patterns = [
        r"(?i)Name Server:\s*(.+)",
        r"(?i)nserver:\s*(.+)",
        r"(?i)DNS:\s*(.+)",
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    let server = m.as_str().trim().to_lowercase();
                    if !server.is_empty() && !servers.contains(&server) {
                        servers.push(server);
                    }
                }
            }
        }
    }

    servers
}

/// Extract domain status codes from WHOIS text.
fn extract_status(text: &str) -> Vec<String> {
    let mut statuses = Vec::new();
    let patterns = [
        r"(?i)Domain Status:\s*(.+)",
        r"(?i)Status:\s*(.+)",
        r"(?i)state:\s*(.+)",
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    let status = m.as_str().trim().to_string();
                    let status = status
                        .split_whitespace()
                        .next()
                        .unwrap_or(&status)
                        .to_string();
                    if !status.is_empty() && !statuses.contains(&status) {
                        statuses.push(status);
                    }
                }
            }
        }
    }

    statuses
}
