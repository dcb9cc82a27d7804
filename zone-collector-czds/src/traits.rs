//! Zone feed abstraction trait.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

/// Source of downloadable registry zone files.
///
/// Implementations:
/// - [`CzdsClient`](crate::CzdsClient) — the real ICANN CZDS API
/// - test doubles that serve scripted links and local files
#[async_trait]
pub trait ZoneFeed: Send + Sync {
    /// List the download links of every zone file the account may access.
    ///
    /// Implementations authenticate transparently, including re-authenticating
    /// once when a cached token has expired.
    async fn zone_links(&self) -> Result<Vec<String>>;

    /// Download one zone file to local storage.
    ///
    /// # Returns
    /// * `Ok(Some(path))` - file downloaded
    /// * `Ok(None)` - the zone is not available (HTTP 404)
    /// * `Err(_)` - transport or authorization failure
    async fn download_zone_file(&self, url: &str) -> Result<Option<PathBuf>>;
}

/// Derive the TLD identity from a zone download link.
///
/// The CZDS link format ends in `<tld>.zone`; the stem is the TLD.
#[must_use]
pub fn tld_from_url(url: &str) -> String {
    let filename = url.rsplit('/').next().unwrap_or(url);
    filename.trim_end_matches(".zone").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tld_from_full_url() {
        assert_eq!(
            tld_from_url("https://czds-api.icann.org/czds/downloads/example.zone"),
            "example"
        );
    }

    #[test]
    fn tld_from_bare_filename() {
        assert_eq!(tld_from_url("shop.zone"), "shop");
    }

    #[test]
    fn tld_without_zone_suffix() {
        assert_eq!(tld_from_url("https://host/downloads/dev"), "dev");
    }
}
