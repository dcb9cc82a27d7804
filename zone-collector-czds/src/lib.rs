//! # zone-collector-czds
//!
//! Client library for the [ICANN CZDS](https://czds.icann.org/) API: lists
//! the zone file download links an account is approved for and downloads
//! individual registry zone files to local storage.
//!
//! ## TLS Backend
//!
//! - **`native-tls`** *(default)* — Use the platform's native TLS implementation.
//! - **`rustls`** — Use rustls. Recommended for cross-compilation.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zone_collector_czds::{CzdsClient, CzdsConfig, ZoneFeed};
//!
//! # async fn run() -> zone_collector_czds::Result<()> {
//! let client = CzdsClient::new(CzdsConfig {
//!     username: "user@example.org".into(),
//!     password: "secret".into(),
//!     ..CzdsConfig::default()
//! })?;
//!
//! for link in client.zone_links().await? {
//!     if let Some(path) = client.download_zone_file(&link).await? {
//!         println!("downloaded {}", path.display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod http;
mod traits;

pub use client::{CzdsClient, CzdsConfig};
pub use error::{CzdsError, Result};
pub use traits::{ZoneFeed, tld_from_url};
