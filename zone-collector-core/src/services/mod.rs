//! Business logic service layer

mod sync_service;
mod whois_service;
mod zone_parser;
mod zone_query_service;

pub use sync_service::{SyncConfig, SyncService};
pub use whois_service::{WhoisConfig, WhoisService};
pub use zone_parser::{ChunkStream, DEFAULT_CHUNK_SIZE, ZoneParser, tld_from_zone_filename};
pub use zone_query_service::ZoneQueryService;

use std::sync::Arc;

use crate::traits::{DomainRepository, ZoneFeed};

/// Service context - holds all dependencies.
///
/// The platform layer creates this context once at startup and injects its
/// storage and download-client implementations; services receive it (or the
/// individual adapters) at construction instead of reaching for globals.
pub struct ServiceContext {
    /// Domain persistence repository
    pub domain_repository: Arc<dyn DomainRepository>,
    /// Zone file download feed
    pub zone_feed: Arc<dyn ZoneFeed>,
}

impl ServiceContext {
    /// Create the service context
    #[must_use]
    pub fn new(domain_repository: Arc<dyn DomainRepository>, zone_feed: Arc<dyn ZoneFeed>) -> Self {
        Self {
            domain_repository,
            zone_feed,
        }
    }
}
