//! Platform-agnostic application bootstrap for Zone Collector.
//!
//! Provides `SqliteStore` (the `SeaORM` storage adapter), `AppState` (service
//! container), and `AppStateBuilder` (adapter injection). The frontend
//! constructs `AppState` once at startup with its storage and download-client
//! implementations; all services hang off the resulting container.

pub mod adapters;

use std::sync::Arc;

use zone_collector_core::error::{CoreError, CoreResult};
use zone_collector_core::services::{
    ServiceContext, SyncConfig, SyncService, WhoisConfig, WhoisService, ZoneQueryService,
};
use zone_collector_core::traits::{DomainRepository, ZoneFeed};

pub use adapters::SqliteStore;

/// Platform-agnostic application state.
///
/// Holds all services and the `ServiceContext`. The frontend constructs this
/// once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Service context (holds the storage and download-client adapters)
    pub ctx: Arc<ServiceContext>,
    /// Sync orchestration service
    pub sync_service: Arc<SyncService>,
    /// Read-side query service
    pub query_service: Arc<ZoneQueryService>,
    /// Optional WHOIS enrichment service
    pub whois_service: Arc<WhoisService>,
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `domain_repository` — how domains and sync bookkeeping are stored
/// - `zone_feed` — where zone files are downloaded from
///
/// # Optional
/// - `sync_config` — concurrency and chunking knobs (defaults apply)
/// - `whois_config` — WHOIS enrichment (disabled by default)
pub struct AppStateBuilder {
    domain_repository: Option<Arc<dyn DomainRepository>>,
    zone_feed: Option<Arc<dyn ZoneFeed>>,
    sync_config: SyncConfig,
    whois_config: WhoisConfig,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain_repository: None,
            zone_feed: None,
            sync_config: SyncConfig::default(),
            whois_config: WhoisConfig::default(),
        }
    }

    #[must_use]
    pub fn domain_repository(mut self, repository: Arc<dyn DomainRepository>) -> Self {
        self.domain_repository = Some(repository);
        self
    }

    #[must_use]
    pub fn zone_feed(mut self, feed: Arc<dyn ZoneFeed>) -> Self {
        self.zone_feed = Some(feed);
        self
    }

    #[must_use]
    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync_config = config;
        self
    }

    #[must_use]
    pub fn whois_config(mut self, config: WhoisConfig) -> Self {
        self.whois_config = config;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let domain_repository = self.domain_repository.ok_or_else(|| {
            CoreError::ValidationError("domain_repository is required".to_string())
        })?;
        let zone_feed = self
            .zone_feed
            .ok_or_else(|| CoreError::ValidationError("zone_feed is required".to_string()))?;

        let ctx = Arc::new(ServiceContext::new(
            Arc::clone(&domain_repository),
            zone_feed,
        ));

        let sync_service = Arc::new(SyncService::new(Arc::clone(&ctx), self.sync_config));
        let query_service = Arc::new(ZoneQueryService::new(domain_repository));
        let whois_service = Arc::new(WhoisService::new(self.whois_config)?);

        Ok(AppState {
            ctx,
            sync_service,
            query_service,
            whois_service,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
