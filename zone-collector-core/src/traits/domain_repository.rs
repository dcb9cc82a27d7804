//! Domain persistence abstraction trait

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::{
    DomainPage, DomainRecord, GapReport, PersistedDomain, SyncStatsRecord, SyncStatsSummary,
    TldStats, UpsertOutcome,
};

/// Domain storage repository trait.
///
/// Storage is logically partitioned per TLD with `(tld, domain)` unique;
/// two cross-TLD collections hold the append-only sync-statistics log and
/// the per-TLD recency metadata.
///
/// Platform implementation: `SqliteStore` (`SeaORM`) in `zone-collector-app`.
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Insert or refresh a batch of parsed domains for one TLD.
    ///
    /// Idempotent: absent domains are inserted with
    /// `first_seen = last_seen = observed_at`; present domains keep
    /// `first_seen` and get `last_seen`, DNS records, and provenance
    /// overwritten. A repeated identical call yields `inserted = 0`.
    ///
    /// Writes are batched internally; a failed batch contributes its size to
    /// `UpsertOutcome::failed` and does not abort the remaining batches.
    async fn upsert_domains(
        &self,
        tld: &str,
        domains: &HashMap<String, DomainRecord>,
        observed_at: DateTime<Utc>,
    ) -> CoreResult<UpsertOutcome>;

    /// Append one per-TLD sync statistics record. Never mutated afterwards.
    async fn record_sync_stats(&self, record: &SyncStatsRecord) -> CoreResult<()>;

    /// Refresh a TLD's sync recency row.
    ///
    /// The first call for a TLD also records its first-sync time; subsequent
    /// calls keep it and increment the sync counter.
    async fn record_sync_metadata(
        &self,
        tld: &str,
        domain_count: u64,
        at: DateTime<Utc>,
    ) -> CoreResult<()>;

    /// List every TLD with stored domain data, sorted.
    async fn list_tlds(&self) -> CoreResult<Vec<String>>;

    /// Aggregate statistics for one TLD.
    ///
    /// # Returns
    /// * `Some(stats)` - the TLD has stored domains
    /// * `None` - no data for the TLD
    async fn tld_stats(&self, tld: &str) -> CoreResult<Option<TldStats>>;

    /// One page of a TLD's domains, sorted by domain label.
    ///
    /// Returns `None` when the TLD has no stored domains at all.
    async fn domains_page(
        &self,
        tld: &str,
        page: u64,
        page_size: u64,
    ) -> CoreResult<Option<DomainPage>>;

    /// Domains first seen inside `[start, end)`, newest first, paginated.
    ///
    /// `tld = None` searches every TLD partition.
    async fn newly_registered(
        &self,
        tld: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        page_size: u64,
    ) -> CoreResult<(u64, Vec<PersistedDomain>)>;

    /// Aggregate the sync-statistics log over the trailing window,
    /// by TLD (total changes descending) and by UTC calendar day.
    async fn sync_stats_summary(
        &self,
        days_back: i64,
        tld: Option<&str>,
    ) -> CoreResult<SyncStatsSummary>;

    /// Detect TLDs whose data may be incomplete.
    ///
    /// Stale: metadata row older than `now - max_gap_hours`. Never synced:
    /// stored domains but no metadata row. `tlds = None` checks all.
    async fn check_gaps(&self, tlds: Option<&[String]>, max_gap_hours: i64)
        -> CoreResult<GapReport>;
}
