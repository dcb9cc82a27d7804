//! Test helper module.
//!
//! Provides mock implementations and convenient test factory methods.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use zone_collector_czds::{CzdsError, ZoneFeed, tld_from_url};

use crate::error::{CoreError, CoreResult};
use crate::traits::DomainRepository;
use crate::types::{
    DomainMetadata, DomainPage, DomainRecord, GapReport, PersistedDomain, StaleTld, SyncMetadata,
    SyncStatsRecord, SyncStatsSummary, TldStats, UpsertOutcome, total_pages,
};

// ===== fixtures =====

/// Write a plain-text zone fixture to the OS temp dir and return its path.
pub fn write_zone_fixture(tld: &str, lines: &[&str]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "zone-collector-fixture-{tld}-{}.txt",
        uuid::Uuid::new_v4().simple()
    ));
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

// ===== MockZoneFeed =====

enum ZoneBehavior {
    /// Serve a copy of this fixture file.
    Fixture(PathBuf),
    /// Pretend the zone does not exist (download returns `None`).
    Missing,
    /// Fail the download with a network error.
    Fail(String),
}

/// Scripted [`ZoneFeed`] for orchestrator tests.
///
/// Each download serves a fresh copy of the fixture so the orchestrator's
/// artifact cleanup never consumes the fixture itself.
pub struct MockZoneFeed {
    zones: Mutex<Vec<(String, ZoneBehavior)>>,
    links_error: Mutex<Option<String>>,
    links_delay: Mutex<Option<Duration>>,
    downloaded: Mutex<Vec<PathBuf>>,
}

impl MockZoneFeed {
    pub fn new() -> Self {
        Self {
            zones: Mutex::new(Vec::new()),
            links_error: Mutex::new(None),
            links_delay: Mutex::new(None),
            downloaded: Mutex::new(Vec::new()),
        }
    }

    pub fn add_zone(&self, tld: &str, fixture: &Path) {
        self.zones
            .lock()
            .unwrap()
            .push((tld.to_string(), ZoneBehavior::Fixture(fixture.to_path_buf())));
    }

    pub fn add_missing_zone(&self, tld: &str) {
        self.zones
            .lock()
            .unwrap()
            .push((tld.to_string(), ZoneBehavior::Missing));
    }

    pub fn add_failing_zone(&self, tld: &str, detail: &str) {
        self.zones
            .lock()
            .unwrap()
            .push((tld.to_string(), ZoneBehavior::Fail(detail.to_string())));
    }

    /// Fail `zone_links` with this error.
    pub fn set_links_error(&self, detail: &str) {
        *self.links_error.lock().unwrap() = Some(detail.to_string());
    }

    /// Delay `zone_links` (to keep a run observably active).
    pub fn set_links_delay(&self, delay: Duration) {
        *self.links_delay.lock().unwrap() = Some(delay);
    }

    /// Paths of every artifact handed to the orchestrator.
    pub fn downloaded_paths(&self) -> Vec<PathBuf> {
        self.downloaded.lock().unwrap().clone()
    }
}

impl Default for MockZoneFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ZoneFeed for MockZoneFeed {
    async fn zone_links(&self) -> Result<Vec<String>, CzdsError> {
        let delay = *self.links_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(detail) = self.links_error.lock().unwrap().clone() {
            return Err(CzdsError::AuthenticationFailed {
                status: Some(401),
                detail,
            });
        }
        Ok(self
            .zones
            .lock()
            .unwrap()
            .iter()
            .map(|(tld, _)| format!("https://feed.test/czds/downloads/{tld}.zone"))
            .collect())
    }

    async fn download_zone_file(&self, url: &str) -> Result<Option<PathBuf>, CzdsError> {
        let tld = tld_from_url(url);
        let content = {
            let zones = self.zones.lock().unwrap();
            let Some((_, behavior)) = zones.iter().find(|(name, _)| *name == tld) else {
                return Ok(None);
            };
            match behavior {
                ZoneBehavior::Missing => return Ok(None),
                ZoneBehavior::Fail(detail) => {
                    return Err(CzdsError::NetworkError {
                        detail: detail.clone(),
                    });
                }
                ZoneBehavior::Fixture(path) => std::fs::read(path).map_err(|e| {
                    CzdsError::IoError {
                        detail: e.to_string(),
                    }
                })?,
            }
        };

        let artifact = std::env::temp_dir().join(format!(
            "zone-collector-download-{tld}-{}.txt",
            uuid::Uuid::new_v4().simple()
        ));
        tokio::fs::write(&artifact, content)
            .await
            .map_err(|e| CzdsError::IoError {
                detail: e.to_string(),
            })?;

        self.downloaded.lock().unwrap().push(artifact.clone());
        Ok(Some(artifact))
    }
}

// ===== MockDomainRepository =====

/// In-memory [`DomainRepository`] with injectable upsert failures.
pub struct MockDomainRepository {
    /// tld → (domain → record), ordered for stable pagination.
    domains: RwLock<HashMap<String, BTreeMap<String, PersistedDomain>>>,
    stats: RwLock<Vec<SyncStatsRecord>>,
    metadata: RwLock<HashMap<String, SyncMetadata>>,
    failing_tlds: RwLock<HashSet<String>>,
}

impl MockDomainRepository {
    pub fn new() -> Self {
        Self {
            domains: RwLock::new(HashMap::new()),
            stats: RwLock::new(Vec::new()),
            metadata: RwLock::new(HashMap::new()),
            failing_tlds: RwLock::new(HashSet::new()),
        }
    }

    /// Make every upsert for the TLD fail with a storage error.
    pub async fn fail_upserts_for(&self, tld: &str) {
        self.failing_tlds.write().await.insert(tld.to_string());
    }

    pub async fn stats_records(&self) -> Vec<SyncStatsRecord> {
        self.stats.read().await.clone()
    }

    pub async fn metadata_for(&self, tld: &str) -> Option<SyncMetadata> {
        self.metadata.read().await.get(tld).cloned()
    }

    pub async fn domain(&self, tld: &str, name: &str) -> Option<PersistedDomain> {
        self.domains
            .read()
            .await
            .get(tld)
            .and_then(|partition| partition.get(name))
            .cloned()
    }

    /// Seed a metadata row directly (for gap tests).
    pub async fn seed_metadata(&self, metadata: SyncMetadata) {
        self.metadata
            .write()
            .await
            .insert(metadata.tld.clone(), metadata);
    }
}

impl Default for MockDomainRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DomainRepository for MockDomainRepository {
    async fn upsert_domains(
        &self,
        tld: &str,
        domains: &HashMap<String, DomainRecord>,
        observed_at: DateTime<Utc>,
    ) -> CoreResult<UpsertOutcome> {
        if self.failing_tlds.read().await.contains(tld) {
            return Err(CoreError::StorageError(
                "injected storage failure".to_string(),
            ));
        }

        let mut store = self.domains.write().await;
        let partition = store.entry(tld.to_string()).or_default();
        let mut outcome = UpsertOutcome::default();

        for (name, record) in domains {
            if let Some(existing) = partition.get_mut(name) {
                existing.last_seen = observed_at;
                existing.dns_records = record.records.clone();
                existing.metadata.zone_file_date = observed_at;
                outcome.updated += 1;
            } else {
                partition.insert(
                    name.clone(),
                    PersistedDomain {
                        domain: name.clone(),
                        fqdn: format!("{name}.{tld}"),
                        tld: tld.to_string(),
                        first_seen: observed_at,
                        last_seen: observed_at,
                        dns_records: record.records.clone(),
                        metadata: DomainMetadata {
                            source: "icann_czds".to_string(),
                            zone_file_date: observed_at,
                        },
                    },
                );
                outcome.inserted += 1;
            }
        }

        Ok(outcome)
    }

    async fn record_sync_stats(&self, record: &SyncStatsRecord) -> CoreResult<()> {
        self.stats.write().await.push(record.clone());
        Ok(())
    }

    async fn record_sync_metadata(
        &self,
        tld: &str,
        domain_count: u64,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut metadata = self.metadata.write().await;
        match metadata.get_mut(tld) {
            Some(row) => {
                row.last_sync = at;
                row.domain_count = domain_count;
                row.sync_count += 1;
            }
            None => {
                metadata.insert(
                    tld.to_string(),
                    SyncMetadata {
                        tld: tld.to_string(),
                        last_sync: at,
                        domain_count,
                        sync_count: 1,
                        first_sync: at,
                    },
                );
            }
        }
        Ok(())
    }

    async fn list_tlds(&self) -> CoreResult<Vec<String>> {
        let store = self.domains.read().await;
        let mut tlds: Vec<String> = store
            .iter()
            .filter(|(_, partition)| !partition.is_empty())
            .map(|(tld, _)| tld.clone())
            .collect();
        tlds.sort();
        Ok(tlds)
    }

    async fn tld_stats(&self, tld: &str) -> CoreResult<Option<TldStats>> {
        let store = self.domains.read().await;
        let Some(partition) = store.get(tld).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        Ok(Some(TldStats {
            tld: tld.to_string(),
            total_domains: partition.len() as u64,
            earliest_first_seen: partition.values().map(|d| d.first_seen).min(),
            latest_first_seen: partition.values().map(|d| d.first_seen).max(),
            latest_last_seen: partition.values().map(|d| d.last_seen).max(),
        }))
    }

    async fn domains_page(
        &self,
        tld: &str,
        page: u64,
        page_size: u64,
    ) -> CoreResult<Option<DomainPage>> {
        let store = self.domains.read().await;
        let Some(partition) = store.get(tld).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        let total = partition.len() as u64;
        let skip = (page.saturating_sub(1) * page_size) as usize;
        let domains = partition
            .values()
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect();
        Ok(Some(DomainPage {
            tld: tld.to_string(),
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
            domains,
        }))
    }

    async fn newly_registered(
        &self,
        tld: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        page_size: u64,
    ) -> CoreResult<(u64, Vec<PersistedDomain>)> {
        let store = self.domains.read().await;
        let mut matches: Vec<PersistedDomain> = store
            .iter()
            .filter(|(partition_tld, _)| tld.is_none_or(|t| t == partition_tld.as_str()))
            .flat_map(|(_, partition)| partition.values())
            .filter(|d| d.first_seen >= start && d.first_seen < end)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.first_seen.cmp(&a.first_seen));

        let total = matches.len() as u64;
        let skip = (page.saturating_sub(1) * page_size) as usize;
        let domains = matches
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect();
        Ok((total, domains))
    }

    async fn sync_stats_summary(
        &self,
        days_back: i64,
        tld: Option<&str>,
    ) -> CoreResult<SyncStatsSummary> {
        let cutoff = Utc::now() - chrono::Duration::days(days_back);
        let stats = self.stats.read().await;
        let window: Vec<SyncStatsRecord> = stats
            .iter()
            .filter(|r| r.sync_time >= cutoff)
            .filter(|r| tld.is_none_or(|t| t == r.tld))
            .cloned()
            .collect();
        Ok(SyncStatsSummary::aggregate(days_back, tld, &window))
    }

    async fn check_gaps(
        &self,
        tlds: Option<&[String]>,
        max_gap_hours: i64,
    ) -> CoreResult<GapReport> {
        let cutoff = Utc::now() - chrono::Duration::hours(max_gap_hours);
        let metadata = self.metadata.read().await;
        let now = Utc::now();

        let mut stale_tlds: Vec<StaleTld> = metadata
            .values()
            .filter(|m| tlds.is_none_or(|list| list.contains(&m.tld)))
            .filter(|m| m.last_sync < cutoff)
            .map(|m| StaleTld {
                tld: m.tld.clone(),
                last_sync: m.last_sync,
                hours_since_sync: (now - m.last_sync).num_hours(),
            })
            .collect();
        stale_tlds.sort_by(|a, b| a.tld.cmp(&b.tld));

        let store = self.domains.read().await;
        let mut never_synced_tlds: Vec<String> = store
            .iter()
            .filter(|(_, partition)| !partition.is_empty())
            .map(|(tld, _)| tld.clone())
            .filter(|tld| tlds.is_none_or(|list| list.contains(tld)))
            .filter(|tld| !metadata.contains_key(tld))
            .collect();
        never_synced_tlds.sort();

        let has_gaps = !stale_tlds.is_empty() || !never_synced_tlds.is_empty();
        Ok(GapReport {
            has_gaps,
            max_gap_hours,
            stale_tlds,
            never_synced_tlds,
            warning: has_gaps
                .then(|| "Data may contain false positives for TLDs with gaps".to_string()),
        })
    }
}
