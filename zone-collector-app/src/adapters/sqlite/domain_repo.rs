//! `DomainRepository` implementation for `SqliteStore`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};

use zone_collector_core::error::{CoreError, CoreResult};
use zone_collector_core::traits::DomainRepository;
use zone_collector_core::types::{
    DnsRecordSet, DomainMetadata, DomainPage, DomainRecord, GapReport, PersistedDomain, StaleTld,
    SyncMetadata, SyncStatsRecord, SyncStatsSummary, TldStats, UpsertOutcome, total_pages,
};

use super::SqliteStore;
use super::entity::{domain, sync_metadata, sync_stats};

/// Source tag written into every domain's provenance metadata.
const SOURCE_TAG: &str = "icann_czds";

/// Fixed-width RFC 3339 so lexicographic order matches chronological order.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(value: &str, field: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

fn parse_values(value: &str, field: &str) -> CoreResult<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field} JSON: {e}")))
}

fn values_to_json(values: &[String]) -> CoreResult<String> {
    serde_json::to_string(values).map_err(|e| CoreError::SerializationError(e.to_string()))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl domain::Model {
    /// Convert a `SeaORM` row model into a `PersistedDomain`.
    fn into_persisted(self) -> CoreResult<PersistedDomain> {
        let dns_records = DnsRecordSet {
            ns: parse_values(&self.ns, "ns")?,
            a: parse_values(&self.a, "a")?,
            aaaa: parse_values(&self.aaaa, "aaaa")?,
            ds: parse_values(&self.ds, "ds")?,
        };
        let first_seen = parse_datetime(&self.first_seen, "first_seen")?;
        let last_seen = parse_datetime(&self.last_seen, "last_seen")?;
        let zone_file_date = parse_datetime(&self.zone_file_date, "zone_file_date")?;

        Ok(PersistedDomain {
            domain: self.domain,
            fqdn: self.fqdn,
            tld: self.tld,
            first_seen,
            last_seen,
            dns_records,
            metadata: DomainMetadata {
                source: self.source,
                zone_file_date,
            },
        })
    }
}

/// Convert one parsed domain into a `SeaORM` active model for upsert.
fn domain_to_active_model(
    tld: &str,
    name: &str,
    record: &DomainRecord,
    observed: &str,
) -> CoreResult<domain::ActiveModel> {
    Ok(domain::ActiveModel {
        tld: Set(tld.to_string()),
        domain: Set(name.to_string()),
        fqdn: Set(format!("{name}.{tld}")),
        first_seen: Set(observed.to_string()),
        last_seen: Set(observed.to_string()),
        ns: Set(values_to_json(&record.records.ns)?),
        a: Set(values_to_json(&record.records.a)?),
        aaaa: Set(values_to_json(&record.records.aaaa)?),
        ds: Set(values_to_json(&record.records.ds)?),
        source: Set(SOURCE_TAG.to_string()),
        zone_file_date: Set(observed.to_string()),
    })
}

impl SqliteStore {
    /// Upsert one batch of domains and compute the inserted/updated split.
    ///
    /// `first_seen` and `fqdn` are written only on insert; the conflict
    /// clause refreshes the mutable columns, so the invariant
    /// `first_seen <= last_seen` holds across re-syncs.
    async fn upsert_domain_batch(
        &self,
        tld: &str,
        batch: &[(&String, &DomainRecord)],
        observed: &str,
    ) -> CoreResult<UpsertOutcome> {
        let names: Vec<&str> = batch.iter().map(|(name, _)| name.as_str()).collect();

        let existing: HashSet<String> = domain::Entity::find()
            .select_only()
            .column(domain::Column::Domain)
            .filter(domain::Column::Tld.eq(tld))
            .filter(domain::Column::Domain.is_in(names.iter().copied()))
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query existing domains: {e}")))?
            .into_iter()
            .collect();

        let mut models = Vec::with_capacity(batch.len());
        for (name, record) in batch {
            models.push(domain_to_active_model(tld, name, record, observed)?);
        }

        domain::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([domain::Column::Tld, domain::Column::Domain])
                    .update_columns([
                        domain::Column::LastSeen,
                        domain::Column::Ns,
                        domain::Column::A,
                        domain::Column::Aaaa,
                        domain::Column::Ds,
                        domain::Column::Source,
                        domain::Column::ZoneFileDate,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to upsert domains: {e}")))?;

        let updated = batch
            .iter()
            .filter(|(name, _)| existing.contains(name.as_str()))
            .count() as u64;

        Ok(UpsertOutcome {
            inserted: batch.len() as u64 - updated,
            updated,
            failed: 0,
        })
    }

    /// Load one TLD's sync recency row (health and diagnostics aid).
    pub async fn sync_metadata(&self, tld: &str) -> CoreResult<Option<SyncMetadata>> {
        let row = sync_metadata::Entity::find_by_id(tld.to_string())
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to load sync metadata: {e}")))?;

        row.map(|row| {
            Ok(SyncMetadata {
                last_sync: parse_datetime(&row.last_sync, "last_sync")?,
                first_sync: parse_datetime(&row.first_sync, "first_sync")?,
                tld: row.tld,
                domain_count: to_u64(row.domain_count),
                sync_count: to_u64(row.sync_count),
            })
        })
        .transpose()
    }
}

#[async_trait]
impl DomainRepository for SqliteStore {
    async fn upsert_domains(
        &self,
        tld: &str,
        domains: &HashMap<String, DomainRecord>,
        observed_at: DateTime<Utc>,
    ) -> CoreResult<UpsertOutcome> {
        if domains.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let observed = format_datetime(observed_at);
        let entries: Vec<(&String, &DomainRecord)> = domains.iter().collect();
        let mut outcome = UpsertOutcome::default();

        for batch in entries.chunks(self.upsert_batch_size) {
            match self.upsert_domain_batch(tld, batch, &observed).await {
                Ok(batch_outcome) => outcome.absorb(batch_outcome),
                Err(e) => {
                    // Batches are independent; later batches still run and
                    // the dropped ones surface through `failed`.
                    log::warn!("TLD {tld}: batch of {} domains not persisted: {e}", batch.len());
                    outcome.failed += batch.len() as u64;
                }
            }
        }

        log::info!(
            "TLD {tld}: Inserted {}, Updated {} domains",
            outcome.inserted,
            outcome.updated
        );
        Ok(outcome)
    }

    async fn record_sync_stats(&self, record: &SyncStatsRecord) -> CoreResult<()> {
        let model = sync_stats::ActiveModel {
            id: NotSet,
            tld: Set(record.tld.clone()),
            inserted: Set(to_i64(record.inserted)),
            updated: Set(to_i64(record.updated)),
            total_changes: Set(to_i64(record.total_changes())),
            sync_time: Set(format_datetime(record.sync_time)),
        };

        sync_stats::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to save sync stats: {e}")))?;

        log::info!(
            "Saved sync stats for {}: inserted={}, updated={}",
            record.tld,
            record.inserted,
            record.updated
        );
        Ok(())
    }

    async fn record_sync_metadata(
        &self,
        tld: &str,
        domain_count: u64,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let existing = sync_metadata::Entity::find_by_id(tld.to_string())
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to load sync metadata: {e}")))?;

        match existing {
            Some(row) => {
                let model = sync_metadata::ActiveModel {
                    tld: Set(tld.to_string()),
                    last_sync: Set(format_datetime(at)),
                    domain_count: Set(to_i64(domain_count)),
                    sync_count: Set(row.sync_count + 1),
                    // first_sync is write-once.
                    first_sync: Set(row.first_sync),
                };
                sync_metadata::Entity::update(model)
                    .exec(&self.db)
                    .await
                    .map_err(|e| {
                        CoreError::StorageError(format!("Failed to update sync metadata: {e}"))
                    })?;
            }
            None => {
                let model = sync_metadata::ActiveModel {
                    tld: Set(tld.to_string()),
                    last_sync: Set(format_datetime(at)),
                    domain_count: Set(to_i64(domain_count)),
                    sync_count: Set(1),
                    first_sync: Set(format_datetime(at)),
                };
                sync_metadata::Entity::insert(model)
                    .exec_without_returning(&self.db)
                    .await
                    .map_err(|e| {
                        CoreError::StorageError(format!("Failed to insert sync metadata: {e}"))
                    })?;
            }
        }

        Ok(())
    }

    async fn list_tlds(&self) -> CoreResult<Vec<String>> {
        domain::Entity::find()
            .select_only()
            .column(domain::Column::Tld)
            .distinct()
            .order_by_asc(domain::Column::Tld)
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to list TLDs: {e}")))
    }

    async fn tld_stats(&self, tld: &str) -> CoreResult<Option<TldStats>> {
        let total = domain::Entity::find()
            .filter(domain::Column::Tld.eq(tld))
            .count(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to count domains: {e}")))?;

        if total == 0 {
            return Ok(None);
        }

        #[derive(FromQueryResult)]
        struct DateBounds {
            earliest_first_seen: Option<String>,
            latest_first_seen: Option<String>,
            latest_last_seen: Option<String>,
        }

        let bounds = domain::Entity::find()
            .select_only()
            .expr_as(domain::Column::FirstSeen.min(), "earliest_first_seen")
            .expr_as(domain::Column::FirstSeen.max(), "latest_first_seen")
            .expr_as(domain::Column::LastSeen.max(), "latest_last_seen")
            .filter(domain::Column::Tld.eq(tld))
            .into_model::<DateBounds>()
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query date bounds: {e}")))?;

        let (earliest_first_seen, latest_first_seen, latest_last_seen) = match bounds {
            Some(bounds) => (
                bounds
                    .earliest_first_seen
                    .map(|s| parse_datetime(&s, "first_seen"))
                    .transpose()?,
                bounds
                    .latest_first_seen
                    .map(|s| parse_datetime(&s, "first_seen"))
                    .transpose()?,
                bounds
                    .latest_last_seen
                    .map(|s| parse_datetime(&s, "last_seen"))
                    .transpose()?,
            ),
            None => (None, None, None),
        };

        Ok(Some(TldStats {
            tld: tld.to_string(),
            total_domains: total,
            earliest_first_seen,
            latest_first_seen,
            latest_last_seen,
        }))
    }

    async fn domains_page(
        &self,
        tld: &str,
        page: u64,
        page_size: u64,
    ) -> CoreResult<Option<DomainPage>> {
        let total = domain::Entity::find()
            .filter(domain::Column::Tld.eq(tld))
            .count(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to count domains: {e}")))?;

        if total == 0 {
            return Ok(None);
        }

        let rows = domain::Entity::find()
            .filter(domain::Column::Tld.eq(tld))
            .order_by_asc(domain::Column::Domain)
            .offset(page.saturating_sub(1) * page_size)
            .limit(page_size)
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query domains: {e}")))?;

        let domains = rows
            .into_iter()
            .map(domain::Model::into_persisted)
            .collect::<CoreResult<Vec<_>>>()?;

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
        let mut query = domain::Entity::find()
            .filter(domain::Column::FirstSeen.gte(format_datetime(start)))
            .filter(domain::Column::FirstSeen.lt(format_datetime(end)));
        if let Some(tld) = tld {
            query = query.filter(domain::Column::Tld.eq(tld));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to count domains: {e}")))?;

        let rows = query
            .order_by_desc(domain::Column::FirstSeen)
            .offset(page.saturating_sub(1) * page_size)
            .limit(page_size)
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query domains: {e}")))?;

        let domains = rows
            .into_iter()
            .map(domain::Model::into_persisted)
            .collect::<CoreResult<Vec<_>>>()?;

        Ok((total, domains))
    }

    async fn sync_stats_summary(
        &self,
        days_back: i64,
        tld: Option<&str>,
    ) -> CoreResult<SyncStatsSummary> {
        let cutoff = Utc::now() - chrono::Duration::days(days_back);

        let mut query = sync_stats::Entity::find()
            .filter(sync_stats::Column::SyncTime.gte(format_datetime(cutoff)));
        if let Some(tld) = tld {
            query = query.filter(sync_stats::Column::Tld.eq(tld));
        }

        let rows = query
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query sync stats: {e}")))?;

        let records = rows
            .into_iter()
            .map(|row| {
                Ok(SyncStatsRecord {
                    sync_time: parse_datetime(&row.sync_time, "sync_time")?,
                    tld: row.tld,
                    inserted: to_u64(row.inserted),
                    updated: to_u64(row.updated),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(SyncStatsSummary::aggregate(days_back, tld, &records))
    }

    async fn check_gaps(
        &self,
        tlds: Option<&[String]>,
        max_gap_hours: i64,
    ) -> CoreResult<GapReport> {
        let cutoff = Utc::now() - chrono::Duration::hours(max_gap_hours);
        let now = Utc::now();

        let rows = sync_metadata::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query sync metadata: {e}")))?;

        let mut synced: HashSet<String> = HashSet::with_capacity(rows.len());
        let mut stale_tlds = Vec::new();

        for row in rows {
            synced.insert(row.tld.clone());
            if tlds.is_some_and(|list| !list.contains(&row.tld)) {
                continue;
            }
            let last_sync = parse_datetime(&row.last_sync, "last_sync")?;
            if last_sync < cutoff {
                stale_tlds.push(StaleTld {
                    tld: row.tld,
                    last_sync,
                    hours_since_sync: (now - last_sync).num_hours(),
                });
            }
        }
        stale_tlds.sort_by(|a, b| a.tld.cmp(&b.tld));

        let never_synced_tlds: Vec<String> = self
            .list_tlds()
            .await?
            .into_iter()
            .filter(|tld| tlds.is_none_or(|list| list.contains(tld)))
            .filter(|tld| !synced.contains(tld))
            .collect();

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
