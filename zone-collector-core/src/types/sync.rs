//! Sync run and sync bookkeeping type definitions

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a sync run.
///
/// `Running` transitions to exactly one of the terminal states:
/// `Completed` (all per-TLD steps attempted, individual failures recorded)
/// or `Error` (a run-level precondition failed before any per-TLD work).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Running,
    Completed,
    Error,
}

impl SyncState {
    /// Whether the run can no longer change.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// One invocation of the sync orchestrator.
///
/// Mutable fields are only written by tasks belonging to the run, under the
/// run's lock; status reads are snapshots. Runs live in memory only and are
/// lost on process termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    /// Opaque unique token assigned at start.
    pub id: String,
    pub state: SyncState,
    /// Human-readable progress/summary message.
    pub message: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Successfully processed TLDs.
    pub tlds_processed: u64,
    /// Domains seen across successfully processed TLDs.
    pub domains_processed: u64,
    /// One entry per failed TLD or fatal condition, in append order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SyncRun {
    #[must_use]
    pub fn new(id: String) -> Self {
        Self {
            id,
            state: SyncState::Running,
            message: "Starting sync...".to_string(),
            started_at: Utc::now(),
            completed_at: None,
            tlds_processed: 0,
            domains_processed: 0,
            errors: Vec::new(),
        }
    }
}

/// Result of one `upsert_domains` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    /// Domains inserted for the first time.
    pub inserted: u64,
    /// Domains that already existed and were refreshed.
    pub updated: u64,
    /// Domains in batches whose write failed; not reflected in the other counts.
    pub failed: u64,
}

impl UpsertOutcome {
    /// Fold another outcome into this one.
    pub fn absorb(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.failed += other.failed;
    }
}

/// Append-only historical fact: one completed per-TLD processing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsRecord {
    pub tld: String,
    pub inserted: u64,
    pub updated: u64,
    pub sync_time: DateTime<Utc>,
}

impl SyncStatsRecord {
    #[must_use]
    pub fn total_changes(&self) -> u64 {
        self.inserted + self.updated
    }
}

/// Per-TLD sync recency row, driving gap detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub tld: String,
    pub last_sync: DateTime<Utc>,
    pub domain_count: u64,
    pub sync_count: u64,
    /// Set on the first sync of the TLD, never overwritten.
    pub first_sync: DateTime<Utc>,
}

/// A TLD whose data may be outdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleTld {
    pub tld: String,
    pub last_sync: DateTime<Utc>,
    pub hours_since_sync: i64,
}

/// Result of a sync gap check.
///
/// A stale or never-synced TLD means the absence of a domain in storage is
/// weak evidence of non-registration, so "newly registered" results carry a
/// false-positive risk for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapReport {
    pub has_gaps: bool,
    pub max_gap_hours: i64,
    pub stale_tlds: Vec<StaleTld>,
    /// TLDs with stored domains but no sync metadata row at all.
    pub never_synced_tlds: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Grand totals of a sync-stats summary window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsTotals {
    pub total_inserted: u64,
    pub total_updated: u64,
    pub total_changes: u64,
    pub tld_count: u64,
}

/// Per-TLD aggregation of sync stats over a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TldSyncStats {
    pub tld: String,
    pub total_inserted: u64,
    pub total_updated: u64,
    pub total_changes: u64,
    pub sync_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_sync: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

/// Per-calendar-day aggregation of sync stats over a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySyncStats {
    /// UTC day in `YYYY-MM-DD` form.
    pub date: String,
    pub inserted: u64,
    pub updated: u64,
    pub total_changes: u64,
}

/// Aggregated sync statistics, by TLD and by day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsSummary {
    pub days_back: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld_filter: Option<String>,
    pub summary: SyncStatsTotals,
    pub by_tld: Vec<TldSyncStats>,
    pub by_date: Vec<DailySyncStats>,
}

impl SyncStatsSummary {
    /// Aggregate an already-windowed slice of stats records by TLD
    /// (total changes descending) and by UTC calendar day (newest first).
    #[must_use]
    pub fn aggregate(
        days_back: i64,
        tld_filter: Option<&str>,
        records: &[SyncStatsRecord],
    ) -> Self {
        let mut by_tld: HashMap<String, TldSyncStats> = HashMap::new();
        let mut by_date: BTreeMap<String, DailySyncStats> = BTreeMap::new();
        let mut totals = SyncStatsTotals::default();

        for record in records {
            totals.total_inserted += record.inserted;
            totals.total_updated += record.updated;

            let entry = by_tld
                .entry(record.tld.clone())
                .or_insert_with(|| TldSyncStats {
                    tld: record.tld.clone(),
                    total_inserted: 0,
                    total_updated: 0,
                    total_changes: 0,
                    sync_count: 0,
                    first_sync: None,
                    last_sync: None,
                });
            entry.total_inserted += record.inserted;
            entry.total_updated += record.updated;
            entry.total_changes += record.total_changes();
            entry.sync_count += 1;
            entry.first_sync = Some(
                entry
                    .first_sync
                    .map_or(record.sync_time, |t| t.min(record.sync_time)),
            );
            entry.last_sync = Some(
                entry
                    .last_sync
                    .map_or(record.sync_time, |t| t.max(record.sync_time)),
            );

            let day = record.sync_time.format("%Y-%m-%d").to_string();
            let daily = by_date
                .entry(day.clone())
                .or_insert_with(|| DailySyncStats {
                    date: day,
                    inserted: 0,
                    updated: 0,
                    total_changes: 0,
                });
            daily.inserted += record.inserted;
            daily.updated += record.updated;
            daily.total_changes += record.total_changes();
        }

        totals.total_changes = totals.total_inserted + totals.total_updated;
        totals.tld_count = by_tld.len() as u64;

        let mut by_tld: Vec<TldSyncStats> = by_tld.into_values().collect();
        by_tld.sort_by(|a, b| b.total_changes.cmp(&a.total_changes));

        Self {
            days_back,
            tld_filter: tld_filter.map(str::to_string),
            summary: totals,
            by_tld,
            by_date: by_date.into_values().rev().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_starts_running() {
        let run = SyncRun::new("abc123".to_string());
        assert_eq!(run.state, SyncState::Running);
        assert!(run.completed_at.is_none());
        assert!(run.errors.is_empty());
        assert_eq!(run.tlds_processed, 0);
    }

    #[test]
    fn terminal_states() {
        assert!(!SyncState::Running.is_terminal());
        assert!(SyncState::Completed.is_terminal());
        assert!(SyncState::Error.is_terminal());
    }

    #[test]
    fn sync_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SyncState::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn upsert_outcome_absorb() {
        let mut total = UpsertOutcome::default();
        total.absorb(UpsertOutcome {
            inserted: 3,
            updated: 2,
            failed: 0,
        });
        total.absorb(UpsertOutcome {
            inserted: 1,
            updated: 4,
            failed: 5,
        });
        assert_eq!(total.inserted, 4);
        assert_eq!(total.updated, 6);
        assert_eq!(total.failed, 5);
    }

    #[test]
    fn stats_record_total_changes() {
        let rec = SyncStatsRecord {
            tld: "example".to_string(),
            inserted: 7,
            updated: 3,
            sync_time: Utc::now(),
        };
        assert_eq!(rec.total_changes(), 10);
    }

    #[test]
    fn run_serde_roundtrip() {
        let mut run = SyncRun::new("deadbeef".to_string());
        run.errors.push("Failed to download shop".to_string());
        let json = serde_json::to_string(&run).unwrap();
        let back: SyncRun = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, run.id);
        assert_eq!(back.errors, run.errors);
    }
}
