//! Core type definitions

mod domain;
mod sync;
mod whois;

pub use domain::{
    DnsRecordSet, DomainChunk, DomainMetadata, DomainPage, DomainRecord, NewlyRegisteredPage,
    NewlyRegisteredParams, PersistedDomain, RecordType, TldStats, total_pages,
};
pub use sync::{
    DailySyncStats, GapReport, StaleTld, SyncMetadata, SyncRun, SyncState, SyncStatsRecord,
    SyncStatsSummary, SyncStatsTotals, TldSyncStats, UpsertOutcome,
};
pub use whois::WhoisInfo;
