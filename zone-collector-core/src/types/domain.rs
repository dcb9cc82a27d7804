//! Domain record type definitions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DNS record types tracked per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Ns,
    A,
    Aaaa,
    Ds,
}

impl RecordType {
    /// Parse a lowercased zone file type token.
    ///
    /// Types outside the tracked set return `None` and are ignored by the parser.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ns" => Some(Self::Ns),
            "a" => Some(Self::A),
            "aaaa" => Some(Self::Aaaa),
            "ds" => Some(Self::Ds),
            _ => None,
        }
    }
}

/// Per-domain DNS record values, grouped by type.
///
/// Value lists preserve insertion order and silently drop duplicates.
/// Absent record types are empty lists, never missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ns: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub a: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aaaa: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ds: Vec<String>,
}

impl DnsRecordSet {
    /// Append a record value, deduplicating within its type.
    ///
    /// NS values have their trailing dot(s) stripped before insertion.
    pub fn add(&mut self, record_type: RecordType, value: &str) {
        let list = match record_type {
            RecordType::Ns => &mut self.ns,
            RecordType::A => &mut self.a,
            RecordType::Aaaa => &mut self.aaaa,
            RecordType::Ds => &mut self.ds,
        };

        let value = if record_type == RecordType::Ns {
            value.trim_end_matches('.')
        } else {
            value
        };

        if value.is_empty() {
            return;
        }
        if !list.iter().any(|v| v == value) {
            list.push(value.to_string());
        }
    }

    /// Whether no record of any type has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ns.is_empty() && self.a.is_empty() && self.aaaa.is_empty() && self.ds.is_empty()
    }
}

/// One second-level domain with its accumulated DNS records.
///
/// Transient parser output; persisted form is [`PersistedDomain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Domain label without the TLD suffix.
    pub domain: String,
    /// DNS records collected for the domain.
    #[serde(default)]
    pub records: DnsRecordSet,
}

impl DomainRecord {
    #[must_use]
    pub fn new(domain: String) -> Self {
        Self {
            domain,
            records: DnsRecordSet::default(),
        }
    }
}

/// A bounded batch of parsed domains.
///
/// Chunk key sets are disjoint across one parse; the union of all chunk keys
/// is the set of distinct second-level domains in the input.
#[derive(Debug, Clone)]
pub struct DomainChunk {
    /// Domain label → accumulated record, for this batch.
    pub domains: HashMap<String, DomainRecord>,
    /// Whether this is the terminal chunk of the parse.
    pub is_last: bool,
}

impl DomainChunk {
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Ingestion provenance stored with every domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMetadata {
    /// Which feed produced the record.
    pub source: String,
    /// Timestamp of the zone file the record came from.
    pub zone_file_date: DateTime<Utc>,
}

/// Durable form of one domain under one TLD.
///
/// `first_seen` is set exactly once at the first upsert and never overwritten;
/// `last_seen` advances on every upsert, so `first_seen <= last_seen` always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDomain {
    /// Domain label without the TLD suffix.
    pub domain: String,
    /// Fully qualified domain name (`<domain>.<tld>`).
    pub fqdn: String,
    /// TLD the domain is delegated under.
    pub tld: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub dns_records: DnsRecordSet,
    pub metadata: DomainMetadata,
}

/// Aggregate statistics for one TLD's stored domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TldStats {
    pub tld: String,
    pub total_domains: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_first_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_first_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_last_seen: Option<DateTime<Utc>>,
}

/// One page of stored domains, sorted by domain label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainPage {
    pub tld: String,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub domains: Vec<PersistedDomain>,
}

/// Echo of the parameters a newly-registered query resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewlyRegisteredParams {
    pub days_back: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Requested TLD, or `"all"`.
    pub tld: String,
}

/// One page of recently first-seen domains, newest first.
///
/// Carries the gap warning when any queried TLD is stale or never synced,
/// since missing domains are then weak evidence of non-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewlyRegisteredPage {
    pub search_params: NewlyRegisteredParams,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub domains: Vec<PersistedDomain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_gaps: Option<super::sync::GapReport>,
}

/// Compute the page count for a total at a given page size.
#[must_use]
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if total == 0 || page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_from_token() {
        assert_eq!(RecordType::from_token("ns"), Some(RecordType::Ns));
        assert_eq!(RecordType::from_token("a"), Some(RecordType::A));
        assert_eq!(RecordType::from_token("aaaa"), Some(RecordType::Aaaa));
        assert_eq!(RecordType::from_token("ds"), Some(RecordType::Ds));
        assert_eq!(RecordType::from_token("mx"), None);
        assert_eq!(RecordType::from_token("soa"), None);
    }

    #[test]
    fn record_set_preserves_insertion_order() {
        let mut set = DnsRecordSet::default();
        set.add(RecordType::A, "65.22.232.33");
        set.add(RecordType::A, "10.0.0.1");
        set.add(RecordType::A, "65.22.232.33");
        assert_eq!(set.a, vec!["65.22.232.33", "10.0.0.1"]);
    }

    #[test]
    fn record_set_strips_ns_trailing_dot() {
        let mut set = DnsRecordSet::default();
        set.add(RecordType::Ns, "a1-253.akam.net.");
        assert_eq!(set.ns, vec!["a1-253.akam.net"]);
    }

    #[test]
    fn record_set_dedups_after_ns_normalization() {
        let mut set = DnsRecordSet::default();
        set.add(RecordType::Ns, "ns1.example.net.");
        set.add(RecordType::Ns, "ns1.example.net");
        assert_eq!(set.ns.len(), 1);
    }

    #[test]
    fn record_set_ignores_empty_values() {
        let mut set = DnsRecordSet::default();
        set.add(RecordType::A, "");
        set.add(RecordType::Ns, ".");
        assert!(set.is_empty());
    }

    #[test]
    fn record_set_keeps_ds_opaque() {
        let mut set = DnsRecordSet::default();
        set.add(RecordType::Ds, "12345 8 2 ABCDEF0123");
        set.add(RecordType::Ds, "12345 8 2 ABCDEF0123");
        assert_eq!(set.ds, vec!["12345 8 2 ABCDEF0123"]);
    }

    #[test]
    fn empty_record_lists_not_serialized() {
        let mut record = DomainRecord::new("go".to_string());
        record.records.add(RecordType::Ns, "a1.nic.example.");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"ns\""));
        assert!(!json.contains("\"aaaa\""));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 100), 0);
        assert_eq!(total_pages(1, 100), 1);
        assert_eq!(total_pages(100, 100), 1);
        assert_eq!(total_pages(101, 100), 2);
    }
}
