//! Streaming BIND zone file parser.
//!
//! Zone files published through CZDS are line-oriented:
//!
//! ```text
//! ; comment
//! go.zara.        3600    in      ns      a1-253.akam.net.
//! a0.nic.zara.    3600    in      a       65.22.232.33
//! ```
//!
//! Inputs can reach tens of millions of lines, so the parser never builds
//! one map of the whole file. A blocking producer reads the (optionally
//! gzipped) stream line by line and accumulates domains into a bounded
//! chunk; full chunks are handed to the consumer through a small bounded
//! channel, which blocks the producer until the consumer has persisted the
//! previous chunk. Peak memory is O(chunk size) regardless of file size.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tokio::sync::mpsc;

use crate::error::{CoreError, CoreResult};
use crate::types::{DomainChunk, DomainRecord, RecordType};

/// Default number of distinct domains per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Unconsumed chunks buffered before the producer blocks.
const CHUNK_CHANNEL_CAPACITY: usize = 2;

/// Emit a progress log every this many input lines.
const PROGRESS_LOG_INTERVAL: u64 = 1_000_000;

/// Derive the TLD from a zone file name.
///
/// CZDS artifacts are named `<tld>.txt.gz` (or occasionally `.zone.gz`,
/// `.txt`, bare `.gz`).
#[must_use]
pub fn tld_from_zone_filename(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    for suffix in [".txt.gz", ".zone.gz", ".gz", ".txt"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    name.to_string()
}

/// Parser for one downloaded zone file.
pub struct ZoneParser {
    file_path: PathBuf,
    tld: String,
    chunk_size: usize,
}

impl ZoneParser {
    /// Create a parser for a file belonging to a known TLD.
    #[must_use]
    pub fn new(file_path: impl Into<PathBuf>, tld: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            tld: tld.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a parser deriving the TLD from the file name.
    #[must_use]
    pub fn from_path(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let tld = tld_from_zone_filename(&file_path);
        Self::new(file_path, tld)
    }

    /// Override the chunk size (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn tld(&self) -> &str {
        &self.tld
    }

    /// Start parsing on a blocking task and return the chunk stream.
    ///
    /// Must be called from within a tokio runtime. Chunks already yielded
    /// stay valid if a later read fails; the failure arrives as the final
    /// `Err` item.
    #[must_use]
    pub fn parse(self) -> ChunkStream {
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        tokio::task::spawn_blocking(move || self.run_blocking(&tx));
        ChunkStream { rx }
    }

    fn open_reader(&self) -> std::io::Result<Box<dyn BufRead + Send>> {
        let file = File::open(&self.file_path)?;
        let is_gzip = self
            .file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        if is_gzip {
            Ok(Box::new(BufReader::new(GzDecoder::new(BufReader::new(
                file,
            )))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }

    fn run_blocking(self, tx: &mpsc::Sender<CoreResult<DomainChunk>>) {
        let reader = match self.open_reader() {
            Ok(reader) => reader,
            Err(e) => {
                let _ = tx.blocking_send(Err(CoreError::ParseError(format!(
                    "Error reading file {}: {e}",
                    self.file_path.display()
                ))));
                return;
            }
        };

        let tld_lower = self.tld.to_lowercase();
        let apex = format!("{tld_lower}.");
        let tld_suffix = format!(".{tld_lower}.");

        let mut current: HashMap<String, DomainRecord> = HashMap::new();
        let mut flushed: HashSet<String> = HashSet::new();
        let mut line_count: u64 = 0;

        for line_result in reader.lines() {
            let line = match line_result {
                Ok(line) => line,
                Err(e) => {
                    let _ = tx.blocking_send(Err(CoreError::ParseError(format!(
                        "Error reading file {}: {e}",
                        self.file_path.display()
                    ))));
                    return;
                }
            };

            line_count += 1;
            if line_count % PROGRESS_LOG_INTERVAL == 0 {
                log::info!(
                    "Processed {line_count} lines, found {} unique domains",
                    flushed.len() + current.len()
                );
            }

            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                continue;
            }

            let owner = fields[0].to_lowercase();

            // Zone apex records describe the TLD itself, not a delegation.
            if owner == apex || owner == tld_lower {
                continue;
            }

            let Some(label) = owner.strip_suffix(&tld_suffix) else {
                continue;
            };
            // Only direct second-level delegations; deeper owners are skipped.
            if label.is_empty() || label.contains('.') {
                continue;
            }
            // Later records for an already-flushed domain are dropped; key
            // sets stay disjoint across chunks.
            if flushed.contains(label) {
                continue;
            }

            // Flush before admitting a new domain past capacity, so one
            // domain's contiguous records never straddle a chunk boundary.
            if current.len() >= self.chunk_size && !current.contains_key(label) {
                flushed.extend(current.keys().cloned());
                let chunk = DomainChunk {
                    domains: std::mem::take(&mut current),
                    is_last: false,
                };
                if tx.blocking_send(Ok(chunk)).is_err() {
                    // Consumer went away; stop reading.
                    return;
                }
            }

            let record = current
                .entry(label.to_string())
                .or_insert_with(|| DomainRecord::new(label.to_string()));

            if let Some(record_type) = RecordType::from_token(&fields[3].to_lowercase()) {
                let value = match record_type {
                    // DS rdata is kept whole as one opaque value.
                    RecordType::Ds => fields[4..].join(" "),
                    _ => (*fields.get(4).unwrap_or(&"")).to_string(),
                };
                record.records.add(record_type, &value);
            }
        }

        log::info!(
            "Parsed {}: {line_count} lines, {} unique domains",
            self.file_path.display(),
            flushed.len() + current.len()
        );

        let _ = tx.blocking_send(Ok(DomainChunk {
            domains: current,
            is_last: true,
        }));
    }
}

/// Consumer side of a running parse.
pub struct ChunkStream {
    rx: mpsc::Receiver<CoreResult<DomainChunk>>,
}

impl ChunkStream {
    /// Receive the next chunk.
    ///
    /// `None` after the terminal chunk (or after an `Err` item).
    pub async fn next_chunk(&mut self) -> Option<CoreResult<DomainChunk>> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use super::*;

    fn write_zone(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.txt");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn write_zone_gz(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.txt.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        (dir, path)
    }

    async fn collect_chunks(parser: ZoneParser) -> Vec<DomainChunk> {
        let mut stream = parser.parse();
        let mut chunks = Vec::new();
        while let Some(item) = stream.next_chunk().await {
            chunks.push(item.unwrap());
        }
        chunks
    }

    async fn parse_merged(parser: ZoneParser) -> HashMap<String, DomainRecord> {
        let mut merged = HashMap::new();
        for chunk in collect_chunks(parser).await {
            for (name, record) in chunk.domains {
                assert!(
                    merged.insert(name, record).is_none(),
                    "domain emitted in two chunks"
                );
            }
        }
        merged
    }

    #[tokio::test]
    async fn parses_ns_record_and_strips_trailing_dot() {
        let (_dir, path) =
            write_zone("go.example.        3600    in      ns      a1.nic.example.\n");
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["go"].records.ns, vec!["a1.nic.example"]);
    }

    #[tokio::test]
    async fn skips_deeper_subdomains() {
        let (_dir, path) = write_zone(concat!(
            "go.example. 3600 in ns a1.nic.example.\n",
            "www.go.example. 3600 in a 65.22.232.33\n",
        ));
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("go"));
    }

    #[tokio::test]
    async fn skips_zone_apex() {
        let (_dir, path) = write_zone(concat!(
            "example. 900 in soa ns.example. admin.example. 1 2 3 4 5\n",
            "example. 3600 in ns a.nic.example.\n",
            "go.example. 3600 in a 10.0.0.1\n",
        ));
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("go"));
    }

    #[tokio::test]
    async fn skips_comments_and_short_lines() {
        let (_dir, path) = write_zone(concat!(
            "; this is a comment\n",
            "\n",
            "go.example. 3600 in\n",
            "go.example. 3600 in a 10.0.0.1\n",
        ));
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["go"].records.a, vec!["10.0.0.1"]);
    }

    #[tokio::test]
    async fn ds_rdata_kept_as_one_opaque_value() {
        let (_dir, path) = write_zone("go.example. 3600 in ds 12345 8 2 ABCDEF0123456789\n");
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged["go"].records.ds, vec!["12345 8 2 ABCDEF0123456789"]);
    }

    #[tokio::test]
    async fn owner_and_type_case_normalized_rdata_preserved() {
        let (_dir, path) = write_zone("GO.EXAMPLE. 3600 IN NS A1.NIC.EXAMPLE.\n");
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["go"].records.ns, vec!["A1.NIC.EXAMPLE"]);
    }

    #[tokio::test]
    async fn untracked_type_still_registers_domain() {
        let (_dir, path) = write_zone("quiet.example. 3600 in txt \"v=spf1 -all\"\n");
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged.len(), 1);
        assert!(merged["quiet"].records.is_empty());
    }

    #[tokio::test]
    async fn duplicate_values_dropped() {
        let (_dir, path) = write_zone(concat!(
            "go.example. 3600 in ns ns1.host.net.\n",
            "go.example. 3600 in ns ns1.host.net.\n",
            "go.example. 3600 in ns ns2.host.net.\n",
        ));
        let merged = parse_merged(ZoneParser::new(&path, "example")).await;

        assert_eq!(merged["go"].records.ns, vec!["ns1.host.net", "ns2.host.net"]);
    }

    #[tokio::test]
    async fn chunking_groups_without_splitting_domains() {
        let mut content = String::new();
        for name in ["alpha", "bravo", "charlie", "delta", "echo"] {
            content.push_str(&format!("{name}.example. 3600 in ns ns1.{name}.net.\n"));
            content.push_str(&format!("{name}.example. 3600 in a 10.0.0.1\n"));
        }
        let (_dir, path) = write_zone(&content);

        let chunks = collect_chunks(ZoneParser::new(&path, "example").with_chunk_size(2)).await;

        let sizes: Vec<usize> = chunks.iter().map(DomainChunk::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(chunks.last().unwrap().is_last);
        assert!(chunks[..2].iter().all(|c| !c.is_last));

        // Every domain has both records despite the chunk boundaries.
        for chunk in &chunks {
            for record in chunk.domains.values() {
                assert_eq!(record.records.ns.len(), 1);
                assert_eq!(record.records.a, vec!["10.0.0.1"]);
            }
        }
    }

    #[tokio::test]
    async fn chunk_size_does_not_change_final_contents() {
        let mut content = String::new();
        for i in 0..23 {
            content.push_str(&format!("d{i}.example. 3600 in ns ns{i}.host.net.\n"));
            content.push_str(&format!("d{i}.example. 3600 in aaaa 2001:db8::{i}\n"));
        }
        let (_dir, path) = write_zone(&content);

        let small = parse_merged(ZoneParser::new(&path, "example").with_chunk_size(3)).await;
        let large = parse_merged(ZoneParser::new(&path, "example").with_chunk_size(1000)).await;

        assert_eq!(small.len(), 23);
        assert_eq!(small, large);
    }

    #[tokio::test]
    async fn empty_input_yields_single_terminal_chunk() {
        let (_dir, path) = write_zone("");
        let chunks = collect_chunks(ZoneParser::new(&path, "example")).await;

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
        assert!(chunks[0].is_last);
    }

    #[tokio::test]
    async fn gzip_input_parsed_transparently() {
        let content = concat!(
            "go.example. 3600 in ns a1.nic.example.\n",
            "shop.example. 3600 in a 65.22.232.33\n",
        );
        let (_dir, gz_path) = write_zone_gz(content);
        let (_dir2, plain_path) = write_zone(content);

        let from_gz = parse_merged(ZoneParser::new(&gz_path, "example")).await;
        let from_plain = parse_merged(ZoneParser::new(&plain_path, "example")).await;

        assert_eq!(from_gz, from_plain);
        assert_eq!(from_gz.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_surfaces_error() {
        let mut stream = ZoneParser::new("/nonexistent/zone.txt", "example").parse();
        let first = stream.next_chunk().await.unwrap();
        assert!(matches!(first, Err(CoreError::ParseError(_))));
        assert!(stream.next_chunk().await.is_none());
    }

    #[test]
    fn tld_from_filenames() {
        assert_eq!(tld_from_zone_filename(Path::new("/tmp/zara.txt.gz")), "zara");
        assert_eq!(tld_from_zone_filename(Path::new("shop.zone.gz")), "shop");
        assert_eq!(tld_from_zone_filename(Path::new("dev.txt")), "dev");
        assert_eq!(tld_from_zone_filename(Path::new("app.gz")), "app");
        assert_eq!(tld_from_zone_filename(Path::new("plain")), "plain");
    }
}
