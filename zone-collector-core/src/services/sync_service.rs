//! Sync orchestration service.
//!
//! Coordinates one sync run: fetches the zone download links, fans out one
//! task per TLD under a concurrency cap, and aggregates the partial results
//! into a single run record. A failure in one TLD never aborts its siblings;
//! only a failed link fetch (no auth, no links) is fatal to the run.
//!
//! Runs are tracked in an in-memory registry owned by the service. They are
//! not persisted: if the process dies mid-run, the run is simply lost and
//! the next scheduled sync reconciles storage.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use zone_collector_czds::tld_from_url;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::services::zone_parser::{DEFAULT_CHUNK_SIZE, ZoneParser};
use crate::traits::DomainRepository;
use crate::types::{SyncRun, SyncState, SyncStatsRecord, UpsertOutcome};

/// Tuning knobs for sync runs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Concurrent per-TLD tasks (downloads + parses + writes).
    pub max_concurrent_downloads: usize,
    /// Distinct domains per parser chunk.
    pub chunk_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

struct RunEntry {
    run: Arc<RwLock<SyncRun>>,
    /// Background task of the run; taken by `wait_for_run`.
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct RunRegistry {
    /// Run ids in creation order.
    order: Vec<String>,
    runs: HashMap<String, RunEntry>,
    /// Id of the single in-flight run, if any.
    active: Option<String>,
    /// Completion time of the most recent run that reached `Completed`.
    last_success: Option<DateTime<Utc>>,
}

/// Service orchestrating zone file sync operations.
pub struct SyncService {
    ctx: Arc<ServiceContext>,
    config: SyncConfig,
    registry: Arc<RwLock<RunRegistry>>,
}

impl SyncService {
    /// Create the service.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, config: SyncConfig) -> Self {
        Self {
            ctx,
            config,
            registry: Arc::new(RwLock::new(RunRegistry::default())),
        }
    }

    /// Start a sync run and return its id immediately.
    ///
    /// The run executes in the background; poll it with [`get_status`](Self::get_status).
    /// Only one run may be active process-wide: a second call fails with
    /// [`CoreError::SyncInProgress`] without creating a run or touching the
    /// active one.
    pub async fn start_sync(&self, tlds_filter: Option<Vec<String>>) -> CoreResult<String> {
        let mut registry = self.registry.write().await;
        if registry.active.is_some() {
            return Err(CoreError::SyncInProgress);
        }

        let sync_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        let run = Arc::new(RwLock::new(SyncRun::new(sync_id.clone())));

        registry.active = Some(sync_id.clone());
        registry.order.push(sync_id.clone());

        let task = tokio::spawn(run_sync(
            Arc::clone(&self.ctx),
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&run),
            sync_id.clone(),
            tlds_filter,
        ));

        registry.runs.insert(
            sync_id.clone(),
            RunEntry {
                run,
                task: Some(task),
            },
        );

        log::info!("[{sync_id}] Sync started");
        Ok(sync_id)
    }

    /// Snapshot a run's status.
    ///
    /// Resolution order: the named run if an id is given, else the active
    /// run, else the most recently started run. `None` when nothing matches;
    /// an unknown id never raises.
    pub async fn get_status(&self, sync_id: Option<&str>) -> Option<SyncRun> {
        let registry = self.registry.read().await;
        let id = match sync_id {
            Some(id) => id.to_string(),
            None => registry
                .active
                .clone()
                .or_else(|| registry.order.last().cloned())?,
        };
        let entry = registry.runs.get(&id)?;
        let snapshot = entry.run.read().await.clone();
        Some(snapshot)
    }

    /// Snapshot every run, in creation order.
    pub async fn get_all_runs(&self) -> Vec<SyncRun> {
        let registry = self.registry.read().await;
        let mut runs = Vec::with_capacity(registry.order.len());
        for id in &registry.order {
            if let Some(entry) = registry.runs.get(id) {
                runs.push(entry.run.read().await.clone());
            }
        }
        runs
    }

    /// Whether a run is currently active.
    pub async fn is_syncing(&self) -> bool {
        self.registry.read().await.active.is_some()
    }

    /// Completion time of the most recent successful run.
    pub async fn last_success_time(&self) -> Option<DateTime<Utc>> {
        self.registry.read().await.last_success
    }

    /// Wait for a run's background task to finish.
    pub async fn wait_for_run(&self, sync_id: &str) -> CoreResult<()> {
        let task = {
            let mut registry = self.registry.write().await;
            let entry = registry
                .runs
                .get_mut(sync_id)
                .ok_or_else(|| CoreError::RunNotFound(sync_id.to_string()))?;
            entry.task.take()
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::error!("[{sync_id}] Sync task join failure: {e}");
            }
        }
        Ok(())
    }
}

/// Outcome of one per-TLD task, folded into the run summary.
struct TldOutcome {
    success: bool,
    domains: u64,
    upserts: UpsertOutcome,
}

impl TldOutcome {
    fn failed() -> Self {
        Self {
            success: false,
            domains: 0,
            upserts: UpsertOutcome::default(),
        }
    }
}

async fn append_error(run: &Arc<RwLock<SyncRun>>, message: String) {
    run.write().await.errors.push(message);
}

/// Terminate a run with a fatal, run-level error.
async fn finish_error(
    registry: &Arc<RwLock<RunRegistry>>,
    run: &Arc<RwLock<SyncRun>>,
    sync_id: &str,
    message: String,
) {
    log::error!("[{sync_id}] {message}");
    {
        let mut run = run.write().await;
        run.state = SyncState::Error;
        run.message.clone_from(&message);
        run.errors.push(message);
        run.completed_at = Some(Utc::now());
    }
    registry.write().await.active = None;
}

async fn run_sync(
    ctx: Arc<ServiceContext>,
    config: SyncConfig,
    registry: Arc<RwLock<RunRegistry>>,
    run: Arc<RwLock<SyncRun>>,
    sync_id: String,
    tlds_filter: Option<Vec<String>>,
) {
    run.write().await.message = "Getting zone file links...".to_string();

    let links = match ctx.zone_feed.zone_links().await {
        Ok(links) => links,
        Err(e) => {
            finish_error(
                &registry,
                &run,
                &sync_id,
                format!("Failed to get zone file links: {e}"),
            )
            .await;
            return;
        }
    };

    if links.is_empty() {
        finish_error(
            &registry,
            &run,
            &sync_id,
            "No zone files available".to_string(),
        )
        .await;
        return;
    }

    let links: Vec<String> = match &tlds_filter {
        Some(filter) => links
            .into_iter()
            .filter(|url| filter.iter().any(|tld| *tld == tld_from_url(url)))
            .collect(),
        None => links,
    };

    let total_tlds = links.len() as u64;
    log::info!(
        "[{sync_id}] Found {total_tlds} zone files to process (parallel: {})",
        config.max_concurrent_downloads
    );
    run.write().await.message = format!("Processing {total_tlds} TLDs in parallel...");

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1)));

    let tasks: Vec<JoinHandle<TldOutcome>> = links
        .into_iter()
        .map(|url| {
            tokio::spawn(process_single_tld(
                Arc::clone(&ctx),
                Arc::clone(&run),
                Arc::clone(&semaphore),
                config.clone(),
                sync_id.clone(),
                url,
            ))
        })
        .collect();

    let mut successful: u64 = 0;
    let mut total_domains: u64 = 0;
    let mut totals = UpsertOutcome::default();

    for result in join_all(tasks).await {
        match result {
            Ok(outcome) => {
                if outcome.success {
                    successful += 1;
                    total_domains += outcome.domains;
                    totals.absorb(outcome.upserts);
                }
            }
            Err(e) => {
                append_error(&run, format!("Sync task aborted: {e}")).await;
            }
        }
    }

    let completed_at = Utc::now();
    let message = format!(
        "Sync completed: {successful}/{total_tlds} TLDs, {total_domains} domains ({} new, {} updated)",
        totals.inserted, totals.updated
    );

    {
        let mut run = run.write().await;
        run.state = SyncState::Completed;
        run.message.clone_from(&message);
        run.completed_at = Some(completed_at);
        run.tlds_processed = successful;
        run.domains_processed = total_domains;
    }

    {
        let mut registry = registry.write().await;
        registry.active = None;
        registry.last_success = Some(completed_at);
    }

    log::info!("[{sync_id}] {message}");
}

/// Process one TLD end to end under the shared concurrency cap.
///
/// Every failure is converted into an error entry on the run; nothing
/// propagates past the task boundary.
async fn process_single_tld(
    ctx: Arc<ServiceContext>,
    run: Arc<RwLock<SyncRun>>,
    semaphore: Arc<Semaphore>,
    config: SyncConfig,
    sync_id: String,
    url: String,
) -> TldOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        // The semaphore lives as long as the run; closure is unreachable.
        return TldOutcome::failed();
    };

    let tld = tld_from_url(&url);

    let file_path = match ctx.zone_feed.download_zone_file(&url).await {
        Ok(Some(path)) => path,
        Ok(None) => {
            append_error(&run, format!("Failed to download {tld}")).await;
            return TldOutcome::failed();
        }
        Err(e) => {
            let message = format!("Error processing {tld}: {e}");
            log::error!("[{sync_id}] {message}");
            append_error(&run, message).await;
            return TldOutcome::failed();
        }
    };

    match ingest_zone_file(&ctx.domain_repository, &run, &config, &tld, &file_path).await {
        Ok(Some((domains, upserts))) => {
            {
                let mut run = run.write().await;
                run.tlds_processed += 1;
                run.domains_processed += domains;
                run.message = format!("Processing... {} TLDs done", run.tlds_processed);
            }
            log::info!(
                "[{sync_id}] Processed {tld}: {} new, {} updated, {domains} total",
                upserts.inserted,
                upserts.updated
            );
            // Best-effort cleanup; never fails the task.
            let _ = tokio::fs::remove_file(&file_path).await;
            TldOutcome {
                success: true,
                domains,
                upserts,
            }
        }
        Ok(None) => {
            log::warn!("[{sync_id}] No domains found in {tld}");
            append_error(&run, format!("No domains found in {tld}")).await;
            let _ = tokio::fs::remove_file(&file_path).await;
            TldOutcome::failed()
        }
        Err(e) => {
            let message = format!("Error processing {tld}: {e}");
            if e.is_expected() {
                log::warn!("[{sync_id}] {message}");
            } else {
                log::error!("[{sync_id}] {message}");
            }
            append_error(&run, message).await;
            // The artifact is left behind for inspection of corrupt files.
            TldOutcome::failed()
        }
    }
}

/// Parse one zone file chunk by chunk, persisting each chunk before pulling
/// the next, then record the TLD's stats and recency metadata.
///
/// Returns `None` for an empty (but readable) zone.
async fn ingest_zone_file(
    repository: &Arc<dyn DomainRepository>,
    run: &Arc<RwLock<SyncRun>>,
    config: &SyncConfig,
    tld: &str,
    file_path: &Path,
) -> CoreResult<Option<(u64, UpsertOutcome)>> {
    let observed_at = Utc::now();
    let mut stream = ZoneParser::new(file_path, tld)
        .with_chunk_size(config.chunk_size)
        .parse();

    let mut total_domains: u64 = 0;
    let mut totals = UpsertOutcome::default();

    while let Some(item) = stream.next_chunk().await {
        let chunk = item?;
        if chunk.is_empty() {
            continue;
        }
        total_domains += chunk.len() as u64;
        let outcome = repository
            .upsert_domains(tld, &chunk.domains, observed_at)
            .await?;
        totals.absorb(outcome);
    }

    if total_domains == 0 {
        return Ok(None);
    }

    if totals.failed > 0 {
        append_error(
            run,
            format!(
                "Partial upsert for {tld}: {} domains not persisted",
                totals.failed
            ),
        )
        .await;
    }

    repository
        .record_sync_stats(&SyncStatsRecord {
            tld: tld.to_string(),
            inserted: totals.inserted,
            updated: totals.updated,
            sync_time: observed_at,
        })
        .await?;
    repository
        .record_sync_metadata(tld, total_domains, Utc::now())
        .await?;

    Ok(Some((total_domains, totals)))
}
