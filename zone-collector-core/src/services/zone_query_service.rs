//! Read-side query service.
//!
//! Thin validation layer over the repository for the API surface: TLD
//! listing, per-TLD stats and pagination, the newly-registered query with
//! its gap warning, sync-stats aggregation, and the standalone gap check.

use std::sync::Arc;

use chrono::{Duration, NaiveTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::traits::DomainRepository;
use crate::types::{
    DomainPage, GapReport, NewlyRegisteredPage, NewlyRegisteredParams, SyncStatsSummary,
    TldStats, total_pages,
};

/// Largest accepted page size.
const MAX_PAGE_SIZE: u64 = 1000;
/// Largest accepted look-back window in days.
const MAX_DAYS_BACK: i64 = 365;
/// Gap threshold applied to newly-registered queries.
const NEWLY_REGISTERED_GAP_HOURS: i64 = 48;

/// Query service over stored domains and sync bookkeeping.
pub struct ZoneQueryService {
    repository: Arc<dyn DomainRepository>,
}

impl ZoneQueryService {
    #[must_use]
    pub fn new(repository: Arc<dyn DomainRepository>) -> Self {
        Self { repository }
    }

    /// Every TLD with stored domain data.
    pub async fn list_tlds(&self) -> CoreResult<Vec<String>> {
        self.repository.list_tlds().await
    }

    /// Aggregate statistics for one TLD.
    pub async fn tld_stats(&self, tld: &str) -> CoreResult<TldStats> {
        self.repository
            .tld_stats(tld)
            .await?
            .ok_or_else(|| CoreError::TldNotFound(tld.to_string()))
    }

    /// One page of a TLD's domains, sorted by domain label.
    pub async fn domains_page(
        &self,
        tld: &str,
        page: u64,
        page_size: u64,
    ) -> CoreResult<DomainPage> {
        validate_paging(page, page_size)?;
        self.repository
            .domains_page(tld, page, page_size)
            .await?
            .ok_or_else(|| CoreError::TldNotFound(tld.to_string()))
    }

    /// Domains first seen in the trailing `days_back` window, newest first.
    ///
    /// The window ends at the start of tomorrow (UTC) so today's sync is
    /// always included. When any queried TLD is stale or never synced, the
    /// page carries the gap report and its false-positive warning.
    pub async fn newly_registered(
        &self,
        tld: Option<&str>,
        days_back: i64,
        page: u64,
        page_size: u64,
    ) -> CoreResult<NewlyRegisteredPage> {
        validate_paging(page, page_size)?;
        validate_days_back(days_back)?;

        if let Some(tld) = tld {
            if self.repository.tld_stats(tld).await?.is_none() {
                return Err(CoreError::TldNotFound(tld.to_string()));
            }
        }

        let end = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
            + Duration::days(1);
        let start = end - Duration::days(days_back);

        let (total, domains) = self
            .repository
            .newly_registered(tld, start, end, page, page_size)
            .await?;

        let gap_tlds = tld.map(|t| vec![t.to_string()]);
        let gaps = self
            .repository
            .check_gaps(gap_tlds.as_deref(), NEWLY_REGISTERED_GAP_HOURS)
            .await?;

        let mut result = NewlyRegisteredPage {
            search_params: NewlyRegisteredParams {
                days_back,
                start_date: start,
                end_date: end,
                tld: tld.unwrap_or("all").to_string(),
            },
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
            domains,
            warning: None,
            sync_gaps: None,
        };

        if gaps.has_gaps {
            result.warning.clone_from(&gaps.warning);
            result.sync_gaps = Some(gaps);
        }

        Ok(result)
    }

    /// Aggregate the sync-statistics log over the trailing window.
    pub async fn sync_stats_summary(
        &self,
        days_back: i64,
        tld: Option<&str>,
    ) -> CoreResult<SyncStatsSummary> {
        validate_days_back(days_back)?;
        self.repository.sync_stats_summary(days_back, tld).await
    }

    /// Report stale and never-synced TLDs.
    pub async fn check_gaps(
        &self,
        tlds: Option<Vec<String>>,
        max_gap_hours: i64,
    ) -> CoreResult<GapReport> {
        if max_gap_hours <= 0 {
            return Err(CoreError::ValidationError(
                "max_gap_hours must be positive".to_string(),
            ));
        }
        self.repository.check_gaps(tlds.as_deref(), max_gap_hours).await
    }
}

fn validate_paging(page: u64, page_size: u64) -> CoreResult<()> {
    if page < 1 {
        return Err(CoreError::ValidationError(
            "page must be >= 1".to_string(),
        ));
    }
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(CoreError::ValidationError(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

fn validate_days_back(days_back: i64) -> CoreResult<()> {
    if days_back < 1 || days_back > MAX_DAYS_BACK {
        return Err(CoreError::ValidationError(format!(
            "days_back must be between 1 and {MAX_DAYS_BACK}"
        )));
    }
    Ok(())
}
