//! Newly-registered domain reporting endpoints.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::WebState;

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    100
}

fn default_days_back() -> i64 {
    1
}

fn default_stats_days_back() -> i64 {
    7
}

#[derive(Debug, Deserialize)]
pub struct NewlyRegisteredQuery {
    /// Restrict to one TLD; empty searches all TLDs.
    pub tld: Option<String>,
    #[serde(default = "default_days_back")]
    pub days_back: i64,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

/// Get domains first seen in the last `days_back` days, newest first.
///
/// The response carries a warning and the gap report when any queried TLD
/// has not been synced recently enough for absence to be meaningful.
#[get("/newly-registered")]
pub async fn newly_registered(
    state: web::Data<WebState>,
    query: web::Query<NewlyRegisteredQuery>,
) -> Result<HttpResponse, ApiError> {
    let result = state
        .app
        .query_service
        .newly_registered(
            query.tld.as_deref(),
            query.days_back,
            query.page,
            query.page_size,
        )
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_stats_days_back")]
    pub days_back: i64,
    pub tld: Option<String>,
}

/// Get aggregated inserted/updated counts per TLD and per day.
#[get("/newly-registered/stats")]
pub async fn newly_registered_stats(
    state: web::Data<WebState>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, ApiError> {
    let summary = state
        .app
        .query_service
        .sync_stats_summary(query.days_back, query.tld.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
