//! TLD listing, statistics, pagination, and feed link endpoints.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use serde_json::json;

use zone_collector_czds::{ZoneFeed, tld_from_url};

use crate::error::ApiError;
use crate::state::WebState;

/// List all TLDs with data in the database.
#[get("/tlds")]
pub async fn list_tlds(state: web::Data<WebState>) -> Result<HttpResponse, ApiError> {
    let tlds = state.app.query_service.list_tlds().await?;
    Ok(HttpResponse::Ok().json(tlds))
}

/// Get statistics for a specific TLD.
#[get("/tlds/{tld}/stats")]
pub async fn tld_stats(
    state: web::Data<WebState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let stats = state.app.query_service.tld_stats(&path).await?;
    Ok(HttpResponse::Ok().json(stats))
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

/// Get one page of a TLD's domains with their DNS records.
#[get("/tlds/{tld}/domains")]
pub async fn tld_domains(
    state: web::Data<WebState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = state
        .app
        .query_service
        .domains_page(&path, query.page, query.page_size)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Get the zone download links currently available from the feed.
#[get("/zone-links")]
pub async fn zone_links(state: web::Data<WebState>) -> Result<HttpResponse, ApiError> {
    let links = state
        .czds
        .zone_links()
        .await
        .map_err(|e| ApiError(e.into()))?;

    let zones: Vec<_> = links
        .iter()
        .map(|link| {
            json!({
                "zone": tld_from_url(link),
                "download_link": link,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "total": zones.len(),
        "zones": zones,
    })))
}
