//! Sync trigger, status, and gap-check endpoints.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::json;

use zone_collector_core::error::CoreError;

use crate::error::ApiError;
use crate::state::WebState;

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// Specific TLDs to sync; empty means all approved TLDs.
    pub tlds: Option<Vec<String>>,
}

/// Trigger a manual zone file sync.
///
/// Returns immediately with the run id; progress is polled via
/// `/sync/status?sync_id=...`. 409 when a run is already active.
#[post("/sync")]
pub async fn trigger_sync(
    state: web::Data<WebState>,
    request: Option<web::Json<SyncRequest>>,
) -> Result<HttpResponse, ApiError> {
    let tlds_filter = request.and_then(|r| r.into_inner().tlds);
    let sync_id = state.app.sync_service.start_sync(tlds_filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "sync_id": sync_id,
        "status": "started",
        "message": format!(
            "Sync started in background. Use /sync/status?sync_id={sync_id} to check progress."
        ),
    })))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub sync_id: Option<String>,
}

/// Get sync status by id, or the current/most recent run.
#[get("/sync/status")]
pub async fn sync_status(
    state: web::Data<WebState>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    match state.app.sync_service.get_status(query.sync_id.as_deref()).await {
        Some(run) => Ok(HttpResponse::Ok().json(run)),
        None => Err(ApiError(CoreError::RunNotFound(
            query.sync_id.unwrap_or_else(|| "latest".to_string()),
        ))),
    }
}

fn default_gap_hours() -> i64 {
    48
}

#[derive(Debug, Deserialize)]
pub struct GapsQuery {
    /// Comma-separated TLD list; empty checks every TLD.
    pub tlds: Option<String>,
    #[serde(default = "default_gap_hours")]
    pub max_gap_hours: i64,
}

/// Report TLDs whose data may be stale or was never synced.
#[get("/sync/gaps")]
pub async fn sync_gaps(
    state: web::Data<WebState>,
    query: web::Query<GapsQuery>,
) -> Result<HttpResponse, ApiError> {
    let tlds = query.tlds.as_ref().map(|raw| {
        raw.split(',')
            .map(|tld| tld.trim().to_string())
            .filter(|tld| !tld.is_empty())
            .collect::<Vec<_>>()
    });

    let report = state
        .app
        .query_service
        .check_gaps(tlds, query.max_gap_hours)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
