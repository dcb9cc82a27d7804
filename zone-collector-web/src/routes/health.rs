//! Health check endpoint.

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::WebState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    storage_connected: bool,
    czds_authenticated: bool,
    scheduler_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sync: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_sync: Option<DateTime<Utc>>,
}

#[get("/health")]
pub async fn health(state: web::Data<WebState>) -> HttpResponse {
    // A trivial query doubles as the storage liveness probe.
    let storage_connected = state.app.query_service.list_tlds().await.is_ok();

    HttpResponse::Ok().json(HealthResponse {
        status: if storage_connected {
            "healthy"
        } else {
            "degraded"
        },
        storage_connected,
        czds_authenticated: state.czds.has_token().await,
        scheduler_running: state.scheduler.is_running(),
        last_sync: state.app.sync_service.last_success_time().await,
        next_sync: state.scheduler.next_run_time(),
    })
}
