//! WHOIS enrichment endpoint.

use actix_web::{HttpResponse, get, web};
use serde_json::json;

use crate::error::ApiError;
use crate::state::WebState;

/// Perform a WHOIS lookup for a fully qualified domain name.
///
/// 503 when lookups are disabled in the configuration; 404 when the lookup
/// fails (rate limited registry, unknown TLD server, timeout).
#[get("/whois/{domain}")]
pub async fn whois_lookup(
    state: web::Data<WebState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.app.whois_service.is_enabled() {
        return Ok(HttpResponse::ServiceUnavailable().json(json!({
            "message": "WHOIS lookups are disabled",
        })));
    }

    match state.app.whois_service.lookup(&path).await {
        Some(info) => Ok(HttpResponse::Ok().json(info)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": format!("WHOIS lookup failed for {path}"),
        }))),
    }
}
