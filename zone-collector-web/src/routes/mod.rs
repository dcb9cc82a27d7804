//! HTTP route handlers.

mod health;
mod newly_registered;
mod sync;
mod whois;
mod zones;

use actix_web::web;

/// Register every route on the actix service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(sync::trigger_sync)
        .service(sync::sync_status)
        .service(sync::sync_gaps)
        .service(zones::list_tlds)
        .service(zones::tld_stats)
        .service(zones::tld_domains)
        .service(zones::zone_links)
        .service(newly_registered::newly_registered)
        .service(newly_registered::newly_registered_stats)
        .service(whois::whois_lookup);
}
