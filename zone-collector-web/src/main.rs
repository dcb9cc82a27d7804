//! Zone Collector service binary.
//!
//! Wires the SQLite store, the CZDS client, and the core services into an
//! actix-web server, and starts the periodic sync scheduler.

mod config;
mod error;
mod routes;
mod scheduler;
mod state;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use zone_collector_app::{AppStateBuilder, SqliteStore};
use zone_collector_core::services::{SyncConfig, WhoisConfig};
use zone_collector_core::traits::{DomainRepository, ZoneFeed};
use zone_collector_czds::{CzdsClient, CzdsConfig};

use config::AppConfig;
use state::WebState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.log.filter)),
        )
        .init();

    tracing::info!("Starting Zone Collector service...");

    let store = SqliteStore::new(&app_config.database.path)
        .await
        .context("failed to open domain store")?
        .with_upsert_batch_size(app_config.sync.upsert_batch_size);
    let store: Arc<SqliteStore> = Arc::new(store);

    let czds = Arc::new(
        CzdsClient::new(CzdsConfig {
            username: app_config.czds.username.clone(),
            password: app_config.czds.password.clone(),
            auth_url: app_config.czds.auth_url.clone(),
            czds_url: app_config.czds.czds_url.clone(),
            zone_files_dir: app_config.czds.zone_files_dir.clone(),
        })
        .context("failed to create CZDS client")?,
    );

    let app_state = AppStateBuilder::new()
        .domain_repository(Arc::clone(&store) as Arc<dyn DomainRepository>)
        .zone_feed(Arc::clone(&czds) as Arc<dyn ZoneFeed>)
        .sync_config(SyncConfig {
            max_concurrent_downloads: app_config.sync.max_concurrent_downloads,
            chunk_size: app_config.sync.chunk_size,
        })
        .whois_config(WhoisConfig {
            enabled: app_config.whois.enabled,
            rate_limit: app_config.whois.rate_limit,
        })
        .build()
        .context("failed to build application state")?;

    let scheduler = scheduler::start(
        Arc::clone(&app_state.sync_service),
        &app_config.sync.schedule_hours,
    );

    let web_state = web::Data::new(WebState {
        app: app_state,
        czds,
        scheduler,
    });

    let workers = app_config.server.workers.unwrap_or_else(num_cpus::get);
    tracing::info!(
        "Listening on {} ({workers} workers)",
        app_config.server.bind
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web_state.clone())
            .configure(routes::configure)
    })
    .workers(workers)
    .bind(&app_config.server.bind)
    .with_context(|| format!("failed to bind {}", app_config.server.bind))?
    .run()
    .await?;

    tracing::info!("Zone Collector service stopped");
    Ok(())
}
