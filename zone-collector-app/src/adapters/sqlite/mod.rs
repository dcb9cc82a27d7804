//! SQLite-based domain store using `SeaORM`.
//!
//! `SqliteStore` implements `DomainRepository` against a local `SQLite`
//! database: the `domains` table is the per-TLD partitioned domain storage
//! (unique on `(tld, domain)`), `sync_stats` is the append-only sync log,
//! and `sync_metadata` holds one recency row per TLD.

mod domain_repo;
pub(crate) mod entity;
mod migration;

use std::path::Path;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use zone_collector_core::error::{CoreError, CoreResult};

use migration::Migrator;

/// Default number of domains written per upsert batch.
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 5000;

/// SQLite-backed implementation of the core storage traits.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
    /// Domains per upsert batch.
    pub(crate) upsert_batch_size: usize,
}

impl SqliteStore {
    /// Create a new `SQLite` store.
    ///
    /// - `db_path`: Path to the `SQLite` database file (created if not exists).
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self {
            db,
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        };

        // Ensure schema is up to date before the store is used.
        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        Ok(store)
    }

    /// Override the upsert batch size (minimum 1).
    #[must_use]
    pub fn with_upsert_batch_size(mut self, batch_size: usize) -> Self {
        self.upsert_batch_size = batch_size.max(1);
        self
    }
}
