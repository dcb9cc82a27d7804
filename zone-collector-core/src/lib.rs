//! Zone Collector Core Library
//!
//! Provides the core business logic for the zone collector service:
//! - Zone file parsing (streaming, bounded memory)
//! - Sync orchestration (bounded-concurrency per-TLD processing)
//! - Domain store abstraction (idempotent upserts, gap detection)
//! - Optional WHOIS enrichment
//!
//! This library is platform-independent, abstracting the storage layer and
//! the download client through traits; the actix-web backend wires in the
//! `SeaORM` store and the CZDS client.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{DomainRepository, ZoneFeed};
