//! `SeaORM` entity definitions for the SQLite store.

pub mod domain;
pub mod sync_metadata;
pub mod sync_stats;
