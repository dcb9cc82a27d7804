//! Storage adapters wiring core traits to concrete backends.

mod sqlite;

pub use sqlite::SqliteStore;
