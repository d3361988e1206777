//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: SQLite-backed key-value and lead storage
//! - `traits.rs`: storage seams consumed by the workflow

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use models::DbLead;
pub use schema::SQLITE_INIT;
pub use sqlite::{KvStorage, LeadsStorage, SqlitePool, connect};
pub use traits::{LeadStore, NoopLeadStore, TokenStore};
