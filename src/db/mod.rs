//! Database module: snapshot persistence behind a single actor.
//!
//! Layout:
//! - `actor.rs`: ractor actor owning the pool, one message at a time
//! - `merge.rs`: ordered merge plan and the writer seam it drives
//! - `models.rs`: Rust structs mirroring DB rows, plus read-side domain types
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: queries
//! - `traits.rs`: store traits consumed by the cache and reports layers

pub mod actor;
pub mod merge;
pub mod models;
pub mod schema;
mod sqlite;
pub mod traits;

pub use actor::{DbActorHandle, spawn};
pub use merge::{MergePlan, MergeStep, MergeSummary, SnapshotWriter};
pub use models::{
    CameraDetails, CameraImage, CameraSnapshot, DbArea, DbCamera, DbCameraImage, DbTransaction,
    DbWeatherForecast, TransactionCreate,
};
pub use schema::SQLITE_INIT;
pub use traits::{LookupStore, SnapshotStore};
