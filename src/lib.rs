pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod reports;
pub mod server;
pub mod snapshot;
pub mod utils;

pub use cache::CacheAsideCoordinator;
pub use error::CamcastError;
pub use snapshot::{HttpSnapshotFetcher, SnapshotFetcher};
