//! Cache-aside orchestration over the snapshot store.
//!
//! A read goes to the store first. A `NotFound` is the miss signal: the
//! coordinator fetches the snapshot for that timestamp, merges it and reads
//! once more. Whatever the second read returns is final.

mod coordinator;
mod single_flight;

pub use coordinator::{CacheAsideCoordinator, Phase};
pub use single_flight::{FlightGuard, SingleFlight};
