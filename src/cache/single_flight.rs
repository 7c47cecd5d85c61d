use ahash::AHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::snapshot::EpochMillis;

type Slot = Arc<AsyncMutex<()>>;

struct Entry {
    slot: Slot,
    users: usize,
}

/// Per-timestamp reindex lock table.
///
/// At most one holder per timestamp at a time; later callers wait for the
/// current holder to release. A slot is dropped from the table once nobody
/// holds or waits on it, including waiters whose future was cancelled.
#[derive(Default)]
pub struct SingleFlight {
    slots: Mutex<AHashMap<EpochMillis, Entry>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, timestamp: EpochMillis) -> FlightGuard<'_> {
        let slot = {
            let mut slots = self.slots();
            let entry = slots.entry(timestamp).or_insert_with(|| Entry {
                slot: Slot::default(),
                users: 0,
            });
            entry.users += 1;
            entry.slot.clone()
        };
        // Registered before the wait so a dropped future still deregisters.
        let registration = Registration {
            table: self,
            timestamp,
        };
        let guard = slot.lock_owned().await;
        FlightGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of timestamps currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.slots().len()
    }

    fn slots(&self) -> MutexGuard<'_, AHashMap<EpochMillis, Entry>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Registration<'a> {
    table: &'a SingleFlight,
    timestamp: EpochMillis,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut slots = self.table.slots();
        let Some(entry) = slots.get_mut(&self.timestamp) else {
            return;
        };
        entry.users = entry.users.saturating_sub(1);
        if entry.users == 0 {
            slots.remove(&self.timestamp);
        }
    }
}

/// Held for the duration of one reindex. Fields drop in order, so the lock is
/// released before the table entry is deregistered.
pub struct FlightGuard<'a> {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a>,
}
