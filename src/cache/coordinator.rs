use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::single_flight::SingleFlight;
use crate::db::{CameraDetails, CameraSnapshot, SnapshotStore};
use crate::error::{CamcastError, ReadError, UpstreamFailure};
use crate::snapshot::{EpochMillis, SnapshotFetcher};

/// Where a request stands in the read-miss-reindex-reread protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lookup,
    Reindexed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lookup => f.write_str("lookup"),
            Phase::Reindexed => f.write_str("reindexed"),
        }
    }
}

/// Ties the snapshot store and the upstream fetcher together for a request.
pub struct CacheAsideCoordinator {
    store: Arc<dyn SnapshotStore>,
    fetcher: Arc<dyn SnapshotFetcher>,
    single_flight: Option<SingleFlight>,
}

impl CacheAsideCoordinator {
    pub fn new(store: Arc<dyn SnapshotStore>, fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        Self {
            store,
            fetcher,
            single_flight: None,
        }
    }

    /// Serialize reindexing per timestamp. Concurrent misses on the same
    /// timestamp wait for the first to finish, then read its result.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled.then(SingleFlight::new);
        self
    }

    pub async fn get_cameras(
        &self,
        timestamp: EpochMillis,
    ) -> Result<Vec<CameraSnapshot>, CamcastError> {
        self.read_through(timestamp, || self.store.read_cameras(timestamp))
            .await
    }

    pub async fn get_camera_details(
        &self,
        timestamp: EpochMillis,
        camera_id: &str,
    ) -> Result<CameraDetails, CamcastError> {
        self.read_through(timestamp, || {
            self.store.read_camera_details(timestamp, camera_id)
        })
        .await
    }

    async fn read_through<T, F, Fut>(
        &self,
        timestamp: EpochMillis,
        read: F,
    ) -> Result<T, CamcastError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ReadError>>,
    {
        match read().await {
            Ok(hit) => return Ok(hit),
            Err(ReadError::NotFound(kind)) => {
                debug!(timestamp, phase = %Phase::Lookup, miss = %kind, "Store miss, reindexing");
            }
            Err(e) => return Err(e.into()),
        }

        let _flight = match &self.single_flight {
            Some(table) => {
                let guard = table.acquire(timestamp).await;
                // Another request may have merged this timestamp while we waited.
                match read().await {
                    Ok(hit) => {
                        debug!(timestamp, "Reindexed by a concurrent request");
                        return Ok(hit);
                    }
                    Err(ReadError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }
                Some(guard)
            }
            None => None,
        };

        self.reindex(timestamp).await?;

        let res = read().await;
        if let Err(ReadError::NotFound(kind)) = &res {
            debug!(timestamp, phase = %Phase::Reindexed, miss = %kind, "Still missing after reindex");
        }
        res.map_err(CamcastError::from)
    }

    async fn reindex(&self, timestamp: EpochMillis) -> Result<(), UpstreamFailure> {
        let start = Instant::now();

        let snapshot = self.fetcher.fetch(timestamp).await.inspect_err(|e| {
            warn!(timestamp, error = %e, "Snapshot fetch failed");
        })?;

        let summary = self
            .store
            .merge(timestamp, snapshot)
            .await
            .inspect_err(|e| {
                warn!(timestamp, error = %e, "Snapshot merge failed");
            })?;

        info!(
            timestamp,
            cameras = summary.cameras,
            areas = summary.areas,
            forecasts = summary.forecasts,
            images = summary.images,
            took_ms = start.elapsed().as_millis() as u64,
            "Snapshot reindexed"
        );
        Ok(())
    }
}
