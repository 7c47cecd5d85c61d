use async_trait::async_trait;

use super::actor::DbActorHandle;
use super::merge::MergeSummary;
use super::models::{CameraDetails, CameraSnapshot, DbTransaction, TransactionCreate};
use crate::error::{ReadError, StoreError};
use crate::snapshot::{EpochMillis, SnapshotResult};

/// Persistent snapshot store: reads as of a timestamp, plus idempotent merge.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn read_cameras(&self, timestamp: EpochMillis) -> Result<Vec<CameraSnapshot>, ReadError>;

    async fn read_camera_details(
        &self,
        timestamp: EpochMillis,
        camera_id: &str,
    ) -> Result<CameraDetails, ReadError>;

    /// Merging the same snapshot twice leaves the store as after the first.
    async fn merge(
        &self,
        timestamp: EpochMillis,
        snapshot: SnapshotResult,
    ) -> Result<MergeSummary, StoreError>;
}

/// Append-only log of served lookups.
#[async_trait]
pub trait LookupStore: Send + Sync {
    async fn create_transaction(&self, create: TransactionCreate) -> Result<i64, StoreError>;

    async fn recent_transactions(&self, limit: u32) -> Result<Vec<DbTransaction>, StoreError>;
}

#[async_trait]
impl SnapshotStore for DbActorHandle {
    async fn read_cameras(&self, timestamp: EpochMillis) -> Result<Vec<CameraSnapshot>, ReadError> {
        DbActorHandle::read_cameras(self, timestamp).await
    }

    async fn read_camera_details(
        &self,
        timestamp: EpochMillis,
        camera_id: &str,
    ) -> Result<CameraDetails, ReadError> {
        DbActorHandle::read_camera_details(self, timestamp, camera_id).await
    }

    async fn merge(
        &self,
        timestamp: EpochMillis,
        snapshot: SnapshotResult,
    ) -> Result<MergeSummary, StoreError> {
        DbActorHandle::merge(self, timestamp, snapshot).await
    }
}

#[async_trait]
impl LookupStore for DbActorHandle {
    async fn create_transaction(&self, create: TransactionCreate) -> Result<i64, StoreError> {
        DbActorHandle::create_transaction(self, create).await
    }

    async fn recent_transactions(&self, limit: u32) -> Result<Vec<DbTransaction>, StoreError> {
        DbActorHandle::recent_transactions(self, limit).await
    }
}
