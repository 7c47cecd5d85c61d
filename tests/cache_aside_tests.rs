mod common;

use async_trait::async_trait;
use camcast::cache::CacheAsideCoordinator;
use camcast::db::DbActorHandle;
use camcast::error::{
    CamcastError, FetchError, NotFound, SnapshotApi, StoreError, UpstreamFailure,
};
use camcast::snapshot::{EpochMillis, SnapshotFetcher, SnapshotResult};
use common::{sample_snapshot, temp_database_url};
use reqwest::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves a fixed snapshot and counts calls.
struct CountingFetcher {
    calls: AtomicUsize,
    delay: Duration,
    fail: bool,
    without_areas: bool,
}

impl CountingFetcher {
    fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: false,
            without_areas: false,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    /// Cameras only; weather came back empty.
    fn without_areas() -> Self {
        Self {
            without_areas: true,
            ..Self::ok()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for CountingFetcher {
    async fn fetch(&self, _timestamp: EpochMillis) -> Result<SnapshotResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(FetchError::Status {
                api: SnapshotApi::TrafficImages,
                status: StatusCode::BAD_GATEWAY,
            });
        }
        let mut snapshot = sample_snapshot("Cloudy");
        if self.without_areas {
            snapshot.areas.clear();
            snapshot.forecasts.clear();
        }
        Ok(snapshot)
    }
}

async fn coordinator(
    tag: &str,
    fetcher: Arc<CountingFetcher>,
    single_flight: bool,
) -> CacheAsideCoordinator {
    let db = camcast::db::spawn(&temp_database_url(tag), STORE_TIMEOUT)
        .await
        .expect("db spawn failed");
    CacheAsideCoordinator::new(Arc::new(db), fetcher).with_single_flight(single_flight)
}

async fn assert_store_empty(db: &DbActorHandle) {
    assert!(db.list_areas().await.unwrap().is_empty());
    assert!(db.list_weather_forecasts().await.unwrap().is_empty());
    assert!(db.list_cameras().await.unwrap().is_empty());
    assert!(db.list_camera_images().await.unwrap().is_empty());
}

#[tokio::test]
async fn miss_reindexes_once_then_hits_the_store() {
    let fetcher = Arc::new(CountingFetcher::ok());
    let cache = coordinator("cache-miss-hit", fetcher.clone(), false).await;

    let cameras = cache.get_cameras(1000).await.expect("first read failed");
    assert_eq!(cameras.len(), 2);
    assert_eq!(fetcher.calls(), 1);

    let again = cache.get_cameras(1000).await.expect("second read failed");
    assert_eq!(again, cameras);
    assert_eq!(fetcher.calls(), 1);

    // Known as of 1000, so also known later.
    cache.get_cameras(5000).await.expect("later read failed");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn unknown_camera_is_not_found_after_reindex() {
    let fetcher = Arc::new(CountingFetcher::ok());
    let cache = coordinator("cache-unknown", fetcher.clone(), false).await;

    let err = cache.get_camera_details(1000, "unknown-id").await.unwrap_err();
    assert!(
        matches!(err, CamcastError::NotFound(NotFound::Camera)),
        "got {err:?}"
    );
    assert_eq!(fetcher.calls(), 1);

    let details = cache.get_camera_details(1000, "cam-1").await.unwrap();
    assert_eq!(details.camera.area_name, "Alpha");
    assert_eq!(details.weather_forecast, "Cloudy");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn fetch_failure_surfaces_as_upstream_failure() {
    let fetcher = Arc::new(CountingFetcher::failing());
    let cache = coordinator("cache-fetch-fail", fetcher.clone(), false).await;

    let err = cache.get_cameras(1000).await.unwrap_err();
    assert!(
        matches!(
            err,
            CamcastError::Upstream(UpstreamFailure::Fetch(FetchError::Status { .. }))
        ),
        "got {err:?}"
    );
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn merge_rejection_surfaces_as_upstream_failure() {
    let fetcher = Arc::new(CountingFetcher::without_areas());
    let db = camcast::db::spawn(&temp_database_url("cache-merge-reject"), STORE_TIMEOUT)
        .await
        .expect("db spawn failed");
    let cache = CacheAsideCoordinator::new(Arc::new(db.clone()), fetcher.clone());

    let err = cache.get_cameras(1000).await.unwrap_err();
    assert!(
        matches!(
            err,
            CamcastError::Upstream(UpstreamFailure::Store(StoreError::InvalidSnapshot(_)))
        ),
        "got {err:?}"
    );
    assert_eq!(fetcher.calls(), 1);
    assert_store_empty(&db).await;
}

#[tokio::test]
async fn merge_failing_mid_transaction_rolls_back_every_row() {
    let url = temp_database_url("cache-merge-rollback");
    let db = camcast::db::spawn(&url, STORE_TIMEOUT)
        .await
        .expect("db spawn failed");

    // Image writes come after areas, forecasts and cameras in a merge.
    let side = sqlx::SqlitePool::connect(&url).await.unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_images BEFORE INSERT ON camera_images \
         BEGIN SELECT RAISE(ABORT, 'image writes disabled'); END",
    )
    .execute(&side)
    .await
    .unwrap();

    let fetcher = Arc::new(CountingFetcher::ok());
    let cache = CacheAsideCoordinator::new(Arc::new(db.clone()), fetcher.clone());

    let err = cache.get_cameras(1000).await.unwrap_err();
    assert!(
        matches!(
            err,
            CamcastError::Upstream(UpstreamFailure::Store(StoreError::Database(_)))
        ),
        "got {err:?}"
    );
    assert_store_empty(&db).await;

    // Nothing partial is left behind to satisfy the next read.
    sqlx::query("DROP TRIGGER reject_images")
        .execute(&side)
        .await
        .unwrap();
    side.close().await;

    let cameras = cache.get_cameras(1000).await.expect("retry failed");
    assert_eq!(cameras.len(), 2);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn concurrent_misses_share_one_reindex_with_single_flight() {
    let fetcher = Arc::new(CountingFetcher::slow(Duration::from_millis(100)));
    let cache = Arc::new(coordinator("cache-single-flight", fetcher.clone(), true).await);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_cameras(1000).await })
        })
        .collect();

    for task in tasks {
        let cameras = task.await.expect("task panicked").expect("read failed");
        assert_eq!(cameras.len(), 2);
    }
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn concurrent_misses_without_single_flight_still_converge() {
    let fetcher = Arc::new(CountingFetcher::slow(Duration::from_millis(50)));
    let db = camcast::db::spawn(&temp_database_url("cache-no-flight"), STORE_TIMEOUT)
        .await
        .expect("db spawn failed");
    let cache = Arc::new(
        CacheAsideCoordinator::new(Arc::new(db.clone()), fetcher.clone()).with_single_flight(false),
    );

    let (a, b) = tokio::join!(cache.get_cameras(1000), cache.get_cameras(1000));
    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 2);

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(db.list_cameras().await.unwrap().len(), 2);
    assert_eq!(db.list_camera_images().await.unwrap().len(), 2);
    assert_eq!(db.list_areas().await.unwrap().len(), 2);
}
