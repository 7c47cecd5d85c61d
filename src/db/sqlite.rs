//! SQLite implementation of the snapshot writer and read queries.

use async_trait::async_trait;
use camcast_schema::Coordinates;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::merge::{ImageUpsert, SnapshotWriter};
use super::models::{
    CameraDetails, CameraSnapshot, DbArea, DbCamera, DbCameraImage, DbCameraSnapshotRow,
    DbTransaction, DbWeatherForecast,
};
use crate::error::{NotFound, ReadError, StoreError};
use crate::snapshot::EpochMillis;

/// Writes merge steps through one connection, normally an open transaction.
pub(crate) struct SqliteSnapshotWriter<'c> {
    conn: &'c mut SqliteConnection,
    now: DateTime<Utc>,
}

impl<'c> SqliteSnapshotWriter<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self {
            conn,
            now: Utc::now(),
        }
    }
}

#[async_trait]
impl SnapshotWriter for SqliteSnapshotWriter<'_> {
    async fn upsert_area(
        &mut self,
        name: &str,
        location: Coordinates,
        timestamp: EpochMillis,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO areas (name, latitude, longitude, earliest_timestamp, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            earliest_timestamp = MIN(earliest_timestamp, excluded.earliest_timestamp),
            updated_at = excluded.updated_at
        RETURNING id
        "#,
        )
        .bind(name)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(timestamp)
        .bind(self.now)
        .bind(self.now)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    async fn insert_forecast(
        &mut self,
        area_id: i64,
        forecast_timestamp: DateTime<FixedOffset>,
        observed_at: EpochMillis,
        forecast_text: &str,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO weather_forecasts (area_id, forecast_timestamp, observed_at, forecast, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
        )
        .bind(area_id)
        .bind(forecast_timestamp)
        .bind(observed_at)
        .bind(forecast_text)
        .bind(self.now)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    async fn upsert_camera(
        &mut self,
        camera_id: &str,
        location: Coordinates,
        area_id: i64,
        timestamp: EpochMillis,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO cameras (camera_id, latitude, longitude, area_id, earliest_timestamp, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(camera_id) DO UPDATE SET
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            area_id = excluded.area_id,
            earliest_timestamp = MIN(earliest_timestamp, excluded.earliest_timestamp),
            updated_at = excluded.updated_at
        RETURNING id
        "#,
        )
        .bind(camera_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(area_id)
        .bind(timestamp)
        .bind(self.now)
        .bind(self.now)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    async fn upsert_image(
        &mut self,
        camera_row_id: i64,
        image: &ImageUpsert,
    ) -> Result<i64, StoreError> {
        // A known hash keeps its original owner and metadata.
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO camera_images (
            camera_id, content_hash, image_timestamp, image_url, width, height, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(content_hash) DO UPDATE SET
            updated_at = excluded.updated_at
        RETURNING id
        "#,
        )
        .bind(camera_row_id)
        .bind(&image.content_hash)
        .bind(image.image_timestamp)
        .bind(&image.image_url)
        .bind(image.width)
        .bind(image.height)
        .bind(self.now)
        .bind(self.now)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    async fn link_latest_image(
        &mut self,
        camera_row_id: i64,
        image_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE cameras SET latest_image_id = ? WHERE id = ?")
            .bind(image_id)
            .bind(camera_row_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn lower_watermarks(
        &mut self,
        area_ids: &[i64],
        camera_row_ids: &[i64],
        timestamp: EpochMillis,
    ) -> Result<(), StoreError> {
        for id in area_ids {
            sqlx::query(
                "UPDATE areas SET earliest_timestamp = MIN(earliest_timestamp, ?) WHERE id = ?",
            )
            .bind(timestamp)
            .bind(*id)
            .execute(&mut *self.conn)
            .await?;
        }
        for id in camera_row_ids {
            sqlx::query(
                "UPDATE cameras SET earliest_timestamp = MIN(earliest_timestamp, ?) WHERE id = ?",
            )
            .bind(timestamp)
            .bind(*id)
            .execute(&mut *self.conn)
            .await?;
        }
        Ok(())
    }
}

const CAMERA_SNAPSHOT_SELECT: &str = r#"
        SELECT c.camera_id, c.latitude, c.longitude, c.area_id, a.name AS area_name,
               i.image_timestamp, i.image_url, i.width, i.height, i.content_hash
        FROM cameras c
        JOIN areas a ON a.id = c.area_id
        LEFT JOIN camera_images i ON i.id = c.latest_image_id
"#;

/// Cameras known as of `timestamp`, in first-sighting order.
pub(crate) async fn read_cameras(
    pool: &SqlitePool,
    timestamp: EpochMillis,
) -> Result<Vec<CameraSnapshot>, ReadError> {
    let rows = sqlx::query_as::<_, DbCameraSnapshotRow>(&format!(
        "{CAMERA_SNAPSHOT_SELECT} WHERE c.earliest_timestamp <= ? ORDER BY c.id"
    ))
    .bind(timestamp)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(ReadError::NotFound(NotFound::Cameras));
    }

    rows.into_iter()
        .map(|row| {
            row.into_snapshot()
                .ok_or(ReadError::NotFound(NotFound::CameraImage))
        })
        .collect()
}

/// One camera known as of `timestamp` plus its area's latest forecast
/// observed no later than `timestamp`.
pub(crate) async fn read_camera_details(
    pool: &SqlitePool,
    timestamp: EpochMillis,
    camera_id: &str,
) -> Result<CameraDetails, ReadError> {
    let row = sqlx::query_as::<_, DbCameraSnapshotRow>(&format!(
        "{CAMERA_SNAPSHOT_SELECT} WHERE c.camera_id = ? AND c.earliest_timestamp <= ?"
    ))
    .bind(camera_id)
    .bind(timestamp)
    .fetch_optional(pool)
    .await?
    .ok_or(ReadError::NotFound(NotFound::Camera))?;

    let area_id = row.area_id;
    let camera = row
        .into_snapshot()
        .ok_or(ReadError::NotFound(NotFound::CameraImage))?;

    let weather_forecast: String = sqlx::query_scalar(
        r#"
        SELECT forecast
        FROM weather_forecasts
        WHERE area_id = ? AND observed_at <= ?
        ORDER BY observed_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(area_id)
    .bind(timestamp)
    .fetch_optional(pool)
    .await?
    .ok_or(ReadError::NotFound(NotFound::WeatherForecast))?;

    Ok(CameraDetails {
        camera,
        weather_forecast,
    })
}

pub(crate) async fn list_areas(pool: &SqlitePool) -> Result<Vec<DbArea>, StoreError> {
    let rows = sqlx::query_as::<_, DbArea>(
        r#"
        SELECT id, name, latitude, longitude, earliest_timestamp, created_at, updated_at
        FROM areas
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub(crate) async fn list_cameras(pool: &SqlitePool) -> Result<Vec<DbCamera>, StoreError> {
    let rows = sqlx::query_as::<_, DbCamera>(
        r#"
        SELECT id, camera_id, latitude, longitude, area_id, latest_image_id, earliest_timestamp, created_at, updated_at
        FROM cameras
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub(crate) async fn list_camera_images(pool: &SqlitePool) -> Result<Vec<DbCameraImage>, StoreError> {
    let rows = sqlx::query_as::<_, DbCameraImage>(
        r#"
        SELECT id, camera_id, content_hash, image_timestamp, image_url, width, height, created_at, updated_at
        FROM camera_images
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub(crate) async fn list_weather_forecasts(
    pool: &SqlitePool,
) -> Result<Vec<DbWeatherForecast>, StoreError> {
    let rows = sqlx::query_as::<_, DbWeatherForecast>(
        r#"
        SELECT id, area_id, forecast_timestamp, observed_at, forecast, created_at
        FROM weather_forecasts
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub(crate) async fn insert_transaction(
    pool: &SqlitePool,
    client_id: &str,
    query_timestamp: EpochMillis,
    path: &str,
    params: &str,
) -> Result<i64, StoreError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (client_id, query_timestamp, path, params, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(client_id)
    .bind(query_timestamp)
    .bind(path)
    .bind(params)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub(crate) async fn recent_transactions(
    pool: &SqlitePool,
    limit: u32,
) -> Result<Vec<DbTransaction>, StoreError> {
    let rows = sqlx::query_as::<_, DbTransaction>(
        r#"
        SELECT id, client_id, query_timestamp, path, params, created_at
        FROM transactions
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
