//! Ordered merge pipeline.
//!
//! A snapshot is turned into a [`MergePlan`]: a flat list of [`MergeStep`]s in
//! dependency order (areas, forecasts, cameras, images, watermarks). The plan
//! is applied one step at a time against a [`SnapshotWriter`]; no two writes
//! are ever in flight together, so concurrent creates on the same unique key
//! (area name, camera id, content hash) cannot race within a merge.

use ahash::AHashMap;
use async_trait::async_trait;
use camcast_schema::Coordinates;
use chrono::{DateTime, FixedOffset};

use crate::error::StoreError;
use crate::geo;
use crate::snapshot::{EpochMillis, SnapshotResult};

#[derive(Debug, Clone, PartialEq)]
pub enum MergeStep {
    /// Create the area, or lower its watermark. Coordinates of an existing
    /// area are left as first recorded.
    UpsertArea { name: String, location: Coordinates },

    InsertForecast {
        area_name: String,
        forecast_text: String,
    },

    /// Create the camera, or move it to `area_name` and lower its watermark.
    UpsertCamera {
        camera_id: String,
        location: Coordinates,
        area_name: String,
    },

    /// Create the image unless its content hash is known, then make it the
    /// camera's current image.
    UpsertImage {
        camera_id: String,
        image: ImageUpsert,
    },

    /// Lower the watermark of every area and camera touched so far.
    LowerWatermarks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpsert {
    pub content_hash: String,
    pub image_timestamp: DateTime<FixedOffset>,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
}

/// Row counts touched by one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub areas: usize,
    pub forecasts: usize,
    pub cameras: usize,
    pub images: usize,
}

/// Write half of the store, one call per step.
#[async_trait]
pub trait SnapshotWriter: Send {
    async fn upsert_area(
        &mut self,
        name: &str,
        location: Coordinates,
        timestamp: EpochMillis,
    ) -> Result<i64, StoreError>;

    async fn insert_forecast(
        &mut self,
        area_id: i64,
        forecast_timestamp: DateTime<FixedOffset>,
        observed_at: EpochMillis,
        forecast_text: &str,
    ) -> Result<i64, StoreError>;

    async fn upsert_camera(
        &mut self,
        camera_id: &str,
        location: Coordinates,
        area_id: i64,
        timestamp: EpochMillis,
    ) -> Result<i64, StoreError>;

    /// Returns the id of the image row holding `image.content_hash`.
    async fn upsert_image(&mut self, camera_row_id: i64, image: &ImageUpsert)
    -> Result<i64, StoreError>;

    async fn link_latest_image(&mut self, camera_row_id: i64, image_id: i64)
    -> Result<(), StoreError>;

    async fn lower_watermarks(
        &mut self,
        area_ids: &[i64],
        camera_row_ids: &[i64],
        timestamp: EpochMillis,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    timestamp: EpochMillis,
    forecast_timestamp: DateTime<FixedOffset>,
    steps: Vec<MergeStep>,
}

impl MergePlan {
    /// Plans the merge of `snapshot` observed at `timestamp`.
    ///
    /// Each camera is assigned to its nearest area among the snapshot's areas
    /// (first listed wins on duplicate names and on equal distance).
    pub fn build(timestamp: EpochMillis, snapshot: &SnapshotResult) -> Result<Self, StoreError> {
        let mut areas: Vec<(&str, Coordinates)> = Vec::with_capacity(snapshot.areas.len());
        for area in &snapshot.areas {
            if !areas.iter().any(|(name, _)| *name == area.name) {
                areas.push((area.name.as_str(), area.location));
            }
        }

        if !snapshot.cameras.is_empty() && areas.is_empty() {
            return Err(StoreError::InvalidSnapshot(
                "cameras present but no areas to match them against".to_string(),
            ));
        }

        let mut steps = Vec::with_capacity(
            areas.len() + snapshot.forecasts.len() + snapshot.cameras.len() * 2 + 1,
        );

        steps.extend(areas.iter().map(|(name, location)| MergeStep::UpsertArea {
            name: (*name).to_string(),
            location: *location,
        }));

        for forecast in &snapshot.forecasts {
            if !areas.iter().any(|(name, _)| *name == forecast.area_name) {
                return Err(StoreError::InvalidSnapshot(format!(
                    "forecast for unknown area {:?}",
                    forecast.area_name
                )));
            }
            steps.push(MergeStep::InsertForecast {
                area_name: forecast.area_name.clone(),
                forecast_text: forecast.forecast_text.clone(),
            });
        }

        for camera in &snapshot.cameras {
            let nearest = geo::nearest_index(camera.location, areas.iter().map(|(_, loc)| *loc))
                .ok_or_else(|| StoreError::InvalidSnapshot("no areas".to_string()))?;
            steps.push(MergeStep::UpsertCamera {
                camera_id: camera.camera_id.clone(),
                location: camera.location,
                area_name: areas[nearest].0.to_string(),
            });
        }

        steps.extend(snapshot.cameras.iter().map(|camera| MergeStep::UpsertImage {
            camera_id: camera.camera_id.clone(),
            image: ImageUpsert {
                content_hash: camera.content_hash.clone(),
                image_timestamp: camera.image_timestamp,
                image_url: camera.image_url.clone(),
                width: camera.width,
                height: camera.height,
            },
        }));

        steps.push(MergeStep::LowerWatermarks);

        Ok(Self {
            timestamp,
            forecast_timestamp: snapshot.forecast_timestamp,
            steps,
        })
    }

    pub fn timestamp(&self) -> EpochMillis {
        self.timestamp
    }

    pub fn steps(&self) -> &[MergeStep] {
        &self.steps
    }

    /// Runs every step in order, awaiting each write before issuing the next.
    pub async fn apply<W>(&self, writer: &mut W) -> Result<MergeSummary, StoreError>
    where
        W: SnapshotWriter + ?Sized,
    {
        let mut area_ids: AHashMap<&str, i64> = AHashMap::new();
        let mut camera_ids: AHashMap<&str, i64> = AHashMap::new();
        let mut summary = MergeSummary::default();

        for step in &self.steps {
            match step {
                MergeStep::UpsertArea { name, location } => {
                    let id = writer.upsert_area(name, *location, self.timestamp).await?;
                    area_ids.insert(name.as_str(), id);
                    summary.areas += 1;
                }
                MergeStep::InsertForecast {
                    area_name,
                    forecast_text,
                } => {
                    let area_id = lookup(&area_ids, area_name)?;
                    writer
                        .insert_forecast(area_id, self.forecast_timestamp, self.timestamp, forecast_text)
                        .await?;
                    summary.forecasts += 1;
                }
                MergeStep::UpsertCamera {
                    camera_id,
                    location,
                    area_name,
                } => {
                    let area_id = lookup(&area_ids, area_name)?;
                    let id = writer
                        .upsert_camera(camera_id, *location, area_id, self.timestamp)
                        .await?;
                    if camera_ids.insert(camera_id.as_str(), id).is_none() {
                        summary.cameras += 1;
                    }
                }
                MergeStep::UpsertImage { camera_id, image } => {
                    let camera_row_id = lookup(&camera_ids, camera_id)?;
                    let image_id = writer.upsert_image(camera_row_id, image).await?;
                    writer.link_latest_image(camera_row_id, image_id).await?;
                    summary.images += 1;
                }
                MergeStep::LowerWatermarks => {
                    let mut areas: Vec<i64> = area_ids.values().copied().collect();
                    let mut cameras: Vec<i64> = camera_ids.values().copied().collect();
                    areas.sort_unstable();
                    cameras.sort_unstable();
                    writer
                        .lower_watermarks(&areas, &cameras, self.timestamp)
                        .await?;
                }
            }
        }

        Ok(summary)
    }
}

fn lookup(ids: &AHashMap<&str, i64>, key: &str) -> Result<i64, StoreError> {
    ids.get(key)
        .copied()
        .ok_or_else(|| StoreError::InvalidSnapshot(format!("{key:?} referenced before upsert")))
}
