//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `areas` (named weather regions, unique by name)
/// - `cameras` (unique by external camera id, owned by one area)
/// - `camera_images` (unique by content hash, owned by one camera)
/// - `weather_forecasts` (one row per area per merge, never deduplicated)
/// - `transactions` (request analytics records)
///
/// `earliest_timestamp` and `observed_at` are epoch milliseconds.
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Weather areas
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS areas (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    earliest_timestamp INTEGER NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_areas_earliest ON areas(earliest_timestamp);

-- ---------------------------------------------------------------------------
-- Traffic cameras (area association is recomputed on every merge)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS cameras (
    id INTEGER PRIMARY KEY NOT NULL,
    camera_id TEXT NOT NULL UNIQUE,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    area_id INTEGER NOT NULL REFERENCES areas(id),
    latest_image_id INTEGER NULL REFERENCES camera_images(id),
    earliest_timestamp INTEGER NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_cameras_earliest ON cameras(earliest_timestamp);

-- ---------------------------------------------------------------------------
-- Camera images (content hash is the dedup key)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS camera_images (
    id INTEGER PRIMARY KEY NOT NULL,
    camera_id INTEGER NOT NULL REFERENCES cameras(id),
    content_hash TEXT NOT NULL UNIQUE,
    image_timestamp TEXT NOT NULL, -- RFC3339 with upstream offset
    image_url TEXT NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_camera_images_camera ON camera_images(camera_id);

-- ---------------------------------------------------------------------------
-- Area weather forecasts
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS weather_forecasts (
    id INTEGER PRIMARY KEY NOT NULL,
    area_id INTEGER NOT NULL REFERENCES areas(id),
    forecast_timestamp TEXT NOT NULL, -- RFC3339 with upstream offset
    observed_at INTEGER NOT NULL,
    forecast TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_weather_forecasts_area ON weather_forecasts(area_id, observed_at);

-- ---------------------------------------------------------------------------
-- Request analytics
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY NOT NULL,
    client_id TEXT NOT NULL,
    query_timestamp INTEGER NOT NULL,
    path TEXT NOT NULL,
    params TEXT NOT NULL, -- JSON object
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_transactions_created ON transactions(created_at);
"#;
