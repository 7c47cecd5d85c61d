use async_trait::async_trait;
use backon::ExponentialBuilder;
use camcast_schema::{TrafficImagesResponse, WeatherForecastResponse};
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

use super::retry::{get_json_with_retry, retry_policy};
use super::{EpochMillis, LocalClock, SnapshotFetcher, SnapshotResult, snapshot_from_payloads};
use crate::config::UpstreamConfig;
use crate::error::{FetchError, SnapshotApi};
use crate::utils::logging::debug_upstream_payload;

pub const CAMCAST_USER_AGENT: &str = concat!("camcast/", env!("CARGO_PKG_VERSION"));

/// Fetches traffic-camera and weather snapshots from data.gov.sg.
pub struct HttpSnapshotFetcher {
    client: reqwest::Client,
    traffic_images_url: Url,
    weather_forecast_url: Url,
    clock: LocalClock,
    retry_policy: ExponentialBuilder,
    request_timeout: Duration,
}

impl HttpSnapshotFetcher {
    pub fn new(cfg: &UpstreamConfig, client: reqwest::Client, clock: LocalClock) -> Self {
        Self {
            client,
            traffic_images_url: cfg.traffic_images_url.clone(),
            weather_forecast_url: cfg.weather_forecast_url.clone(),
            clock,
            retry_policy: retry_policy(cfg.retry_max_times),
            request_timeout: cfg.request_timeout(),
        }
    }

    /// Builds the shared reqwest client for upstream calls.
    pub fn build_client(cfg: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
        let mut headers = HeaderMap::new();

        let mut builder = reqwest::Client::builder()
            .user_agent(CAMCAST_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(3))
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout());

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        if cfg.enable_multiplexing {
            builder = builder.http2_adaptive_window(true);
        } else {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder = builder
                .http1_only()
                .pool_max_idle_per_host(0)
                .pool_idle_timeout(Duration::from_secs(0));
        }

        builder.default_headers(headers).build()
    }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
    async fn fetch(&self, timestamp: EpochMillis) -> Result<SnapshotResult, FetchError> {
        let date_time = self
            .clock
            .format_millis(timestamp)
            .ok_or(FetchError::InvalidTimestamp(timestamp))?;

        let start = Instant::now();
        let (traffic, weather) = futures::future::try_join(
            get_json_with_retry::<TrafficImagesResponse>(
                SnapshotApi::TrafficImages,
                &self.client,
                &self.traffic_images_url,
                &date_time,
                &self.retry_policy,
                self.request_timeout,
            ),
            get_json_with_retry::<WeatherForecastResponse>(
                SnapshotApi::WeatherForecast,
                &self.client,
                &self.weather_forecast_url,
                &date_time,
                &self.retry_policy,
                self.request_timeout,
            ),
        )
        .await?;

        debug_upstream_payload(SnapshotApi::TrafficImages, &date_time, &traffic);
        debug_upstream_payload(SnapshotApi::WeatherForecast, &date_time, &weather);

        let snapshot = snapshot_from_payloads(&traffic, &weather)?;

        info!(
            timestamp,
            date_time = %date_time,
            cameras = snapshot.cameras.len(),
            areas = snapshot.areas.len(),
            forecasts = snapshot.forecasts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched upstream snapshot"
        );

        Ok(snapshot)
    }
}
