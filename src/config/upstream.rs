use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Upstream snapshot API configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Traffic camera snapshot endpoint.
    /// TOML: `upstream.traffic_images_url`.
    #[serde(default = "default_traffic_images_url")]
    pub traffic_images_url: Url,

    /// Two-hour area weather forecast endpoint.
    /// TOML: `upstream.weather_forecast_url`.
    #[serde(default = "default_weather_forecast_url")]
    pub weather_forecast_url: Url,

    /// Optional upstream HTTP proxy. If set, used for the reqwest client.
    /// TOML: `upstream.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing; disabled forces HTTP/1.
    /// TOML: `upstream.enable_multiplexing`. Default: `false`.
    #[serde(default)]
    pub enable_multiplexing: bool,

    /// Max retry attempts for transport failures and 5xx responses.
    /// TOML: `upstream.retry_max_times`. Default: `2`.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,

    /// TOML: `upstream.connect_timeout_secs`. Default: `10`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Bound on a single upstream call, including body download.
    /// TOML: `upstream.request_timeout_secs`. Default: `30`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            traffic_images_url: default_traffic_images_url(),
            weather_forecast_url: default_weather_forecast_url(),
            proxy: None,
            enable_multiplexing: false,
            retry_max_times: default_retry_max_times(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_traffic_images_url() -> Url {
    Url::parse("https://api.data.gov.sg/v1/transport/traffic-images")
        .expect("valid traffic images URL")
}

fn default_weather_forecast_url() -> Url {
    Url::parse("https://api.data.gov.sg/v1/environment/2-hour-weather-forecast")
        .expect("valid weather forecast URL")
}

fn default_retry_max_times() -> usize {
    2
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}
