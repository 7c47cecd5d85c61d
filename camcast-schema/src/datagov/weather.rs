use serde::{Deserialize, Serialize};

use super::{ApiInfo, Coordinates};

/// `GET /v1/environment/2-hour-weather-forecast?date_time=...`
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WeatherForecastResponse {
    #[serde(default)]
    pub area_metadata: Vec<AreaMetadata>,
    #[serde(default)]
    pub items: Vec<WeatherForecastItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_info: Option<ApiInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AreaMetadata {
    pub name: String,
    pub label_location: Coordinates,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WeatherForecastItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_timestamp: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_period: Option<ValidPeriod>,
    #[serde(default)]
    pub forecasts: Vec<AreaForecast>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AreaForecast {
    pub area: String,
    pub forecast: String,
}

impl WeatherForecastResponse {
    pub fn first_item(&self) -> Option<&WeatherForecastItem> {
        self.items.first()
    }
}
