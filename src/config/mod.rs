mod basic;
mod cache;
mod upstream;

pub use basic::BasicConfig;
pub use cache::CacheConfig;
pub use upstream::UpstreamConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// data.gov.sg endpoints and HTTP client settings (see `upstream` table).
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Cache-aside behaviour (see `cache` table).
    #[serde(default)]
    pub cache: CacheConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        Self::figment_from(PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Same as [`Config::figment`] but reading an explicit file path.
    pub fn figment_from(path: PathBuf) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Loads configuration, panicking on a malformed file.
    ///
    /// Used by the global [`CONFIG`]; binaries should prefer [`Config::load`].
    pub fn from_optional_toml() -> Self {
        Self::load().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);
