#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Application configuration.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults from `config/default.toml`, embedded at compile time.
//! 2. An optional user TOML file named by `APARTMENT_SPOT_CONFIG`. It may
//!    contain any subset of keys; tables are merged key by key.
//! 3. Environment variables `API_BASE_URL` and `API_TOKEN`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use apartment_spot_listing_models::GeoPosition;
use apartment_spot_map_models::{MapOptions, TileLayer};
use serde::Deserialize;

/// Environment variable naming the user configuration file.
pub const CONFIG_PATH_ENV: &str = "APARTMENT_SPOT_CONFIG";

/// Built-in defaults.
const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The user configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration layer is not valid TOML or does not match the
    /// expected shape.
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value: {message}")]
    Invalid {
        /// Which value was rejected and why.
        message: String,
    },
}

/// Complete application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// REST listing source settings.
    pub api: ApiConfig,
    /// Map renderer settings.
    pub map: MapConfig,
    /// Search form settings.
    pub filters: FilterConfig,
}

/// REST listing source settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the listings API, without a trailing slash.
    pub base_url: String,
    /// Path of the listing collection endpoint.
    pub listings_path: String,
    /// Path of the signed-in user's favorites endpoint.
    pub favorites_path: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Seconds between polls when watching the listing feed.
    pub poll_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// How many times a transient failure is retried.
    pub max_retries: u32,
}

impl ApiConfig {
    /// Delay between feed polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Map renderer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Center used when geolocation is unavailable.
    pub fallback_center: GeoPosition,
    /// Initial zoom level.
    pub zoom: u8,
    /// Raster tile URL template.
    pub tile_url: String,
    /// Tile attribution text.
    pub attribution: String,
    /// Prefix of listing detail links.
    pub detail_path_prefix: String,
    /// Currency symbol used in map popups.
    pub currency_symbol: String,
    /// Seconds to wait for a geolocation fix.
    pub geolocation_timeout_secs: u64,
}

impl MapConfig {
    /// Renderer options derived from this configuration.
    #[must_use]
    pub fn options(&self) -> MapOptions {
        MapOptions {
            fallback_center: self.fallback_center,
            zoom: self.zoom,
            tile_layer: TileLayer {
                url_template: self.tile_url.clone(),
                attribution: self.attribution.clone(),
            },
            detail_path_prefix: self.detail_path_prefix.clone(),
            currency_symbol: self.currency_symbol.clone(),
        }
    }

    /// How long to wait for a geolocation fix.
    #[must_use]
    pub const fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }
}

/// Search form settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Top stop of the price slider; selecting it means "no upper bound".
    pub price_slider_max: f64,
    /// Price slider increment.
    pub price_slider_step: f64,
}

impl FilterConfig {
    /// Snaps a price to the nearest slider stop.
    #[must_use]
    pub fn snap_price(&self, price: f64) -> f64 {
        (price / self.price_slider_step).round() * self.price_slider_step
    }
}

impl AppConfig {
    /// Loads configuration from the defaults, the file named by
    /// `APARTMENT_SPOT_CONFIG` (if set) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the user file cannot be read or parsed, or
    /// if a resulting value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Loads configuration from the defaults, an optional user file and an
    /// environment lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the user file cannot be read or parsed, or
    /// if a resulting value is invalid.
    pub fn load_from(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let user = match path {
            Some(path) => {
                log::debug!("Reading config overrides from {}", path.display());
                Some(std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?)
            }
            None => None,
        };

        let mut config = Self::from_layers(user.as_deref())?;

        if let Some(base_url) = env("API_BASE_URL").filter(|v| !v.is_empty()) {
            config.api.base_url = base_url;
        }
        if let Some(token) = env("API_TOKEN").filter(|v| !v.is_empty()) {
            config.api.token = Some(token);
        }
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();

        config.validate()?;
        Ok(config)
    }

    /// Merges an optional user TOML document over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if either layer is malformed.
    pub fn from_layers(user: Option<&str>) -> Result<Self, ConfigError> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_TOML)?;
        if let Some(user) = user {
            let overrides: toml::Table = toml::from_str(user)?;
            merge_tables(&mut merged, overrides);
        }
        Ok(toml::Value::Table(merged).try_into()?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };

        if self.api.base_url.is_empty() {
            return invalid("api.base_url must not be empty");
        }
        if self.api.poll_interval_secs == 0 {
            return invalid("api.poll_interval_secs must be positive");
        }
        if self.api.request_timeout_secs == 0 {
            return invalid("api.request_timeout_secs must be positive");
        }
        let center = self.map.fallback_center;
        if GeoPosition::new(center.latitude, center.longitude).is_none() {
            return invalid("map.fallback_center is not a valid position");
        }
        if !(self.filters.price_slider_max.is_finite() && self.filters.price_slider_max > 0.0) {
            return invalid("filters.price_slider_max must be positive");
        }
        if !(self.filters.price_slider_step.is_finite() && self.filters.price_slider_step > 0.0) {
            return invalid("filters.price_slider_step must be positive");
        }
        Ok(())
    }
}

/// Recursively merges `overrides` into `base`. Nested tables merge key by
/// key; any other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
            } else {
                base.insert(key, toml::Value::Table(incoming));
            }
        } else {
            base.insert(key, value);
        }
    }
}
