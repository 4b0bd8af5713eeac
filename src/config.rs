//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! shorecast.toml file. It provides a centralized way to configure buoy and
//! tide stations, the forecast location, cache policy, and fetch deadlines.
//!
//! Every upstream base URL is configurable: deployments can point the wave
//! forecast at a live API or a pre-fetched snapshot, and tests can point any
//! source at a local mock server.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Application configuration loaded from shorecast.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Buoy and tide station identifiers
    pub stations: StationsConfig,
    /// Geographic point the report describes
    pub location: LocationConfig,
    /// Wave forecast cache policy
    pub waves: WavesConfig,
    /// Network fetch settings
    pub fetch: FetchConfig,
}

/// Station identifiers for the fixed set of monitored points
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationsConfig {
    /// NDBC station ID for the offshore ("gulf") buoy
    pub gulf_buoy: String,
    /// NDBC station ID for the inshore ("bay") buoy
    pub bay_buoy: String,
    /// CO-OPS station ID for tide predictions
    pub tide_station: String,
}

/// Geographic location and display timezone
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Latitude in decimal degrees (north positive)
    pub latitude: f64,
    /// Longitude in decimal degrees (east positive)
    pub longitude: f64,
    /// Offset of the local display clock from UTC, in minutes
    pub utc_offset_minutes: i32,
}

/// Wave forecast cache policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WavesConfig {
    /// Forecast upstream URL (live API or pre-fetched snapshot)
    pub forecast_url: String,
    /// Cache TTL in minutes
    pub ttl_minutes: i64,
    /// Local wall-clock hours that force a refresh when crossed
    pub refresh_boundary_hours: Vec<u32>,
    /// Directory for the persisted cache slot
    pub cache_dir: String,
}

/// Network fetch settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Per-source deadline in seconds; expiry is treated as a network failure
    pub timeout_secs: u64,
    /// Base URL for NDBC realtime2 text feeds
    pub buoy_base_url: String,
    /// Base URL for the CO-OPS predictions API
    pub tide_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stations: StationsConfig {
                gulf_buoy: "42012".to_string(),
                bay_buoy: "PTBM6".to_string(),
                tide_station: "8735180".to_string(),
            },
            location: LocationConfig {
                latitude: 30.25,
                longitude: -87.68,
                utc_offset_minutes: -300, // CDT
            },
            waves: WavesConfig {
                forecast_url: "https://api.stormglass.io/v2/weather/point".to_string(),
                ttl_minutes: 180,
                refresh_boundary_hours: vec![0, 12],
                cache_dir: "/tmp".to_string(),
            },
            fetch: FetchConfig {
                timeout_secs: 10,
                buoy_base_url: "https://www.ndbc.noaa.gov/data/realtime2".to_string(),
                tide_base_url: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter"
                    .to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from shorecast.toml in the working directory.
    /// Falls back to the default configuration if the file doesn't exist or
    /// is invalid.
    pub fn load() -> Self {
        Self::load_from_path("shorecast.toml")
    }

    /// Load configuration from the specified path.
    /// Falls back to the default configuration if the file doesn't exist or
    /// is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("invalid config file format: {e}; using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                warn!("no config file found; using defaults");
                Self::default()
            }
        }
    }
}
