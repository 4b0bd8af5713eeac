//! # Shorecast Core Library
//!
//! This library aggregates several independent, unreliable upstream marine-data
//! sources into a single normalized report suitable for a coastal conditions
//! dashboard:
//!
//! - **Buoy telemetry** ([`buoy`]): NDBC realtime2 fixed-column text feeds for
//!   an offshore ("gulf") and an inshore ("bay") station.
//! - **Tide predictions** ([`tides`]): the day's first high and low water
//!   events from a CO-OPS style predictions API.
//! - **Wave forecasts** ([`waves`]): cached forecast series with the point
//!   nearest "now" selected per cycle.
//! - **Solar ephemeris** ([`solar`]): sunrise/sunset computed locally, no
//!   network dependency.
//!
//! ## Design Philosophy
//!
//! ### Fault Isolation
//! Every upstream lives in its own failure domain. The orchestrator in
//! [`engine`] fetches all sources concurrently and converts any individual
//! failure (network error, bad status, malformed payload, timeout) into that
//! source's documented null/sentinel value. A report is *always* produced;
//! the `degraded` flag and per-field nulls are the only failure signal.
//!
//! ### Explicit Absence
//! Every leaf field is either a well-typed value or an explicit `None` that
//! serializes as JSON `null`. A calm wind is `0.0`; an unavailable wind
//! reading is `null`. The two are never conflated.
//!
//! ### Data Flow
//! 1. **Fan-out**: all source fetches launch concurrently under per-source
//!    deadlines.
//! 2. **Settle**: each outcome is either a typed value or its fallback.
//! 3. **Assemble**: one immutable [`AggregatedReport`] per cycle.

use serde::{Deserialize, Serialize};

// Module declarations
pub mod buoy;
pub mod config;
pub mod engine;
pub mod error;
pub mod solar;
pub mod store;
pub mod tides;
pub mod units;
pub mod waves;

/// Sentinel shown when no wind direction reading is available.
pub const NO_DIRECTION: &str = "--";

/// One buoy station's most recent usable readings.
///
/// Each field is resolved independently from the station's report rows, so a
/// station with a partial newest row can still surface older readings for the
/// fields that row was missing. Immutable once built; lives for one
/// aggregation cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationObservation {
    /// Air temperature in °F, rounded to one decimal.
    pub air_temp_f: Option<f64>,
    /// Water temperature in °F, rounded to one decimal.
    pub water_temp_f: Option<f64>,
    /// Sustained wind speed in knots, rounded to one decimal.
    pub wind_speed_kt: Option<f64>,
    /// Gust speed in knots, rounded to one decimal.
    pub gust_speed_kt: Option<f64>,
    /// 16-point compass direction ("N".."NNW"), or "--" when unavailable.
    pub wind_direction: String,
}

impl StationObservation {
    /// The fully-degraded observation: every reading absent.
    pub fn unavailable() -> Self {
        StationObservation {
            air_temp_f: None,
            water_temp_f: None,
            wind_speed_kt: None,
            gust_speed_kt: None,
            wind_direction: NO_DIRECTION.to_string(),
        }
    }
}

/// A single predicted tide extremum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideEvent {
    /// Local wall-clock time, "HH:MM".
    pub time: String,
    /// Height above MLLW datum in feet, rounded to one decimal.
    pub height_ft: f64,
}

/// Today's first high and first low water events.
///
/// Either side degrades to `None` independently when the upstream has no
/// usable prediction of that type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TidePrediction {
    pub high: Option<TideEvent>,
    pub low: Option<TideEvent>,
}

/// One point of the wave forecast series.
///
/// Sequence order is insertion order, which mirrors the upstream's
/// chronological ordering. Serializes as `{ "time": ISO-8601,
/// "waveFt": decimal(1)|null }`, the cache persistence schema.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveForecastPoint {
    /// Forecast instant (UTC).
    pub time: chrono::DateTime<chrono::Utc>,
    /// Significant wave height in feet, rounded to one decimal; `None` when
    /// the upstream omitted the reading.
    #[serde(rename = "waveFt")]
    pub height_ft: Option<f64>,
}

/// The wave height surfaced in the report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveSummary {
    /// Height of the forecast point nearest "now", in feet.
    pub height_ft: Option<f64>,
}

/// Local sunrise/sunset, recomputed every cycle.
///
/// Both fields are `None` for polar day/night dates where the sun never
/// crosses the horizon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarTimes {
    /// Local sunrise, "HH:MM", truncated to the whole minute.
    pub sunrise: Option<String>,
    /// Local sunset, "HH:MM", truncated to the whole minute.
    pub sunset: Option<String>,
}

/// The single output entity of an aggregation cycle.
///
/// Constructed once per cycle after all sources settle and treated as
/// immutable afterwards. Construction never fails: any source failure has
/// already been converted to that source's fallback value by the time this
/// struct is assembled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    /// Offshore buoy readings.
    pub gulf: StationObservation,
    /// Inshore buoy readings.
    pub bay: StationObservation,
    /// Wave height nearest "now".
    pub waves: WaveSummary,
    /// Today's first high/low tide events.
    pub tides: TidePrediction,
    /// Local sunrise/sunset.
    pub sun: SolarTimes,
    /// True when at least one source fell back to its sentinel value.
    pub degraded: bool,
}
