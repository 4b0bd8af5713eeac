//! # NDBC Buoy Telemetry Parsing
//!
//! This module fetches and parses NDBC realtime2 text feeds: a `#`-prefixed
//! header row naming the columns, a second `#`-prefixed units row, and
//! whitespace-delimited data rows ordered most-recent-first. Missing readings
//! are marked with the `MM` sentinel.
//!
//! ```text
//! #YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
//! #yr  mo dy hr mn degT m/s  m/s     m   sec   sec degT   hPa  degC  degC  degC  nmi hPa    ft
//! 2026 08 29 14 50 180  5.0  7.2   1.1     6   4.5 175 1014.2  28.5  29.1    MM   MM   MM    MM
//! ```
//!
//! ## Defensive Parsing
//!
//! Column order is not contractually stable upstream, so field offsets are
//! resolved by header name through a typed field enumeration, never by fixed
//! position. Each field independently takes the first non-missing, numeric
//! value scanning rows newest-first, so a partial newest row still yields a
//! complete observation from slightly older readings.
//!
//! One parameterized parser serves every station; "gulf" and "bay" differ
//! only by station identifier.

use crate::error::SourceError;
use crate::units::{c_to_f, deg_to_cardinal, ms_to_knots, round1};
use crate::{StationObservation, NO_DIRECTION};
use reqwest::Client;
use tracing::debug;

/// Missing-data sentinel used by the realtime2 format.
const MISSING: &str = "MM";

/// The buoy feed columns this parser consumes.
///
/// Header lookup goes through this enumeration so a renamed or reordered
/// upstream column fails loudly in one place instead of silently shifting
/// every reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    WindDirection,
    WindSpeed,
    GustSpeed,
    AirTemp,
    WaterTemp,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::WindDirection,
        Field::WindSpeed,
        Field::GustSpeed,
        Field::AirTemp,
        Field::WaterTemp,
    ];

    /// Column name in the realtime2 header row.
    fn column(self) -> &'static str {
        match self {
            Field::WindDirection => "WDIR",
            Field::WindSpeed => "WSPD",
            Field::GustSpeed => "GST",
            Field::AirTemp => "ATMP",
            Field::WaterTemp => "WTMP",
        }
    }
}

/// Fetch one station's realtime2 feed and parse it into an observation.
pub async fn fetch_observation(
    client: &Client,
    base_url: &str,
    station: &str,
) -> Result<StationObservation, SourceError> {
    let url = format!("{base_url}/{station}.txt");
    debug!("fetching buoy telemetry from {url}");

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(SourceError::UpstreamUnavailable(format!(
            "buoy feed for {station} returned {}",
            response.status()
        )));
    }

    let body = response.text().await?;
    parse_observation(&body)
}

/// Parse raw realtime2 text into a [`StationObservation`].
///
/// Fails with [`SourceError::MalformedPayload`] on an empty payload, absent
/// header, or zero data rows, and with [`SourceError::MissingField`] when the
/// header names none of the columns we read.
pub fn parse_observation(raw: &str) -> Result<StationObservation, SourceError> {
    if raw.trim().is_empty() {
        return Err(SourceError::MalformedPayload("empty payload".into()));
    }

    let mut header: Option<Vec<&str>> = None;
    let mut saw_comment = false;
    let mut rows: Vec<Vec<&str>> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('#') {
            saw_comment = true;
            // The names row is the comment line that mentions at least one
            // recognized column; the units row never does.
            if header.is_none() {
                let columns: Vec<&str> = stripped.split_whitespace().collect();
                if Field::ALL.iter().any(|f| columns.contains(&f.column())) {
                    header = Some(columns);
                }
            }
        } else {
            rows.push(line.split_whitespace().collect());
        }
    }

    let header = match header {
        Some(h) => h,
        None if saw_comment => {
            return Err(SourceError::MissingField(
                "header names no recognized columns".into(),
            ))
        }
        None => return Err(SourceError::MalformedPayload("header line absent".into())),
    };

    if rows.is_empty() {
        return Err(SourceError::MalformedPayload("no data rows".into()));
    }

    let wind_dir_deg = first_value(&header, &rows, Field::WindDirection);
    let wind_speed_ms = first_value(&header, &rows, Field::WindSpeed);
    let gust_speed_ms = first_value(&header, &rows, Field::GustSpeed);
    let air_temp_c = first_value(&header, &rows, Field::AirTemp);
    let water_temp_c = first_value(&header, &rows, Field::WaterTemp);

    Ok(StationObservation {
        air_temp_f: air_temp_c.map(|c| round1(c_to_f(c))),
        water_temp_f: water_temp_c.map(|c| round1(c_to_f(c))),
        wind_speed_kt: wind_speed_ms.map(|ms| round1(ms_to_knots(ms))),
        gust_speed_kt: gust_speed_ms.map(|ms| round1(ms_to_knots(ms))),
        wind_direction: wind_dir_deg
            .map(|deg| deg_to_cardinal(deg).to_string())
            .unwrap_or_else(|| NO_DIRECTION.to_string()),
    })
}

/// First non-missing, numeric value for `field`, scanning rows newest-first.
///
/// Returns `None` when the column is absent from the header or every row
/// carries the missing sentinel (or junk) at that offset.
fn first_value(header: &[&str], rows: &[Vec<&str>], field: Field) -> Option<f64> {
    let idx = header.iter().position(|c| *c == field.column())?;
    rows.iter().find_map(|row| {
        let token = row.get(idx)?;
        if *token == MISSING {
            return None;
        }
        token.parse::<f64>().ok()
    })
}
