//! # Tide Prediction Client
//!
//! Fetches the day's hi/lo tide predictions for a fixed CO-OPS station and
//! surfaces the first High and first Low event in the upstream's
//! chronological ordering.
//!
//! Upstream shape: `{ "predictions": [ { "t": "YYYY-MM-DD HH:MM",
//! "v": "<height>", "type": "H"|"L" }, ... ] }`, heights in feet above the
//! MLLW datum, times already in the station's local timezone.
//!
//! A response without a usable prediction list degrades each of high/low
//! independently to `None` rather than failing the whole call; only a
//! transport failure or an unparseable body is an error.

use crate::error::SourceError;
use crate::units::round1;
use crate::{TideEvent, TidePrediction};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PredictionsResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    /// "YYYY-MM-DD HH:MM", station-local clock
    t: String,
    /// Height in feet, as a decimal string
    v: String,
    /// "H" or "L"
    #[serde(rename = "type")]
    kind: String,
}

/// Fetch today's hi/lo predictions for `station`.
pub async fn fetch_predictions(
    client: &Client,
    base_url: &str,
    station: &str,
    date: NaiveDate,
) -> Result<TidePrediction, SourceError> {
    let day = date.format("%Y%m%d").to_string();
    debug!("fetching tide predictions for station {station} on {day}");

    let response = client
        .get(base_url)
        .query(&[
            ("product", "predictions"),
            ("application", "shorecast"),
            ("begin_date", day.as_str()),
            ("end_date", day.as_str()),
            ("datum", "MLLW"),
            ("station", station),
            ("time_zone", "lst_ldt"),
            ("units", "english"),
            ("interval", "hilo"),
            ("format", "json"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(SourceError::UpstreamUnavailable(format!(
            "tide API returned {}",
            response.status()
        )));
    }

    let body = response.text().await?;
    let parsed: PredictionsResponse = serde_json::from_str(&body)?;
    Ok(first_events(&parsed.predictions))
}

/// First High and first Low in upstream order, each parsed independently.
///
/// Entries with an unparseable time or height are skipped, so one bad record
/// cannot suppress a later usable one.
fn first_events(predictions: &[RawPrediction]) -> TidePrediction {
    let mut high = None;
    let mut low = None;

    for prediction in predictions {
        let slot = match prediction.kind.as_str() {
            "H" => &mut high,
            "L" => &mut low,
            _ => continue,
        };
        if slot.is_none() {
            *slot = to_event(prediction);
        }
        if high.is_some() && low.is_some() {
            break;
        }
    }

    TidePrediction { high, low }
}

fn to_event(prediction: &RawPrediction) -> Option<TideEvent> {
    let height_ft = prediction.v.trim().parse::<f64>().ok()?;
    let when = NaiveDateTime::parse_from_str(prediction.t.trim(), "%Y-%m-%d %H:%M").ok()?;
    Some(TideEvent {
        time: when.format("%H:%M").to_string(),
        height_ft: round1(height_ft),
    })
}
