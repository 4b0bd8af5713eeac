//! # Wave Forecast Cache
//!
//! Serves the single wave height closest in time to "now" from a cached
//! forecast series, refreshing the series according to a TTL-and-boundary
//! policy:
//!
//! - **Fresh**: cache age < TTL and no refresh boundary crossed → serve the
//!   cached series untouched.
//! - **Stale**: TTL elapsed, or a local wall-clock boundary (midnight/noon by
//!   default) was crossed since the cache was written → fetch a new series
//!   and replace the slot wholesale.
//! - **Refresh failure**: fall back to the previously cached series when one
//!   exists, otherwise fail with [`SourceError::StaleCacheMiss`].
//!
//! The cache is a single keyed slot in an injected [`KvStore`], not a general
//! cache. Writes are last-writer-wins with no merge: concurrent refreshes are
//! idempotent because they recompute the same series from the same immutable
//! upstream window.
//!
//! Which concrete upstream backs the forecast (live API or a pre-fetched
//! snapshot) is a deployment choice; anything returning the
//! `{ "hours": [ { "time", "waveHeight": { "sg" } } ] }` shape works.

use crate::config::WavesConfig;
use crate::error::SourceError;
use crate::store::KvStore;
use crate::units::{m_to_ft, round1};
use crate::WaveForecastPoint;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Store key for the single cache slot.
pub const CACHE_KEY: &str = "wave_forecast";

/// Persisted cache slot: `{ "timestamp": epoch-millis, "waves": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    /// Fetch instant, epoch milliseconds.
    timestamp: i64,
    /// Chronologically ordered forecast points.
    waves: Vec<WaveForecastPoint>,
}

// Upstream forecast shape
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hours: Vec<ForecastHour>,
}

#[derive(Debug, Deserialize)]
struct ForecastHour {
    time: DateTime<Utc>,
    #[serde(rename = "waveHeight", default)]
    wave_height: Option<WaveHeight>,
}

#[derive(Debug, Deserialize)]
struct WaveHeight {
    /// Significant wave height in meters.
    sg: Option<f64>,
}

/// TTL-and-boundary cached wave forecast source.
pub struct WaveForecastCache {
    client: Client,
    forecast_url: String,
    store: Arc<dyn KvStore>,
    ttl: Duration,
    boundary_hours: Vec<u32>,
    local_offset: FixedOffset,
}

impl WaveForecastCache {
    pub fn new(
        client: Client,
        config: &WavesConfig,
        utc_offset_minutes: i32,
        store: Arc<dyn KvStore>,
    ) -> Self {
        let local_offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        WaveForecastCache {
            client,
            forecast_url: config.forecast_url.clone(),
            store,
            ttl: Duration::minutes(config.ttl_minutes),
            boundary_hours: config.refresh_boundary_hours.clone(),
            local_offset,
        }
    }

    /// Wave height of the forecast point nearest `now`, refreshing the cached
    /// series first when it has gone stale.
    pub async fn height_near(&self, now: DateTime<Utc>) -> Result<Option<f64>, SourceError> {
        let cached = self.load();

        if let Some(entry) = &cached {
            if self.is_fresh(entry, now) {
                debug!("serving wave forecast from cache");
                return Ok(nearest_height(&entry.waves, now));
            }
        }

        match self.refresh(now).await {
            Ok(entry) => Ok(nearest_height(&entry.waves, now)),
            Err(err) => match cached {
                Some(stale) => {
                    warn!("wave forecast refresh failed ({err}); serving stale series");
                    Ok(nearest_height(&stale.waves, now))
                }
                None => {
                    warn!("wave forecast refresh failed with empty cache: {err}");
                    Err(SourceError::StaleCacheMiss)
                }
            },
        }
    }

    fn load(&self) -> Option<CacheEntry> {
        let raw = self.store.get(CACHE_KEY)?;
        // A corrupted slot is treated as a cold cache.
        serde_json::from_str(&raw).ok()
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let fetched_at = match Utc.timestamp_millis_opt(entry.timestamp).single() {
            Some(t) => t,
            None => return false,
        };
        now - fetched_at < self.ttl && !self.boundary_crossed(fetched_at, now)
    }

    /// Whether any configured local wall-clock boundary lies in
    /// `(fetched_at, now]`.
    fn boundary_crossed(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let fetched_local = fetched_at.with_timezone(&self.local_offset).naive_local();
        let now_local = now.with_timezone(&self.local_offset).naive_local();

        self.boundary_hours.iter().any(|&hour| {
            let Some(same_day) = now_local.date().and_hms_opt(hour, 0, 0) else {
                return false;
            };
            // Most recent occurrence of this boundary at or before now.
            let boundary = if same_day <= now_local {
                same_day
            } else {
                same_day - Duration::days(1)
            };
            boundary > fetched_local
        })
    }

    async fn refresh(&self, now: DateTime<Utc>) -> Result<CacheEntry, SourceError> {
        debug!("refreshing wave forecast from {}", self.forecast_url);
        let response = self.client.get(&self.forecast_url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::UpstreamUnavailable(format!(
                "wave forecast API returned {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let parsed: ForecastResponse = serde_json::from_str(&body)?;

        let waves = parsed
            .hours
            .into_iter()
            .map(|hour| WaveForecastPoint {
                time: hour.time,
                height_ft: hour
                    .wave_height
                    .and_then(|h| h.sg)
                    .map(|meters| round1(m_to_ft(meters))),
            })
            .collect();

        let entry = CacheEntry {
            timestamp: now.timestamp_millis(),
            waves,
        };
        if let Ok(serialized) = serde_json::to_string(&entry) {
            // Whole-slot replace; a failed write just means a colder cache.
            self.store.set(CACHE_KEY, &serialized);
        }
        Ok(entry)
    }
}

/// Height of the point with minimum |time − now|; ties keep the first-seen
/// point, null heights are skipped.
fn nearest_height(points: &[WaveForecastPoint], now: DateTime<Utc>) -> Option<f64> {
    let mut best: Option<(i64, f64)> = None;
    for point in points {
        let Some(height) = point.height_ft else {
            continue;
        };
        let distance = (point.time - now).num_milliseconds().abs();
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, height));
        }
    }
    best.map(|(_, height)| height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str, ttl_minutes: i64) -> WavesConfig {
        WavesConfig {
            forecast_url: url.to_string(),
            ttl_minutes,
            refresh_boundary_hours: vec![0, 12],
            cache_dir: "/tmp".to_string(),
        }
    }

    fn seed_entry(store: &MemoryStore, fetched_at: DateTime<Utc>, points: &[(DateTime<Utc>, Option<f64>)]) {
        let entry = CacheEntry {
            timestamp: fetched_at.timestamp_millis(),
            waves: points
                .iter()
                .map(|&(time, height_ft)| WaveForecastPoint { time, height_ft })
                .collect(),
        };
        store.set(CACHE_KEY, &serde_json::to_string(&entry).unwrap());
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn nearest_point_wins_by_absolute_distance() {
        let now = utc(2026, 8, 29, 12, 0);
        let points = vec![
            WaveForecastPoint {
                time: now - Duration::hours(2),
                height_ft: Some(3.0),
            },
            WaveForecastPoint {
                time: now + Duration::hours(1),
                height_ft: Some(4.0),
            },
        ];
        assert_eq!(nearest_height(&points, now), Some(4.0));
    }

    #[test]
    fn nearest_skips_null_heights_and_ties_keep_first() {
        let now = utc(2026, 8, 29, 12, 0);
        let points = vec![
            WaveForecastPoint {
                time: now - Duration::hours(1),
                height_ft: None,
            },
            WaveForecastPoint {
                time: now - Duration::hours(1),
                height_ft: Some(2.5),
            },
            WaveForecastPoint {
                time: now + Duration::hours(1),
                height_ft: Some(9.9),
            },
        ];
        // The null point is skipped; of the two equidistant readings the
        // first-seen one wins.
        assert_eq!(nearest_height(&points, now), Some(2.5));
    }

    #[test]
    fn empty_or_all_null_series_yields_none() {
        let now = utc(2026, 8, 29, 12, 0);
        assert_eq!(nearest_height(&[], now), None);
        let all_null = vec![WaveForecastPoint {
            time: now,
            height_ft: None,
        }];
        assert_eq!(nearest_height(&all_null, now), None);
    }

    #[test]
    fn cache_entry_serializes_to_persistence_schema() {
        let entry = CacheEntry {
            timestamp: 1_756_400_000_000,
            waves: vec![WaveForecastPoint {
                time: utc(2026, 8, 29, 12, 0),
                height_ft: Some(2.3),
            }],
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&entry).unwrap()).unwrap();
        assert_eq!(json["timestamp"], 1_756_400_000_000_i64);
        assert_eq!(json["waves"][0]["waveFt"], 2.3);
        assert!(json["waves"][0]["time"].as_str().unwrap().starts_with("2026-08-29T12:00:00"));
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let fetched_at = utc(2026, 8, 29, 13, 0);
        // One millisecond short of the TTL: still fresh.
        let now = fetched_at + Duration::minutes(30) - Duration::milliseconds(1);
        seed_entry(&store, fetched_at, &[(now, Some(3.2))]);

        let cache = WaveForecastCache::new(
            Client::new(),
            &test_config(&server.uri(), 30),
            -300,
            store,
        );
        assert_eq!(cache.height_near(now).await.unwrap(), Some(3.2));
    }

    #[tokio::test]
    async fn ttl_expiry_triggers_refresh() {
        let server = MockServer::start().await;
        let fetched_at = utc(2026, 8, 29, 13, 0);
        let now = fetched_at + Duration::minutes(30) + Duration::milliseconds(1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"hours":[{{"time":"{}","waveHeight":{{"sg":1.0}}}}]}}"#,
                now.to_rfc3339()
            )))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        seed_entry(&store, fetched_at, &[(now, Some(9.9))]);

        let cache = WaveForecastCache::new(
            Client::new(),
            &test_config(&server.uri(), 30),
            -300,
            store.clone(),
        );
        // 1.0 m -> 3.3 ft; the old 9.9 ft entry was replaced wholesale.
        assert_eq!(cache.height_near(now).await.unwrap(), Some(3.3));
        let persisted: CacheEntry =
            serde_json::from_str(&store.get(CACHE_KEY).unwrap()).unwrap();
        assert_eq!(persisted.timestamp, now.timestamp_millis());
        assert_eq!(persisted.waves[0].height_ft, Some(3.3));
    }

    #[tokio::test]
    async fn boundary_crossing_triggers_refresh_within_ttl() {
        let server = MockServer::start().await;
        // 11:50 local (UTC-5) = 16:50 UTC; 12:05 local = 17:05 UTC. Noon
        // boundary crossed even though only 15 minutes elapsed.
        let fetched_at = utc(2026, 8, 29, 16, 50);
        let now = utc(2026, 8, 29, 17, 5);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"hours":[{{"time":"{}","waveHeight":{{"sg":2.0}}}}]}}"#,
                now.to_rfc3339()
            )))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        seed_entry(&store, fetched_at, &[(now, Some(1.1))]);

        let cache = WaveForecastCache::new(
            Client::new(),
            &test_config(&server.uri(), 180),
            -300,
            store,
        );
        assert_eq!(cache.height_near(now).await.unwrap(), Some(6.6));
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let fetched_at = utc(2026, 8, 29, 1, 0);
        let now = utc(2026, 8, 29, 9, 0);
        seed_entry(&store, fetched_at, &[(now, Some(2.6))]);

        let cache = WaveForecastCache::new(
            Client::new(),
            &test_config(&server.uri(), 30),
            -300,
            store,
        );
        assert_eq!(cache.height_near(now).await.unwrap(), Some(2.6));
    }

    #[tokio::test]
    async fn failed_refresh_with_empty_cache_is_stale_cache_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let cache = WaveForecastCache::new(
            Client::new(),
            &test_config(&server.uri(), 30),
            -300,
            Arc::new(MemoryStore::new()),
        );
        let err = cache.height_near(utc(2026, 8, 29, 9, 0)).await.unwrap_err();
        assert!(matches!(err, SourceError::StaleCacheMiss));
    }
}
