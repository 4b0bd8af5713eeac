//! # Aggregation Orchestrator
//!
//! Produces one [`AggregatedReport`] per invocation cycle, guaranteeing
//! forward progress regardless of which subset of sources fails.
//!
//! All source fetches launch concurrently with no ordering dependency and are
//! jointly awaited; no source's failure or latency blocks another's
//! completion. Each fetch runs under its own deadline and behind an isolation
//! boundary that converts any [`SourceError`] into that source's documented
//! fallback value. The orchestrator performs no retries: a failed source
//! simply reappears at its normal state on the next cycle.
//!
//! The report is a best-effort snapshot, not a consistent cut across sources.

use crate::buoy;
use crate::config::Config;
use crate::error::SourceError;
use crate::solar;
use crate::store::{FileStore, KvStore};
use crate::tides;
use crate::waves::WaveForecastCache;
use crate::{AggregatedReport, SolarTimes, StationObservation, TidePrediction, WaveSummary};
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The environmental data aggregation engine.
///
/// Owns the shared HTTP client and the wave forecast cache; everything else
/// is stateless per cycle.
pub struct Engine {
    config: Config,
    client: Client,
    waves: WaveForecastCache,
}

impl Engine {
    /// Build an engine with a file-backed cache store under the configured
    /// cache directory.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(FileStore::new(config.waves.cache_dir.clone()));
        Self::with_store(config, store)
    }

    /// Build an engine with an explicitly injected cache store.
    pub fn with_store(config: Config, store: Arc<dyn KvStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch.timeout_secs))
            .build()
            .unwrap_or_default();
        let waves = WaveForecastCache::new(
            client.clone(),
            &config.waves,
            config.location.utc_offset_minutes,
            store,
        );
        Engine {
            config,
            client,
            waves,
        }
    }

    /// Run one aggregation cycle against the current wall clock.
    pub async fn run_cycle(&self) -> AggregatedReport {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one aggregation cycle as of `now`.
    ///
    /// Never fails: every source outcome is settled to either its value or
    /// its fallback before assembly.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> AggregatedReport {
        let cfg = &self.config;
        let deadline = Duration::from_secs(cfg.fetch.timeout_secs);
        let local_date = now.with_timezone(&self.local_offset()).date_naive();

        let (gulf, bay, tide, wave) = tokio::join!(
            with_deadline(
                deadline,
                buoy::fetch_observation(
                    &self.client,
                    &cfg.fetch.buoy_base_url,
                    &cfg.stations.gulf_buoy
                )
            ),
            with_deadline(
                deadline,
                buoy::fetch_observation(
                    &self.client,
                    &cfg.fetch.buoy_base_url,
                    &cfg.stations.bay_buoy
                )
            ),
            with_deadline(
                deadline,
                tides::fetch_predictions(
                    &self.client,
                    &cfg.fetch.tide_base_url,
                    &cfg.stations.tide_station,
                    local_date
                )
            ),
            with_deadline(deadline, self.waves.height_near(now)),
        );

        // No network dependency; computed after the fetches settle.
        let sun = solar::solar_times(
            cfg.location.latitude,
            cfg.location.longitude,
            local_date,
            cfg.location.utc_offset_minutes,
        );

        let report = assemble(gulf, bay, wave, tide, sun);
        info!(degraded = report.degraded, "aggregation cycle complete");
        report
    }

    fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.config.location.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

/// Bound a source fetch by a deadline; expiry is indistinguishable from a
/// network failure.
async fn with_deadline<T, F>(deadline: Duration, fetch: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(deadline, fetch).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SourceError::UpstreamUnavailable(
            "deadline exceeded".to_string(),
        )),
    }
}

/// The isolation boundary: a failed source becomes its fallback value and
/// flips the degraded flag; nothing propagates past here.
fn settle<T>(
    outcome: Result<T, SourceError>,
    fallback: T,
    source: &str,
    degraded: &mut bool,
) -> T {
    match outcome {
        Ok(value) => value,
        Err(err) => {
            warn!("{source} source degraded: {err}");
            *degraded = true;
            fallback
        }
    }
}

/// Assemble the report from settled source outcomes.
fn assemble(
    gulf: Result<StationObservation, SourceError>,
    bay: Result<StationObservation, SourceError>,
    wave_height: Result<Option<f64>, SourceError>,
    tide: Result<TidePrediction, SourceError>,
    sun: SolarTimes,
) -> AggregatedReport {
    let mut degraded = false;
    let gulf = settle(gulf, StationObservation::unavailable(), "gulf buoy", &mut degraded);
    let bay = settle(bay, StationObservation::unavailable(), "bay buoy", &mut degraded);
    let height_ft = settle(wave_height, None, "wave forecast", &mut degraded);
    let tides = settle(tide, TidePrediction::default(), "tide predictions", &mut degraded);

    AggregatedReport {
        gulf,
        bay,
        waves: WaveSummary { height_ft },
        tides,
        sun,
        degraded,
    }
}
