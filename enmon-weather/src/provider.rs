/**
 * SITE PROVIDER - Weather reporting for a single plant
 *
 * ROLE: Holds a plant's identity, location and last liveness time, and turns
 * one report attempt into at most one retained publish on `enmon/{id}/weather`.
 *
 * LIFECYCLE: FRESH while a status message arrived within TIMEOUT_SECS, STALE
 * afterwards. Staleness is only noticed when a report is attempted; any
 * status message makes the provider FRESH again.
 */

use crate::bus::Bus;
use crate::classifier::classify;
use crate::clock::Clock;
use crate::models::{Coordinates, WeatherReport};
use crate::source::WeatherSource;
use crate::topics::weather_topic;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Seconds of silence after which a plant stops getting reports
pub const TIMEOUT_SECS: i64 = 3600;

/// Result of one report attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Report published
    Reported(WeatherReport),
    /// Plant silent for longer than the timeout; nothing fetched or sent
    SkippedStale,
    /// Fetch or publish failed; the next cycle tries again
    Failed(String),
}

pub struct SiteProvider {
    identity: String,
    coordinates: Coordinates,
    topic: String,
    last_seen: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl SiteProvider {
    pub fn new(identity: impl Into<String>, coordinates: Coordinates, clock: Arc<dyn Clock>) -> Self {
        let identity = identity.into();
        Self {
            topic: weather_topic(&identity),
            last_seen: AtomicI64::new(clock.now()),
            identity,
            coordinates,
            clock,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Unix seconds of the latest liveness signal (or creation)
    pub fn last_seen(&self) -> i64 {
        self.last_seen.load(Ordering::Acquire)
    }

    /// Records a liveness signal. `last_seen` never moves backwards.
    pub fn mark_alive(&self) {
        let now = self.clock.now();
        self.last_seen.fetch_max(now, Ordering::AcqRel);
        debug!("[provider] keepalive {}", self.identity);
    }

    pub fn is_stale(&self) -> bool {
        self.clock.now() - self.last_seen() > TIMEOUT_SECS
    }

    /// Fetches, classifies and publishes the current weather for this plant.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`ReportOutcome::Failed`] so one plant cannot disturb the others.
    pub async fn attempt_report(&self, source: &dyn WeatherSource, bus: &dyn Bus) -> ReportOutcome {
        if self.is_stale() {
            debug!("[provider] {} silent since {}, skipping report", self.identity, self.last_seen());
            return ReportOutcome::SkippedStale;
        }

        let sample = match source.current(self.coordinates).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("[provider] FAIL {}: {} fetch failed: {}", self.identity, source.source_name(), e);
                return ReportOutcome::Failed(e.to_string());
            }
        };

        let (condition, temperature) = classify(&sample);
        let report = WeatherReport::new(condition, temperature);

        let payload = match serde_json::to_vec(&report) {
            Ok(payload) => payload,
            Err(e) => return ReportOutcome::Failed(e.to_string()),
        };

        if let Err(e) = bus.publish(&self.topic, payload, true).await {
            warn!("[provider] FAIL {}: publish failed: {}", self.identity, e);
            return ReportOutcome::Failed(e.to_string());
        }

        info!("[provider] REPORT {}: {} {}°C", self.identity, report.tag, report.temperature);
        ReportOutcome::Reported(report)
    }
}

impl std::fmt::Debug for SiteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteProvider")
            .field("identity", &self.identity)
            .field("coordinates", &self.coordinates)
            .field("topic", &self.topic)
            .field("last_seen", &self.last_seen())
            .finish()
    }
}
