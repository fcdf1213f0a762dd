/**
 * PROVIDER REGISTRY - Plants known to the bridge
 *
 * ROLE: Creates a SiteProvider when a plant announces its location, routes
 * status messages to the matching provider, and hands the scheduler a
 * consistent snapshot of all providers.
 *
 * ARCHITECTURE: one registry shared (Arc) by the MQTT listener and the
 * scheduler. Providers are Arc'd so a snapshot never sees a half-built entry;
 * re-announcing swaps the whole Arc. Entries are never removed: a silent plant
 * goes stale and comes back with its next status message.
 */

use crate::bus::Bus;
use crate::clock::Clock;
use crate::models::{parse_announcement, Coordinates};
use crate::provider::{ReportOutcome, SiteProvider};
use crate::source::WeatherSource;
use crate::topics::{INFO_PATTERN, STATUS_PATTERN};
use log::{debug, info, warn};
use parking_lot::RwLock;
use rumqttc::QoS;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub type ProvidersMap = HashMap<String, Arc<SiteProvider>>;

pub struct ProviderRegistry {
    providers: RwLock<ProvidersMap>,
    bus: Arc<dyn Bus>,
    source: Arc<dyn WeatherSource>,
    clock: Arc<dyn Clock>,
    status_subscribed: AtomicBool,
}

impl ProviderRegistry {
    pub fn new(bus: Arc<dyn Bus>, source: Arc<dyn WeatherSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            bus,
            source,
            clock,
            status_subscribed: AtomicBool::new(false),
        }
    }

    /// Inserts or replaces the provider for `identity`.
    ///
    /// A replacement starts with `last_seen = now`: re-announcing counts as
    /// a liveness signal.
    pub fn register(&self, identity: &str, coordinates: Coordinates) -> Arc<SiteProvider> {
        let provider = Arc::new(SiteProvider::new(identity, coordinates, self.clock.clone()));
        let previous = self
            .providers
            .write()
            .insert(identity.to_string(), provider.clone());

        match previous {
            Some(old) if old.coordinates() != coordinates => info!(
                "[registry] REGISTER {} moved ({}, {}) -> ({}, {})",
                identity,
                old.coordinates().longitude,
                old.coordinates().latitude,
                coordinates.longitude,
                coordinates.latitude
            ),
            Some(_) => info!("[registry] REGISTER {} (re-announced)", identity),
            None => info!(
                "[registry] REGISTER {} at ({}, {})",
                identity, coordinates.longitude, coordinates.latitude
            ),
        }
        provider
    }

    /// Registers the plant described by an `enmon/{id}/info` payload.
    ///
    /// Synchronous: called on the event loop so announcements for one plant
    /// take effect in delivery order. Payloads without a usable location are
    /// dropped and `None` is returned.
    pub fn accept_announcement(&self, identity: &str, payload: &[u8]) -> Option<Arc<SiteProvider>> {
        match parse_announcement(payload) {
            Ok(coordinates) => Some(self.register(identity, coordinates)),
            Err(e) => {
                debug!("[registry] ignoring info from {}: {}", identity, e);
                None
            }
        }
    }

    /// Follow-up to a registration: status subscription, then one report
    pub async fn first_report(&self, provider: &SiteProvider) -> ReportOutcome {
        self.ensure_status_subscription().await;
        self.report(provider).await
    }

    /// Handles an `enmon/{id}/info` payload end to end
    pub async fn on_announcement(&self, identity: &str, payload: &[u8]) -> Option<ReportOutcome> {
        let provider = self.accept_announcement(identity, payload)?;
        Some(self.first_report(&provider).await)
    }

    /// Routes a status message. Returns false for unknown plants.
    pub fn on_liveness_signal(&self, identity: &str) -> bool {
        match self.get(identity) {
            Some(provider) => {
                provider.mark_alive();
                true
            }
            None => {
                debug!("[registry] status from unknown plant {}", identity);
                false
            }
        }
    }

    /// Subscribes to the inbound topics after a (re)connect.
    ///
    /// The session may not have kept earlier subscriptions, so the status
    /// pattern is requested again whenever plants are already known.
    pub async fn on_connected(&self) {
        self.status_subscribed.store(false, Ordering::SeqCst);

        if let Err(e) = self.bus.subscribe(INFO_PATTERN, QoS::AtLeastOnce).await {
            warn!("[registry] subscribe {} failed: {}", INFO_PATTERN, e);
        }
        if !self.is_empty() {
            self.ensure_status_subscription().await;
        }
    }

    async fn ensure_status_subscription(&self) {
        if self.status_subscribed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.bus.subscribe(STATUS_PATTERN, QoS::AtMostOnce).await {
            warn!("[registry] subscribe {} failed: {}", STATUS_PATTERN, e);
            self.status_subscribed.store(false, Ordering::SeqCst);
        }
    }

    /// One report attempt for `provider` through this registry's bus and source
    pub async fn report(&self, provider: &SiteProvider) -> ReportOutcome {
        provider.attempt_report(self.source.as_ref(), self.bus.as_ref()).await
    }

    pub fn get(&self, identity: &str) -> Option<Arc<SiteProvider>> {
        self.providers.read().get(identity).cloned()
    }

    /// Current providers; later registrations don't affect the returned list
    pub fn snapshot(&self) -> Vec<Arc<SiteProvider>> {
        self.providers.read().values().cloned().collect()
    }

    /// Applies `f` to every provider of a snapshot, without holding the lock
    pub fn for_each_provider<F: FnMut(&Arc<SiteProvider>)>(&self, mut f: F) {
        for provider in self.snapshot() {
            f(&provider);
        }
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

pub type SharedProviderRegistry = Arc<ProviderRegistry>;
