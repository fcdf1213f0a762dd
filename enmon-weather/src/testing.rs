//! Test doubles shared by the unit tests.

use crate::bus::Bus;
use crate::error::{Error, Result};
use crate::models::{Coordinates, WeatherSample};
use crate::source::WeatherSource;
use async_trait::async_trait;
use enmon_devkit::MockMqttClient;
use parking_lot::Mutex;
use rumqttc::QoS;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Notify;

#[async_trait]
impl Bus for MockMqttClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()> {
        MockMqttClient::publish(self, topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| Error::mqtt(e.to_string()))
    }

    async fn subscribe(&self, pattern: &str, qos: QoS) -> Result<()> {
        MockMqttClient::subscribe(self, pattern, qos)
            .await
            .map_err(|e| Error::mqtt(e.to_string()))
    }
}

/// Returns a fixed daytime sample and records every request
pub struct StubWeatherSource {
    reference: i64,
    code: Mutex<u32>,
    failing: Mutex<Vec<Coordinates>>,
    held: Mutex<Vec<(Coordinates, Arc<Notify>)>>,
    requests: Mutex<Vec<Coordinates>>,
}

impl StubWeatherSource {
    /// Clear sky at 20 °C, observed at `reference` (unix seconds), mid-day
    pub fn sunny(reference: i64) -> Self {
        Self {
            reference,
            code: Mutex::new(800),
            failing: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_code(&self, code: u32) {
        *self.code.lock() = code;
    }

    pub fn fail_for(&self, coordinates: Coordinates) {
        self.failing.lock().push(coordinates);
    }

    /// Fetches for `coordinates` wait until the returned gate is notified
    pub fn hold(&self, coordinates: Coordinates) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held.lock().push((coordinates, gate.clone()));
        gate
    }

    pub fn requests(&self) -> Vec<Coordinates> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl WeatherSource for StubWeatherSource {
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSample> {
        self.requests.lock().push(coordinates);
        let gate = self
            .held
            .lock()
            .iter()
            .find(|(held, _)| *held == coordinates)
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().contains(&coordinates) {
            return Err(Error::weather_source("stub outage"));
        }
        Ok(WeatherSample {
            code: *self.code.lock(),
            sunrise: OffsetDateTime::from_unix_timestamp(self.reference - 6 * 3600)?,
            sunset: OffsetDateTime::from_unix_timestamp(self.reference + 6 * 3600)?,
            reference: OffsetDateTime::from_unix_timestamp(self.reference)?,
            temperature_kelvin: 293.15,
        })
    }

    fn source_name(&self) -> &'static str {
        "stub"
    }
}
