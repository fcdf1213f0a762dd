//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use enmon_devkit::MockMqttClient;
use enmon_weather::clock::{Clock, ManualClock};
use enmon_weather::error::{Error, Result};
use enmon_weather::models::{Coordinates, WeatherSample};
use enmon_weather::registry::{ProviderRegistry, SharedProviderRegistry};
use enmon_weather::{Bus, WeatherSource};
use rumqttc::QoS;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

/// Bus over the devkit mock client
#[derive(Clone)]
pub struct MockBus(pub MockMqttClient);

#[async_trait]
impl Bus for MockBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()> {
        self.0
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| Error::mqtt(e.to_string()))
    }

    async fn subscribe(&self, pattern: &str, qos: QoS) -> Result<()> {
        self.0
            .subscribe(pattern, qos)
            .await
            .map_err(|e| Error::mqtt(e.to_string()))
    }
}

/// Daytime weather source with a settable condition code
pub struct FakeWeather {
    clock: Arc<ManualClock>,
    code: Mutex<u32>,
    down: Mutex<bool>,
    pub requests: Mutex<Vec<Coordinates>>,
}

impl FakeWeather {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            code: Mutex::new(800),
            down: Mutex::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_code(&self, code: u32) {
        *self.code.lock().unwrap() = code;
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSample> {
        self.requests.lock().unwrap().push(coordinates);
        if *self.down.lock().unwrap() {
            return Err(Error::weather_source("service unavailable"));
        }
        let now = self.clock.now();
        Ok(WeatherSample {
            code: *self.code.lock().unwrap(),
            sunrise: OffsetDateTime::from_unix_timestamp(now - 3600)?,
            sunset: OffsetDateTime::from_unix_timestamp(now + 3600)?,
            reference: OffsetDateTime::from_unix_timestamp(now)?,
            temperature_kelvin: 288.15,
        })
    }

    fn source_name(&self) -> &'static str {
        "fake"
    }
}

pub struct Bridge {
    pub registry: SharedProviderRegistry,
    pub mqtt: MockMqttClient,
    pub weather: Arc<FakeWeather>,
    pub clock: Arc<ManualClock>,
}

/// Registry wired to the mock bus, a fake source and a manual clock at `start`
pub fn bridge(mqtt: MockMqttClient, start: i64) -> Bridge {
    let clock = Arc::new(ManualClock::new(start));
    let weather = Arc::new(FakeWeather::new(clock.clone()));
    let registry = Arc::new(ProviderRegistry::new(
        Arc::new(MockBus(mqtt.clone())),
        weather.clone(),
        clock.clone(),
    ));
    Bridge { registry, mqtt, weather, clock }
}
