//! Runtime configuration, read from the environment
//!
//! Every variable has a default except `OWM_API_KEY`. The binary loads a
//! `.env` file first, so the same names work from a file or the shell.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BROKER: &str = "127.0.0.1";
pub const DEFAULT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_CLIENT_ID: &str = "enmon_weather";
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
pub const DEFAULT_REPORTING_INTERVAL_SECS: u64 = 900;
pub const DEFAULT_OWM_API_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConf,
    pub owm: OwmConf,
    pub reporting_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
}

#[derive(Clone)]
pub struct OwmConf {
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for OwmConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwmConf")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any name -> value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            mqtt: MqttConf {
                host: text("MQTT_BROKER", DEFAULT_BROKER),
                port: number(&lookup, "MQTT_BROKER_PORT", DEFAULT_BROKER_PORT)?,
                client_id: text("MQTT_SUBSCRIBER_ID", DEFAULT_CLIENT_ID),
                keep_alive_secs: number(&lookup, "MQTT_KEEP_ALIVE", DEFAULT_KEEP_ALIVE_SECS)?,
            },
            owm: OwmConf {
                api_key: lookup("OWM_API_KEY").map(|v| v.trim().to_string()).unwrap_or_default(),
                base_url: text("OWM_API_URL", DEFAULT_OWM_API_URL)
                    .trim_end_matches('/')
                    .to_string(),
            },
            reporting_interval: Duration::from_secs(number(
                &lookup,
                "REPORTING_INTERVAL",
                DEFAULT_REPORTING_INTERVAL_SECS,
            )?),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.owm.api_key.is_empty() {
            return Err(Error::config(
                "OWM_API_KEY is required. Set it via: export OWM_API_KEY=your_key",
            ));
        }
        if self.mqtt.host.is_empty() {
            return Err(Error::config("MQTT_BROKER must not be empty"));
        }
        if self.mqtt.port == 0 {
            return Err(Error::config("MQTT_BROKER_PORT must be between 1 and 65535"));
        }
        if self.mqtt.keep_alive_secs == 0 {
            return Err(Error::config("MQTT_KEEP_ALIVE must be greater than 0"));
        }
        if self.reporting_interval.is_zero() {
            return Err(Error::config("REPORTING_INTERVAL must be greater than 0"));
        }
        if !(self.owm.base_url.starts_with("http://") || self.owm.base_url.starts_with("https://")) {
            return Err(Error::config(format!(
                "OWM_API_URL '{}' must be an http(s) URL",
                self.owm.base_url
            )));
        }
        Ok(())
    }
}

fn number<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|e| Error::config(format!("{} '{}' is invalid: {}", name, v, e))),
    }
}
