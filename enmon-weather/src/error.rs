//! Error types for the weather bridge

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Publish/subscribe failure on the bus
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// HTTP client errors (weather API)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The weather source answered but the answer is unusable
    #[error("Weather source error: {0}")]
    WeatherSource(String),

    /// Announcement payload without usable coordinates
    #[error("Malformed announcement: {0}")]
    MalformedAnnouncement(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timestamp out of range
    #[error("Time error: {0}")]
    Time(#[from] time::error::ComponentRange),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn mqtt(msg: impl Into<String>) -> Self {
        Self::Mqtt(msg.into())
    }

    pub fn weather_source(msg: impl Into<String>) -> Self {
        Self::WeatherSource(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedAnnouncement(msg.into())
    }
}

impl From<rumqttc::ClientError> for Error {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Mqtt(err.to_string())
    }
}
