use crate::config::OwmConf;
use crate::error::{Error, Result};
use crate::models::{Coordinates, WeatherSample};
use crate::source::WeatherSource;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Current-conditions client for the OpenWeatherMap `/weather` endpoint
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OwmConf,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    dt: i64,
    weather: Vec<OwmWeather>,
    main: OwmMain,
    sys: OwmSys,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64, // Kelvin, no `units` parameter is sent
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    sunrise: i64,
    sunset: i64,
}

impl OpenWeatherMapClient {
    pub fn new(config: OwmConf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("enmon-weather/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Request URL for `coordinates`. Contains the API key: never log it.
    fn current_url(&self, coordinates: Coordinates) -> String {
        format!(
            "{}/weather?lat={}&lon={}&appid={}",
            self.config.base_url, coordinates.latitude, coordinates.longitude, self.config.api_key
        )
    }

    async fn fetch_current(&self, coordinates: Coordinates) -> Result<WeatherSample> {
        debug!(
            "[owm] GET {}/weather lat={} lon={}",
            self.config.base_url, coordinates.latitude, coordinates.longitude
        );

        let response = self
            .client
            .get(self.current_url(coordinates))
            .send()
            .await
            .map_err(|e| Error::weather_source(format!("OpenWeatherMap: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::weather_source(format!(
                "OpenWeatherMap returned {}: {}",
                status,
                body.trim()
            )));
        }

        parse_response(&response.text().await?)
    }
}

fn parse_response(body: &str) -> Result<WeatherSample> {
    let parsed: OwmCurrentResponse = serde_json::from_str(body)?;
    convert_response(parsed)
}

fn convert_response(response: OwmCurrentResponse) -> Result<WeatherSample> {
    let code = response
        .weather
        .first()
        .map(|w| w.id)
        .ok_or_else(|| Error::weather_source("OpenWeatherMap response has no weather entry"))?;

    Ok(WeatherSample {
        code,
        sunrise: OffsetDateTime::from_unix_timestamp(response.sys.sunrise)?,
        sunset: OffsetDateTime::from_unix_timestamp(response.sys.sunset)?,
        reference: OffsetDateTime::from_unix_timestamp(response.dt)?,
        temperature_kelvin: response.main.temp,
    })
}

#[async_trait]
impl WeatherSource for OpenWeatherMapClient {
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSample> {
        self.fetch_current(coordinates).await
    }

    fn source_name(&self) -> &'static str {
        "openweathermap"
    }
}
