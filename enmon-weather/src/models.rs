use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }
}

/// One observation from the weather source, not kept after classification
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample {
    /// Raw condition code (OpenWeatherMap id scheme)
    pub code: u32,
    pub sunrise: OffsetDateTime,
    pub sunset: OffsetDateTime,
    /// Observation time
    pub reference: OffsetDateTime,
    pub temperature_kelvin: f64,
}

/// Condition taxonomy published to the bus. Discriminants are the wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    Unknown = 1,
    Sun = 2,
    Clouds = 3,
    Rain = 4,
    Thunderstorm = 5,
    Night = 6,
    FewClouds = 7,
}

impl WeatherCondition {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn tag(self) -> &'static str {
        match self {
            WeatherCondition::Unknown => "UNKNOWN",
            WeatherCondition::Sun => "SUN",
            WeatherCondition::Clouds => "CLOUDS",
            WeatherCondition::Rain => "RAIN",
            WeatherCondition::Thunderstorm => "THUNDERSTORM",
            WeatherCondition::Night => "NIGHT",
            WeatherCondition::FewClouds => "FEW_CLOUDS",
        }
    }
}

/// Payload of `enmon/{id}/weather`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub code: u8,
    pub tag: String,
    /// Degrees Celsius, rounded
    pub temperature: i32,
}

impl WeatherReport {
    pub fn new(condition: WeatherCondition, temperature: i32) -> Self {
        Self {
            code: condition.code(),
            tag: condition.tag().to_string(),
            temperature,
        }
    }
}

// Plants send coordinates either as JSON numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn to_f64(&self, field: &str) -> Result<f64> {
        let value = match self {
            NumberOrText::Number(n) => *n,
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::malformed(format!("{field} is not numeric: {s:?}")))?,
        };
        if !value.is_finite() {
            return Err(Error::malformed(format!("{field} is not finite")));
        }
        Ok(value)
    }
}

/// Incoming `enmon/{id}/info` message; only the location matters here
#[derive(Debug, Deserialize)]
struct SiteInfoIn {
    longitude: Option<NumberOrText>,
    latitude: Option<NumberOrText>,
}

/// Extracts the site location from an info payload
pub fn parse_announcement(payload: &[u8]) -> Result<Coordinates> {
    let info: SiteInfoIn = serde_json::from_slice(payload)
        .map_err(|e| Error::malformed(format!("invalid JSON: {e}")))?;

    let longitude = info
        .longitude
        .ok_or_else(|| Error::malformed("missing longitude"))?
        .to_f64("longitude")?;
    let latitude = info
        .latitude
        .ok_or_else(|| Error::malformed("missing latitude"))?
        .to_f64("latitude")?;

    Ok(Coordinates::new(longitude, latitude))
}
