//! Maps a raw weather sample onto the published condition taxonomy.

use crate::models::{WeatherCondition, WeatherSample};

const KELVIN_OFFSET: f64 = 273.15;

/// True when the observation falls outside the open sunrise..sunset window
pub fn is_night(sample: &WeatherSample) -> bool {
    !(sample.sunrise < sample.reference && sample.reference < sample.sunset)
}

/// Sky condition for a raw code, ignoring daylight
pub fn condition_for_code(code: u32) -> WeatherCondition {
    match code {
        200..=299 => WeatherCondition::Thunderstorm,
        300..=699 => WeatherCondition::Rain,
        701..=799 | 802..=899 => WeatherCondition::Clouds,
        801 => WeatherCondition::FewClouds,
        800 => WeatherCondition::Sun,
        _ => WeatherCondition::Unknown,
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> i32 {
    (kelvin - KELVIN_OFFSET).round() as i32
}

/// Night wins over any sky code.
pub fn classify(sample: &WeatherSample) -> (WeatherCondition, i32) {
    let condition = if is_night(sample) {
        WeatherCondition::Night
    } else {
        condition_for_code(sample.code)
    };
    (condition, kelvin_to_celsius(sample.temperature_kelvin))
}
