/*!
# enmon-weather - Weather reports for enmon plants

Plants announce their location on `enmon/{id}/info` and signal liveness on
`enmon/{id}/status`. The bridge fetches current conditions for every live
plant at a fixed interval and publishes a retained report on
`enmon/{id}/weather`.
*/

pub mod bus;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod mqtt;
pub mod owm;
pub mod provider;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod source;
pub mod topics;

#[cfg(test)]
mod testing;

pub use bus::Bus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use health::LinkStatus;
pub use models::{Coordinates, WeatherCondition, WeatherReport, WeatherSample};
pub use owm::OpenWeatherMapClient;
pub use provider::{ReportOutcome, SiteProvider, TIMEOUT_SECS};
pub use registry::{ProviderRegistry, SharedProviderRegistry};
pub use scheduler::{CycleSummary, ReportingScheduler};
pub use source::WeatherSource;
