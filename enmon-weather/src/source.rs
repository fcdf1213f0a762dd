//! Weather source seam
//!
//! A source answers one question: what is the weather at these coordinates
//! right now. It performs a single remote call per invocation and returns
//! an error on any failure; retrying is left to the next report cycle.

use crate::error::Result;
use crate::models::{Coordinates, WeatherSample};
use async_trait::async_trait;

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions at `coordinates`
    async fn current(&self, coordinates: Coordinates) -> Result<WeatherSample>;

    /// Name used in log lines
    fn source_name(&self) -> &'static str;
}
