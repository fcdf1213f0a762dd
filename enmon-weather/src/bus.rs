//! Publish/subscribe seam between the registry and the MQTT client.

use crate::error::Result;
use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

#[async_trait]
pub trait Bus: Send + Sync {
    /// Publishes at QoS 1; `retain` asks the broker to keep the last value
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()>;

    async fn subscribe(&self, pattern: &str, qos: QoS) -> Result<()>;
}

#[async_trait]
impl Bus for AsyncClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()> {
        AsyncClient::publish(self, topic, QoS::AtLeastOnce, retain, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, pattern: &str, qos: QoS) -> Result<()> {
        AsyncClient::subscribe(self, pattern, qos).await?;
        Ok(())
    }
}
