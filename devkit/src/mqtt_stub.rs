/*!
Mock MQTT client for working without a broker

Records every publish and subscription so tests can assert on what the
bridge sent, and can be switched into a failing mode to simulate a
broken connection.
*/

use rumqttc::QoS;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Mock client mirroring the `rumqttc::AsyncClient` calls the bridge makes
#[derive(Clone)]
pub struct MockMqttClient {
    published_messages: Arc<Mutex<Vec<MockMessage>>>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    message_sender: Arc<Mutex<Option<mpsc::UnboundedSender<MockMessage>>>>,
    fail_publish: Arc<AtomicBool>,
}

impl MockMqttClient {
    pub fn new() -> Self {
        Self {
            published_messages: Arc::new(Mutex::new(Vec::new())),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            message_sender: Arc::new(Mutex::new(None)),
            fail_publish: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Channel receiving the messages injected with `simulate_incoming`
    pub fn setup_receiver(&self) -> mpsc::UnboundedReceiver<MockMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.message_sender.lock().unwrap() = Some(sender);
        receiver
    }

    /// Makes every following publish fail until switched back
    pub fn set_publish_failure(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub async fn publish<S, V>(&self, topic: S, qos: QoS, retain: bool, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let topic = topic.into();
        if self.fail_publish.load(Ordering::SeqCst) {
            log::warn!("[mock] publish to {} rejected", topic);
            anyhow::bail!("mock broker unavailable");
        }

        let message = MockMessage {
            topic,
            payload: payload.into(),
            qos,
            retain,
        };

        self.published_messages.lock().unwrap().push(message.clone());

        log::info!("[mock] published to {}: {} bytes", message.topic, message.payload.len());
        Ok(())
    }

    pub async fn subscribe<S: Into<String>>(&self, topic: S, _qos: QoS) -> Result<()> {
        let topic = topic.into();
        self.subscriptions.lock().unwrap().push(topic.clone());
        log::info!("[mock] subscribed to {}", topic);
        Ok(())
    }

    /// Injects an inbound message as if the broker had delivered it
    pub async fn simulate_incoming<S, V>(&self, topic: S, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtLeastOnce,
            retain: false,
        };

        if let Some(sender) = self.message_sender.lock().unwrap().as_ref() {
            sender.send(message.clone()).map_err(|e| anyhow::anyhow!("Send error: {}", e))?;
        }

        log::info!("[mock] simulated incoming: {}", message.topic);
        Ok(())
    }

    pub fn get_published_messages(&self) -> Vec<MockMessage> {
        self.published_messages.lock().unwrap().clone()
    }

    pub fn get_subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn find_messages_by_topic(&self, topic: &str) -> Vec<MockMessage> {
        self.published_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|msg| msg.topic == topic)
            .cloned()
            .collect()
    }

    /// Last message on `topic`, parsed as JSON
    pub fn get_last_json_message<T>(&self, topic: &str) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let messages = self.find_messages_by_topic(topic);
        if let Some(last_msg) = messages.last() {
            let parsed: T = serde_json::from_slice(&last_msg.payload)?;
            Ok(Some(parsed))
        } else {
            Ok(None)
        }
    }

    pub fn clear(&self) {
        self.published_messages.lock().unwrap().clear();
        self.subscriptions.lock().unwrap().clear();
    }
}

impl Default for MockMqttClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds topics and payloads the way enmon plants send them
pub struct EnmonMessageBuilder;

impl EnmonMessageBuilder {
    pub fn info_topic(site_id: &str) -> String {
        format!("enmon/{}/info", site_id)
    }

    pub fn status_topic(site_id: &str) -> String {
        format!("enmon/{}/status", site_id)
    }

    pub fn weather_topic(site_id: &str) -> String {
        format!("enmon/{}/weather", site_id)
    }

    /// Info message with numeric coordinates
    pub fn info(longitude: f64, latitude: f64) -> Value {
        serde_json::json!({
            "longitude": longitude,
            "latitude": latitude,
        })
    }

    /// Info message with coordinates as strings, as older firmware sends them
    pub fn info_text(longitude: &str, latitude: &str) -> Value {
        serde_json::json!({
            "longitude": longitude,
            "latitude": latitude,
        })
    }

    /// Status payloads carry no meaning; any bytes will do
    pub fn status() -> Vec<u8> {
        b"online".to_vec()
    }
}
