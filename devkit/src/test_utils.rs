/*!
Test harness for the weather bridge

- Mock MQTT client set up automatically
- Helpers to inject plant info/status messages
- Assertions on the reports the bridge published
*/

use crate::mqtt_stub::{EnmonMessageBuilder, MockMqttClient};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use anyhow::Result;

pub struct TestHarness {
    pub mqtt_client: MockMqttClient,
    expectations: Vec<Expectation>,
}

#[derive(Debug)]
struct Expectation {
    topic: String,
    expected_count: usize,
}

impl TestHarness {
    pub fn new() -> Self {
        env_logger::builder().is_test(true).try_init().ok();

        Self {
            mqtt_client: MockMqttClient::new(),
            expectations: Vec::new(),
        }
    }

    /// Expect exactly `count` messages on `topic` when verifying
    pub fn expect_messages(&mut self, topic: &str, count: usize) -> &mut Self {
        self.expectations.push(Expectation {
            topic: topic.to_string(),
            expected_count: count,
        });
        self
    }

    /// Injects an `enmon/{id}/info` announcement
    pub async fn send_info(&self, site_id: &str, longitude: f64, latitude: f64) -> Result<()> {
        let payload = serde_json::to_vec(&EnmonMessageBuilder::info(longitude, latitude))?;
        self.mqtt_client
            .simulate_incoming(EnmonMessageBuilder::info_topic(site_id), payload)
            .await?;
        log::info!("[harness] sent info for {}", site_id);
        Ok(())
    }

    /// Injects an `enmon/{id}/status` liveness message
    pub async fn send_status(&self, site_id: &str) -> Result<()> {
        self.mqtt_client
            .simulate_incoming(EnmonMessageBuilder::status_topic(site_id), EnmonMessageBuilder::status())
            .await?;
        log::info!("[harness] sent status for {}", site_id);
        Ok(())
    }

    /// Polls until a message shows up on `topic` or the timeout expires
    pub async fn wait_for_message(&self, topic: &str, timeout_ms: u64) -> Result<Option<Value>> {
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if let Some(msg) = self.mqtt_client.get_last_json_message::<Value>(topic)? {
                log::info!("[harness] received expected message on {}", topic);
                return Ok(Some(msg));
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        log::warn!("[harness] timeout waiting for message on {}", topic);
        Ok(None)
    }

    pub async fn verify_expectations(&self) -> Result<()> {
        for expectation in &self.expectations {
            let actual_count = self.mqtt_client.find_messages_by_topic(&expectation.topic).len();

            if actual_count != expectation.expected_count {
                anyhow::bail!(
                    "Expectation failed for topic '{}': expected {} messages, got {}",
                    expectation.topic, expectation.expected_count, actual_count
                );
            }
        }
        Ok(())
    }

    pub fn assert_message_sent(&self, topic: &str, expected_payload: &Value) -> Result<()> {
        for msg in self.mqtt_client.find_messages_by_topic(topic) {
            let payload: Value = serde_json::from_slice(&msg.payload)?;
            if payload == *expected_payload {
                return Ok(());
            }
        }

        anyhow::bail!("Expected message not found on topic: {}", topic);
    }

    /// Checks a top-level field of the latest message on `topic`
    pub fn assert_field_equals(&self, topic: &str, field: &str, expected: &Value) -> Result<()> {
        let Some(msg) = self.mqtt_client.get_last_json_message::<Value>(topic)? else {
            anyhow::bail!("No message on {}", topic);
        };
        match msg.get(field) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!(
                "Field '{}' mismatch: expected {:?}, got {:?}",
                field, expected, actual
            ),
            None => anyhow::bail!("Field '{}' not found in {}", field, topic),
        }
    }

    /// All published reports must be retained
    pub fn assert_all_retained(&self, topic: &str) -> Result<()> {
        for msg in self.mqtt_client.find_messages_by_topic(topic) {
            if !msg.retain {
                anyhow::bail!("Message on {} was not retained", topic);
            }
        }
        Ok(())
    }

    pub fn get_stats(&self) -> TestStats {
        let messages = self.mqtt_client.get_published_messages();
        let mut topic_counts = HashMap::new();

        for msg in &messages {
            *topic_counts.entry(msg.topic.clone()).or_insert(0) += 1;
        }

        TestStats {
            total_messages: messages.len(),
            topic_counts,
            subscriptions: self.mqtt_client.get_subscriptions(),
        }
    }

    pub fn reset(&mut self) {
        self.mqtt_client.clear();
        self.expectations.clear();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TestStats {
    pub total_messages: usize,
    pub topic_counts: HashMap<String, usize>,
    pub subscriptions: Vec<String>,
}
