/*!
# enmon devkit - stubs and helpers for testing the weather bridge

- Mock MQTT client, no broker needed
- Builders for plant info/status messages
- Test harness with assertions on published reports
*/

pub mod mqtt_stub;
pub mod test_utils;

pub use mqtt_stub::{EnmonMessageBuilder, MockMessage, MockMqttClient};
pub use test_utils::TestHarness;
