//! Plant lifecycle end to end: announce, report, go stale, come back.

mod common;

use common::bridge;
use enmon_devkit::{EnmonMessageBuilder, MockMqttClient, TestHarness};
use enmon_weather::health::LinkStatus;
use enmon_weather::models::{Coordinates, WeatherReport};
use enmon_weather::provider::{ReportOutcome, TIMEOUT_SECS};
use enmon_weather::router::{dispatch, Dispatched};
use enmon_weather::scheduler::{CycleSummary, ReportingScheduler, DEFAULT_INTERVAL};
use serde_json::json;

const START: i64 = 1_700_000_000;

fn connected() -> LinkStatus {
    let link = LinkStatus::new();
    link.mark_connected();
    link
}

fn reports(mqtt: &MockMqttClient, site: &str) -> Vec<WeatherReport> {
    mqtt.find_messages_by_topic(&EnmonMessageBuilder::weather_topic(site))
        .iter()
        .map(|m| serde_json::from_slice(&m.payload).unwrap())
        .collect()
}

async fn announce(registry: &enmon_weather::SharedProviderRegistry, site: &str, lon: f64, lat: f64) {
    let payload = serde_json::to_vec(&EnmonMessageBuilder::info(lon, lat)).unwrap();
    match dispatch(registry, &EnmonMessageBuilder::info_topic(site), &payload) {
        Some(Dispatched::Info(Some(handle))) => {
            handle.await.unwrap();
        }
        other => panic!("info not routed: {:?}", other),
    }
}

#[tokio::test]
async fn plant_goes_stale_and_recovers() {
    let b = bridge(MockMqttClient::new(), START);
    let scheduler = ReportingScheduler::new(b.registry.clone(), connected(), DEFAULT_INTERVAL);

    // announce -> immediate report
    announce(&b.registry, "p1", 10.0, 50.0).await;
    assert_eq!(reports(&b.mqtt, "p1"), vec![WeatherReport { code: 2, tag: "SUN".into(), temperature: 15 }]);
    assert_eq!(b.weather.requests.lock().unwrap().as_slice(), &[Coordinates::new(10.0, 50.0)]);

    // silent past the timeout -> skipped, still registered
    b.clock.advance(TIMEOUT_SECS + 1);
    let summary = scheduler.run_cycle().await.unwrap();
    assert_eq!(summary, CycleSummary { reported: 0, stale: 1, failed: 0 });
    assert_eq!(reports(&b.mqtt, "p1").len(), 1);
    assert_eq!(b.registry.len(), 1);

    // liveness -> next cycle reports again
    let status = dispatch(&b.registry, &EnmonMessageBuilder::status_topic("p1"), &EnmonMessageBuilder::status());
    assert!(matches!(status, Some(Dispatched::Status(true))));
    b.weather.set_code(211);

    let summary = scheduler.run_cycle().await.unwrap();
    assert_eq!(summary, CycleSummary { reported: 1, stale: 0, failed: 0 });
    assert_eq!(
        reports(&b.mqtt, "p1").last(),
        Some(&WeatherReport { code: 5, tag: "THUNDERSTORM".into(), temperature: 15 })
    );
}

#[tokio::test]
async fn exactly_timeout_is_still_live() {
    let b = bridge(MockMqttClient::new(), START);
    let scheduler = ReportingScheduler::new(b.registry.clone(), connected(), DEFAULT_INTERVAL);

    announce(&b.registry, "p1", 10.0, 50.0).await;
    b.clock.advance(TIMEOUT_SECS);

    let summary = scheduler.run_cycle().await.unwrap();
    assert_eq!(summary.reported, 1);
}

#[tokio::test]
async fn outage_fails_attempts_without_dropping_plants() {
    let b = bridge(MockMqttClient::new(), START);
    let scheduler = ReportingScheduler::new(b.registry.clone(), connected(), DEFAULT_INTERVAL);

    announce(&b.registry, "p1", 10.0, 50.0).await;
    announce(&b.registry, "p2", -3.7, 40.4).await;
    b.mqtt.clear();

    b.weather.set_down(true);
    let summary = scheduler.run_cycle().await.unwrap();
    assert_eq!(summary, CycleSummary { reported: 0, stale: 0, failed: 2 });
    assert!(b.mqtt.get_published_messages().is_empty());

    b.weather.set_down(false);
    let summary = scheduler.run_cycle().await.unwrap();
    assert_eq!(summary.reported, 2);
}

#[tokio::test]
async fn publish_failure_is_reported_as_failed() {
    let b = bridge(MockMqttClient::new(), START);
    b.registry.register("p1", Coordinates::new(1.0, 1.0));
    b.mqtt.set_publish_failure(true);

    let provider = b.registry.get("p1").unwrap();
    assert!(matches!(b.registry.report(&provider).await, ReportOutcome::Failed(_)));
}

#[tokio::test]
async fn harness_sees_retained_report_after_announcement() {
    let mut harness = TestHarness::new();
    let b = bridge(harness.mqtt_client.clone(), START);

    let mut inbound = harness.mqtt_client.setup_receiver();
    let registry = b.registry.clone();
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            dispatch(&registry, &message.topic, &message.payload);
        }
    });

    harness.expect_messages("enmon/p7/weather", 1);
    harness.send_info("p7", 4.35, 50.85).await.unwrap();

    let report = harness.wait_for_message("enmon/p7/weather", 1000).await.unwrap();
    assert_eq!(report, Some(json!({"code": 2, "tag": "SUN", "temperature": 15})));

    harness.send_status("p7").await.unwrap();
    harness.send_status("unknown").await.unwrap();

    harness.verify_expectations().await.unwrap();
    harness.assert_all_retained("enmon/p7/weather").unwrap();
    assert!(harness.get_stats().subscriptions.contains(&"enmon/+/status".to_string()));
}
