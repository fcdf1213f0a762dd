use crate::config::MqttConf;
use crate::health::LinkStatus;
use crate::registry::SharedProviderRegistry;
use crate::router::dispatch;
use log::{error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, Outgoing};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};

const CHANNEL_CAPACITY: usize = 64;
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub fn create_mqtt_client(conf: &MqttConf) -> (AsyncClient, EventLoop) {
    let mut opts = MqttOptions::new(&conf.client_id, &conf.host, conf.port);
    opts.set_keep_alive(Duration::from_secs(conf.keep_alive_secs));
    opts.set_clean_session(true);
    AsyncClient::new(opts, CHANNEL_CAPACITY)
}

/// Drives the event loop until the client disconnects or shutdown is requested.
///
/// Subscriptions are (re)issued on every ConnAck; rumqttc redials on the
/// next `poll` after an error.
pub fn spawn_mqtt_listener(
    mut eventloop: EventLoop,
    registry: SharedProviderRegistry,
    link: LinkStatus,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    task::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    info!("[mqtt] connected ({:?})", ack.code);
                    link.mark_connected();
                    let registry = registry.clone();
                    task::spawn(async move { registry.on_connected().await });
                }
                Ok(Event::Incoming(Incoming::Publish(p))) => {
                    dispatch(&registry, &p.topic, &p.payload);
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!("[mqtt] disconnect sent");
                    link.mark_disconnected();
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    if *shutdown.borrow() {
                        link.mark_disconnected();
                        break;
                    }
                    let attempt = link.increment_reconnects();
                    if attempt == 1 {
                        error!("[mqtt] connection error: {}", e);
                    } else {
                        warn!("[mqtt] connection error (retry #{}): {}", attempt, e);
                    }
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
        info!("[mqtt] listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_uses_configured_identity() {
        let conf = MqttConf {
            host: "127.0.0.1".into(),
            port: 1883,
            client_id: "enmon_weather".into(),
            keep_alive_secs: 60,
        };

        let (_client, eventloop) = create_mqtt_client(&conf);

        assert_eq!(eventloop.mqtt_options.client_id(), "enmon_weather");
        assert_eq!(eventloop.mqtt_options.broker_address(), ("127.0.0.1".to_string(), 1883));
        assert_eq!(eventloop.mqtt_options.keep_alive(), Duration::from_secs(60));
    }
}
