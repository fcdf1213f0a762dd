/**
 * ENMON WEATHER - Entry point of the weather bridge
 *
 * ROLE: Loads configuration, connects to the broker, and runs the MQTT
 * listener and the reporting scheduler until SIGINT/SIGTERM.
 *
 * EXIT CODES: 0 clean shutdown, 1 configuration error, 2 runtime error.
 */

use anyhow::{Context, Result};
use enmon_weather::clock::SystemClock;
use enmon_weather::config::Config;
use enmon_weather::health::LinkStatus;
use enmon_weather::mqtt::{create_mqtt_client, spawn_mqtt_listener};
use enmon_weather::owm::OpenWeatherMapClient;
use enmon_weather::registry::{ProviderRegistry, SharedProviderRegistry};
use enmon_weather::scheduler::ReportingScheduler;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

const LISTENER_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            error!("[main] {}", e);
            return ExitCode::from(1);
        }
    };
    info!("[main] starting with {:?}", config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[main] fatal: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let (client, eventloop) = create_mqtt_client(&config.mqtt);
    let source = OpenWeatherMapClient::new(config.owm.clone()).context("building weather client")?;

    let registry: SharedProviderRegistry = Arc::new(ProviderRegistry::new(
        Arc::new(client.clone()),
        Arc::new(source),
        Arc::new(SystemClock),
    ));
    let link = LinkStatus::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = spawn_mqtt_listener(eventloop, registry.clone(), link.clone(), shutdown_rx.clone());
    let scheduler = ReportingScheduler::new(registry.clone(), link.clone(), config.reporting_interval)
        .spawn(shutdown_rx);

    info!(
        "[main] bridging {}:{} as {}",
        config.mqtt.host, config.mqtt.port, config.mqtt.client_id
    );

    let signal = wait_for_shutdown().await.context("waiting for shutdown signal")?;
    info!("[main] received {}, shutting down", signal);

    shutdown_tx.send(true).ok();
    scheduler.await.context("scheduler task panicked")?;

    if let Err(e) = client.disconnect().await {
        warn!("[main] disconnect failed: {}", e);
    }
    match tokio::time::timeout(LISTENER_GRACE, listener).await {
        Ok(joined) => joined.context("mqtt listener panicked")?,
        Err(_) => warn!("[main] mqtt listener did not stop within {:?}", LISTENER_GRACE),
    }

    info!(
        "[main] stopped ({} plants known, {} reconnects)",
        registry.len(),
        link.reconnects()
    );
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c().await.context("waiting for CTRL-C")?;
    Ok("SIGINT")
}
