//! Test binary for broker communication.
//!
//! Usage:
//!   cargo run --bin mqtt-test
//!
//! Connects to the MQTT broker, subscribes to the data topic and logs
//! readings as they arrive. If TEST_INTERVAL is set, also publishes it to
//! the control topic to exercise runtime reconfiguration of the logger.

use climate_logger::config::{self, Config};
use climate_logger::reading::Reading;
use log::{info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    config::load_dotenv();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting MQTT test");

    // Load configuration
    let config = Config::from_env();
    info!(
        "Connecting to MQTT broker at {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );

    let mut options = MqttOptions::new(
        "climate-logger-test",
        &config.mqtt.broker_host,
        config.mqtt.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(config.mqtt.keepalive_secs));
    if let (Some(username), Some(password)) = (&config.mqtt.username, &config.mqtt.password) {
        options.set_credentials(username, password);
    }
    let (client, mut event_loop) = AsyncClient::new(options, 16);

    // Optionally reconfigure the running logger
    if let Ok(interval) = std::env::var("TEST_INTERVAL") {
        info!(
            "Publishing interval {} to {}",
            interval, config.mqtt.control_topic
        );
        if let Err(e) = client
            .publish(
                config.mqtt.control_topic.as_str(),
                QoS::AtMostOnce,
                false,
                interval.into_bytes(),
            )
            .await
        {
            warn!("Failed to publish control message: {:?}", e);
        }
    }

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected, watching {}", config.mqtt.data_topic);
                if let Err(e) = client
                    .subscribe(config.mqtt.data_topic.as_str(), QoS::AtMostOnce)
                    .await
                {
                    warn!("Failed to subscribe: {:?}", e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match serde_json::from_slice::<Reading>(&publish.payload) {
                    Ok(reading) => info!(
                        ">>> {}: {:.1}C {:.1}% at {}",
                        publish.topic, reading.temperature, reading.humidity, reading.timestamp
                    ),
                    Err(e) => warn!("Unparseable payload on {}: {}", publish.topic, e),
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Connection error: {:?}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}
