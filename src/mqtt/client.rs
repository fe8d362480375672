//! MQTT client wrapper for broker communication.

use super::control::IntervalControl;
use super::ReadingPublisher;
use crate::config::MqttConfig;
use crate::error::PublishError;
use crate::reading::Reading;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;

/// Delay before the event loop retries after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection lifecycle tracked by the event loop.
///
/// The control-topic subscription is issued every time the Connected state
/// is entered, so it survives broker reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// MQTT client for the data and control topics.
pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keepalive_secs));

        // Set credentials if provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 100);

        Self { client, event_loop }
    }

    /// Get a clone of the async client for publishing from other tasks.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    /// Run the event loop, dispatching control messages to `control`.
    ///
    /// Runs indefinitely. Connection errors are logged and retried after a
    /// fixed delay; the control subscription is re-issued on every reconnect.
    pub async fn run(mut self, control: IntervalControl) {
        info!("Starting MQTT event loop");
        let mut state = ConnectionState::Connecting;

        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(
                        "Connected to broker with result code {:?}, subscribing to {}",
                        ack.code,
                        control.topic()
                    );
                    state = ConnectionState::Connected;
                    // Subscribing here means a dropped connection gets its
                    // subscription renewed when the broker comes back.
                    if let Err(e) = self
                        .client
                        .subscribe(control.topic(), QoS::AtMostOnce)
                        .await
                    {
                        warn!("Failed to subscribe to {}: {:?}", control.topic(), e);
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    info!(
                        "Subscription acknowledged: msgID {} granted {:?}",
                        ack.pkid, ack.return_codes
                    );
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let topic = publish.topic.clone();
                    let payload = match String::from_utf8(publish.payload.to_vec()) {
                        Ok(s) => s,
                        Err(e) => {
                            warn!("Invalid UTF-8 in MQTT payload on {}: {}", topic, e);
                            continue;
                        }
                    };

                    debug!("Received MQTT message on {}: {}", topic, payload);
                    if !control.handle_message(&topic, &payload) {
                        debug!("Ignoring message on unexpected topic {}", topic);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    if state != ConnectionState::Disconnected {
                        error!("MQTT connection error: {:?}", e);
                    }
                    state = ConnectionState::Disconnected;
                    // Wait before reconnecting
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    state = ConnectionState::Connecting;
                }
            }
        }
    }
}

/// [`ReadingPublisher`] backed by the shared async client.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl ReadingPublisher for MqttPublisher {
    async fn publish(&self, reading: &Reading) -> Result<(), PublishError> {
        let payload = serde_json::to_string(reading)?;
        debug!("Publishing to {}: {}", self.topic, payload);
        self.client
            .publish(
                self.topic.as_str(),
                QoS::AtMostOnce,
                false,
                payload.into_bytes(),
            )
            .await
            .map_err(|e| PublishError::Client(e.to_string()))
    }
}
