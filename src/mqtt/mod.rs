//! MQTT messaging: reading publication and runtime control.

mod client;
mod control;

pub use client::{MqttClient, MqttPublisher};
pub use control::IntervalControl;

use crate::error::PublishError;
use crate::reading::Reading;
use async_trait::async_trait;

/// Publishes readings to the data topic.
#[async_trait]
pub trait ReadingPublisher: Send + Sync {
    async fn publish(&self, reading: &Reading) -> Result<(), PublishError>;
}
