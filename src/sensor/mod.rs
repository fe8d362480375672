//! Sensor input sources.
//!
//! The sampling loop only depends on the [`SensorReader`] trait; the
//! concrete reader is selected from configuration. An `Err` from `read`
//! means the cycle produced no usable sample and the caller retries after a
//! short backoff.

mod sht3x;
mod simulation;

pub use sht3x::Sht3xSensor;
pub use simulation::SimulatedSensor;

use crate::config::SensorConfig;
use crate::error::{LoggerError, SensorError};
use async_trait::async_trait;

/// Supported sensor models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorModel {
    Sht31,
    Sht35,
    Simulated,
}

impl SensorModel {
    pub fn parse(value: &str) -> Result<Self, LoggerError> {
        match value.to_ascii_lowercase().as_str() {
            "sht31" => Ok(Self::Sht31),
            "sht35" => Ok(Self::Sht35),
            "simulated" => Ok(Self::Simulated),
            other => Err(LoggerError::InvalidConfig(format!(
                "unknown sensor model: {other}"
            ))),
        }
    }
}

/// A temperature/humidity sensor.
#[async_trait]
pub trait SensorReader: Send {
    /// Take one measurement, returning a `(humidity, temperature)` pair.
    ///
    /// [`SensorError::Unreliable`] means the sample failed validation and a
    /// retry shortly afterwards will usually succeed.
    async fn read(&mut self) -> Result<(f32, f32), SensorError>;
}

#[async_trait]
impl SensorReader for Box<dyn SensorReader> {
    async fn read(&mut self) -> Result<(f32, f32), SensorError> {
        (**self).read().await
    }
}

/// Build the reader selected by configuration.
pub fn build_reader(config: &SensorConfig) -> Result<Box<dyn SensorReader>, LoggerError> {
    match SensorModel::parse(&config.model)? {
        SensorModel::Sht31 | SensorModel::Sht35 => Ok(Box::new(Sht3xSensor::open(
            &config.device,
            config.address,
        )?)),
        SensorModel::Simulated => Ok(Box::new(SimulatedSensor::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parsing() {
        assert_eq!(SensorModel::parse("sht31").unwrap(), SensorModel::Sht31);
        assert_eq!(SensorModel::parse("SHT35").unwrap(), SensorModel::Sht35);
        assert_eq!(
            SensorModel::parse("simulated").unwrap(),
            SensorModel::Simulated
        );
        assert!(SensorModel::parse("dht22").is_err());
    }
}
