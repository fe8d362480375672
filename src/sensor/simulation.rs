//! Simulated sensor for development without hardware.

use super::SensorReader;
use crate::error::SensorError;
use async_trait::async_trait;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-walk temperature/humidity source.
///
/// Values drift around typical indoor conditions. `with_failure_rate` makes
/// a fraction of reads report no reliable measurement, which exercises the
/// loop's retry path.
pub struct SimulatedSensor {
    rng: StdRng,
    temperature: f32,
    humidity: f32,
    failure_rate: f64,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            temperature: 21.0,
            humidity: 45.0,
            failure_rate: 0.0,
        }
    }

    /// Fraction of reads (0.0..=1.0) that report an unreliable sample.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorReader for SimulatedSensor {
    async fn read(&mut self) -> Result<(f32, f32), SensorError> {
        if self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate) {
            return Err(SensorError::Unreliable);
        }

        self.temperature = (self.temperature + self.rng.gen_range(-0.3..0.3)).clamp(10.0, 35.0);
        self.humidity = (self.humidity + self.rng.gen_range(-1.0..1.0)).clamp(20.0, 90.0);

        debug!("[Sim] sample: {:.1}C {:.1}%", self.temperature, self.humidity);
        Ok((self.humidity, self.temperature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_stay_in_plausible_bounds() {
        let mut sensor = SimulatedSensor::new();
        for _ in 0..100 {
            let (humidity, temperature) = sensor.read().await.unwrap();
            assert!((10.0..=35.0).contains(&temperature));
            assert!((20.0..=90.0).contains(&humidity));
        }
    }

    #[tokio::test]
    async fn test_full_failure_rate_never_yields_samples() {
        let mut sensor = SimulatedSensor::new().with_failure_rate(1.0);
        for _ in 0..10 {
            assert!(matches!(
                sensor.read().await,
                Err(SensorError::Unreliable)
            ));
        }
    }
}
