//! SHT3x temperature/humidity sensor over Linux I2C.

use super::SensorReader;
use crate::error::SensorError;
use async_trait::async_trait;
use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use log::debug;
use std::time::Duration;

/// Single-shot high-repeatability measurement, no clock stretching.
const CMD_MEASURE: [u8; 2] = [0x24, 0x00];

/// Worst-case measurement duration for high repeatability.
const MEASURE_DELAY: Duration = Duration::from_millis(16);

pub struct Sht3xSensor {
    dev: LinuxI2CDevice,
}

impl Sht3xSensor {
    /// Open the sensor on the given bus path and address (0x44 or 0x45).
    pub fn open(path: &str, address: u16) -> Result<Self, SensorError> {
        let dev = LinuxI2CDevice::new(path, address)
            .map_err(|e| SensorError::Setup(e.to_string()))?;
        Ok(Self { dev })
    }

    fn read_raw(&mut self) -> Result<[u8; 6], SensorError> {
        self.dev
            .write(&CMD_MEASURE)
            .map_err(|e| SensorError::Bus(e.to_string()))?;
        std::thread::sleep(MEASURE_DELAY);

        let mut buf = [0u8; 6];
        self.dev
            .read(&mut buf)
            .map_err(|e| SensorError::Bus(e.to_string()))?;
        Ok(buf)
    }
}

#[async_trait]
impl SensorReader for Sht3xSensor {
    async fn read(&mut self) -> Result<(f32, f32), SensorError> {
        // Words are [temp hi, temp lo, crc, hum hi, hum lo, crc]
        let buf = self.read_raw()?;
        if crc8(&buf[0..2]) != buf[2] || crc8(&buf[3..5]) != buf[5] {
            return Err(SensorError::Unreliable);
        }

        let raw_temp = u16::from_be_bytes([buf[0], buf[1]]);
        let raw_hum = u16::from_be_bytes([buf[3], buf[4]]);
        let temperature = -45.0 + 175.0 * f32::from(raw_temp) / 65535.0;
        let humidity = 100.0 * f32::from(raw_hum) / 65535.0;

        debug!("sht3x sample: {:.1}C {:.1}%", temperature, humidity);
        Ok((humidity, temperature))
    }
}

/// CRC-8 as specified for Sensirion sensors: polynomial 0x31, init 0xFF.
fn crc8(data: &[u8]) -> u8 {
    let mut rem: u8 = 0xFF;
    for byte in data {
        rem ^= byte;
        for _ in 0..8 {
            if rem & 0x80 != 0 {
                rem = (rem << 1) ^ 0x31;
            } else {
                rem <<= 1;
            }
        }
    }
    rem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_reference_vector() {
        // Reference value from the Sensirion datasheet: CRC(0xBEEF) = 0x92
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn test_crc8_detects_corruption() {
        let good = crc8(&[0x61, 0x54]);
        assert_ne!(crc8(&[0x61, 0x55]), good);
    }
}
