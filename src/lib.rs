//! Climate logger library.
//!
//! Periodically samples a temperature/humidity sensor, appends each reading
//! as a row to a remote spreadsheet and republishes it over MQTT. The
//! sampling interval can be reconfigured at runtime through an MQTT control
//! topic.

pub mod config;
pub mod error;
pub mod interval;
pub mod mqtt;
pub mod reading;
pub mod sampler;
pub mod sensor;
pub mod sheet;

pub use config::Config;
pub use error::{LoggerError, Result};
pub use interval::SamplingInterval;
pub use reading::Reading;
