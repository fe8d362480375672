use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Only set if not already set (env vars take precedence)
            if std::env::var(key).is_err() {
                // SAFETY: We're single-threaded at this point (called before any async runtime)
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sensor: SensorConfig,
    pub sheet: SheetConfig,
    pub mqtt: MqttConfig,
    pub sampling: SamplingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Sensor model: "sht31", "sht35" or "simulated"
    pub model: String,
    /// I2C bus device path, e.g. /dev/i2c-1
    pub device: String,
    /// I2C address of the sensor (0x44 or 0x45 for SHT3x)
    pub address: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub email: String,
    pub password: String,
    pub spreadsheet_name: String,
    /// Base URL of the spreadsheet REST gateway
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keepalive_secs: u64,
    /// Topic readings are published to
    pub data_topic: String,
    /// Topic carrying runtime interval reconfiguration
    pub control_topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Seconds between measurements; runtime-mutable via the control topic
    pub interval_secs: u64,
    /// Short delay before retrying after an unreliable sensor read
    pub sensor_retry_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor: SensorConfig {
                model: "sht31".to_string(),
                device: "/dev/i2c-1".to_string(),
                address: 0x44,
            },
            sheet: SheetConfig {
                email: "logger@example.com".to_string(),
                password: "secret".to_string(),
                spreadsheet_name: "climate-log".to_string(),
                api_base: "http://127.0.0.1:8080/v1".to_string(),
            },
            mqtt: MqttConfig {
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: "climate-logger".to_string(),
                username: None,
                password: None,
                keepalive_secs: 60,
                data_topic: "sensors/climate/kitchen".to_string(),
                control_topic: "sensors/climate/kitchen/interval".to_string(),
            },
            sampling: SamplingConfig {
                interval_secs: 30,
                sensor_retry_secs: 2,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Sensor configuration
        if let Ok(model) = std::env::var("SENSOR_MODEL") {
            config.sensor.model = model;
        }
        if let Ok(device) = std::env::var("SENSOR_DEVICE") {
            config.sensor.device = device;
        }
        if let Ok(address) = std::env::var("SENSOR_ADDRESS")
            && let Ok(a) = address.parse()
        {
            config.sensor.address = a;
        }

        // Spreadsheet configuration
        if let Ok(email) = std::env::var("SHEET_EMAIL") {
            config.sheet.email = email;
        }
        if let Ok(password) = std::env::var("SHEET_PASSWORD") {
            config.sheet.password = password;
        }
        if let Ok(name) = std::env::var("SHEET_NAME") {
            config.sheet.spreadsheet_name = name;
        }
        if let Ok(base) = std::env::var("SHEET_API_BASE") {
            config.sheet.api_base = base;
        }

        // MQTT configuration
        if let Ok(host) = std::env::var("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Ok(port) = std::env::var("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            config.mqtt.broker_port = p;
        }
        if let Ok(client_id) = std::env::var("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Ok(username) = std::env::var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Ok(keepalive) = std::env::var("MQTT_KEEPALIVE_SECS")
            && let Ok(k) = keepalive.parse()
        {
            config.mqtt.keepalive_secs = k;
        }
        if let Ok(topic) = std::env::var("MQTT_DATA_TOPIC") {
            config.mqtt.data_topic = topic;
        }
        if let Ok(topic) = std::env::var("MQTT_CONTROL_TOPIC") {
            config.mqtt.control_topic = topic;
        }

        // Sampling configuration
        if let Ok(interval) = std::env::var("SAMPLING_INTERVAL_SECS")
            && let Ok(i) = interval.parse()
        {
            config.sampling.interval_secs = i;
        }
        if let Ok(retry) = std::env::var("SENSOR_RETRY_SECS")
            && let Ok(r) = retry.parse()
        {
            config.sampling.sensor_retry_secs = r;
        }

        config
    }
}
