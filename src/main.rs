use climate_logger::config::{self, Config};
use climate_logger::interval::SamplingInterval;
use climate_logger::mqtt::{IntervalControl, MqttClient, MqttPublisher};
use climate_logger::sampler::Sampler;
use climate_logger::sensor;
use climate_logger::sheet::ConfiguredSheetConnector;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env before reading configuration
    config::load_dotenv();
    init_logger();
    info!("Starting climate logger");

    let config = Config::from_env();

    let interval = match SamplingInterval::new(config.sampling.interval_secs) {
        Ok(interval) => Arc::new(interval),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let reader = match sensor::build_reader(&config.sensor) {
        Ok(reader) => reader,
        Err(e) => {
            error!("Failed to set up sensor: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Logging sensor measurements to {} every {} seconds",
        config.sheet.spreadsheet_name,
        interval.secs()
    );

    let mqtt = MqttClient::new(&config.mqtt);
    let publisher = MqttPublisher::new(mqtt.client(), config.mqtt.data_topic.clone());
    let control = IntervalControl::new(config.mqtt.control_topic.clone(), interval.clone());

    info!(
        "Connecting to MQTT broker at {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    let mqtt_task = tokio::spawn(mqtt.run(control));

    let connector = ConfiguredSheetConnector::new(&config.sheet);
    let mut sampler = Sampler::new(
        reader,
        connector,
        publisher,
        interval,
        Duration::from_secs(config.sampling.sensor_retry_secs),
    );

    tokio::select! {
        _ = sampler.run() => {}
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
        }
    }

    mqtt_task.abort();
    info!("Climate logger stopped");
}
