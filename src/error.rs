use thiserror::Error as ThisError;

/// Errors talking to the spreadsheet service.
///
/// Variants are kept separate so callers can tell stale credentials from
/// transport trouble, even where they end up handled the same way.
#[derive(ThisError, Debug)]
pub enum SheetError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors reading the sensor.
#[derive(ThisError, Debug)]
pub enum SensorError {
    /// The sensor answered but the sample failed validation (bad checksum,
    /// truncated transfer). Expected occasionally under system load; the
    /// caller retries after a short backoff.
    #[error("no reliable measurement")]
    Unreliable,

    #[error("bus error: {0}")]
    Bus(String),

    #[error("failed to open sensor device: {0}")]
    Setup(String),
}

/// Errors publishing a reading to the data topic.
#[derive(ThisError, Debug)]
pub enum PublishError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("client error: {0}")]
    Client(String),
}

#[derive(ThisError, Debug)]
pub enum LoggerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sensor setup failed: {0}")]
    Sensor(#[from] SensorError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoggerError>;
