use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet read error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid period {label}: start {start} is after end {end}")]
    InvalidPeriod {
        label: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("No temperature data in any queried period")]
    NoData,

    #[error("No pest risk profiles available: {0}")]
    NoProfiles(String),

    #[error(
        "Point ({latitude}, {longitude}) of the {period} period is missing from the canonical point set"
    )]
    RemapIntegrity {
        period: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}
