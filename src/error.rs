use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported tree format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Service not started")]
    NotStarted,

    #[error("Processing context closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
