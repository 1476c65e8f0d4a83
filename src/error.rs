use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed row in {file} at line {line}: {message}")]
    MalformedRow {
        file: String,
        line: u64,
        message: String,
    },

    #[error("Duplicate key '{key}' in {table}")]
    DuplicateKey { table: String, key: String },

    #[error("Venue '{venue}' ({year}) has conflicting {field}: {first} vs {other}")]
    InconsistentVenue {
        year: i32,
        venue: String,
        field: &'static str,
        first: String,
        other: String,
    },

    #[error("Edge references unknown node: {0}")]
    UnknownNode(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl NetworkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NetworkError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        NetworkError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
