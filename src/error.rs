// src/error.rs - Error types for the repetition tracker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Landmark {index} missing or below confidence threshold")]
    MissingLandmark { index: usize },

    #[error("Degenerate joint geometry: two triplet points coincide")]
    DegenerateGeometry,

    #[error("Pose inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, TrackingError>;

impl From<serde_json::Error> for TrackingError {
    fn from(e: serde_json::Error) -> Self {
        TrackingError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for TrackingError {
    fn from(e: csv::Error) -> Self {
        TrackingError::Serialization(e.to_string())
    }
}
