//! Error types for sweepbench
//!
//! Every failure is unrecoverable at pipeline scope: errors propagate to the
//! caller unchanged, there are no retries.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// sweepbench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset provider unavailable or data malformed
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// Trainer rejected its input (shape mismatch, invalid hyperparameter, solver failure)
    #[error("Training error: {0}")]
    Training(String),

    /// Model family has no representation in the portable format
    #[error("Export unsupported: {0}\nNo model file was written")]
    ExportUnsupported(String),

    /// Exported model could not be opened or parsed
    #[error("Session load error: {0}")]
    SessionLoad(String),

    /// Predictions and labels are misaligned
    #[error("Metric computation failed: {predictions} predictions vs {labels} labels")]
    MetricComputation {
        /// Number of predictions supplied
        predictions: usize,
        /// Number of labels supplied
        labels: usize,
    },

    /// Inference session rejected a run request
    #[error("Inference error: {0}")]
    Inference(String),

    /// Experiment tracker misuse or persistence failure
    #[error("Tracking error: {0}")]
    Tracking(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
