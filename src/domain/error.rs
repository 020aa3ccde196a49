// Prediction pipeline errors
use std::path::PathBuf;

/// Terminal failures of a single lap-time prediction request.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("no model trained for circuit '{circuit}' (expected {})", path.display())]
    ModelNotFound { circuit: String, path: PathBuf },

    #[error("failed to load model artifact {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("no weather samples available to build a weather scenario")]
    InsufficientWeatherData,

    #[error("model produced an unusable lap time: {0}")]
    InvalidPrediction(f64),

    #[error("invalid prediction request: {0}")]
    InvalidRequest(String),

    #[error("session data unavailable: {0:#}")]
    DataSource(anyhow::Error),
}
