// HTTP error mapping
use crate::domain::error::PredictionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("{0}")]
    BadRequest(String),

    #[error("upstream data source failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("commentary is not configured")]
    CommentaryUnavailable,

    #[error("commentary generation failed: {0:#}")]
    Commentary(anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Upstream(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Prediction(e) => match e {
                PredictionError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
                PredictionError::ModelLoad { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                PredictionError::InsufficientWeatherData => StatusCode::UNPROCESSABLE_ENTITY,
                PredictionError::InvalidPrediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PredictionError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                PredictionError::DataSource(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Commentary(_) => StatusCode::BAD_GATEWAY,
            ApiError::CommentaryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!("{} {}", status, message);
        } else {
            tracing::debug!("{} {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
