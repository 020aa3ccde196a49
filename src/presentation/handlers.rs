// HTTP request handlers
use crate::application::commentary::commentary_prompt;
use crate::application::season_service::SeasonService;
use crate::domain::prediction::{PredictionRequest, PredictionResult};
use crate::domain::session::{SessionKey, SessionType};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::{ApiError, ApiResult};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AnalysisQuery {
    pub year: i32,
    pub circuit: String,
    pub session: Option<String>,
    pub driver: String,
}

#[derive(Serialize)]
struct CommentaryReport {
    report: String,
}

async fn respond<T: Serialize>(headers: &HeaderMap, status: StatusCode, data: &T) -> Response<Body> {
    json_response(status, data, accepts_brotli(headers))
        .await
        .unwrap_or_else(|status| status.into_response())
}

fn check_year(year: i32) -> ApiResult<()> {
    if SeasonService::is_supported(year) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("unsupported season {}", year)))
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Circuits raced in a season
pub async fn list_circuits(
    Path(year): Path<i32>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    check_year(year)?;
    let circuits = state.season_service.list_circuits(year).await?;
    Ok(respond(&headers, StatusCode::OK, &circuits).await)
}

/// Drivers of a season
pub async fn list_drivers(
    Path(year): Path<i32>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    check_year(year)?;
    let drivers = state.season_service.list_drivers(year).await?;
    Ok(respond(&headers, StatusCode::OK, &drivers).await)
}

/// Full race analysis of one driver in one session
pub async fn driver_analysis(
    Query(query): Query<AnalysisQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response<Body>> {
    check_year(query.year)?;
    let session = match query.session.as_deref() {
        Some(s) => s.parse::<SessionType>().map_err(ApiError::BadRequest)?,
        None => SessionType::default(),
    };

    let key = SessionKey::new(query.year, query.circuit, session);
    let analysis = state
        .analysis_service
        .driver_analysis(&key, query.driver.trim())
        .await?;
    Ok(respond(&headers, StatusCode::OK, &analysis).await)
}

/// Predict a lap time under a weather scenario
pub async fn predict_lap_time(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> ApiResult<Response<Body>> {
    check_year(request.year)?;
    let result = state.predictor.predict(&request).await?;
    Ok(respond(&headers, StatusCode::OK, &result).await)
}

/// Pundit's verdict on a prediction
pub async fn pundit_verdict(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(result): Json<PredictionResult>,
) -> ApiResult<Response<Body>> {
    let commentary = state
        .commentary
        .as_ref()
        .ok_or(ApiError::CommentaryUnavailable)?;

    let report = commentary
        .generate(&commentary_prompt(&result))
        .await
        .map_err(ApiError::Commentary)?;
    Ok(respond(&headers, StatusCode::OK, &CommentaryReport { report }).await)
}
