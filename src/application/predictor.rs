// Lap-time predictor - Use case for the ML pace prediction
use crate::application::feature_builder::build_features;
use crate::application::model_registry::{LoadedModel, ModelRegistry};
use crate::application::session_repository::SessionDataSource;
use crate::domain::error::PredictionError;
use crate::domain::prediction::{format_lap_time, PredictionRequest, PredictionResult};
use crate::domain::weather::WeatherSample;
use std::sync::Arc;

#[derive(Clone)]
pub struct LapTimePredictor {
    sessions: Arc<dyn SessionDataSource>,
    registry: Arc<ModelRegistry>,
}

impl LapTimePredictor {
    pub fn new(sessions: Arc<dyn SessionDataSource>, registry: Arc<ModelRegistry>) -> Self {
        Self { sessions, registry }
    }

    /// Loads the circuit's model, then fetches the session the request refers
    /// to and runs the prediction against its weather samples.
    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictionError> {
        let loaded = self.registry.load(&request.circuit)?;

        let session = self
            .sessions
            .load_session(&request.session_key())
            .await
            .map_err(PredictionError::DataSource)?;

        request.validate(session.total_laps)?;

        let driver_name = session
            .result_for(&request.driver)
            .map(|r| r.full_name.clone())
            .unwrap_or_else(|| request.driver.clone());

        self.infer(&loaded, request, &session.weather, &driver_name)
    }

    /// The synchronous core: model lookup, weather scenario, features, inference.
    pub fn predict_with_weather(
        &self,
        request: &PredictionRequest,
        weather_samples: &[WeatherSample],
        driver_name: &str,
    ) -> Result<PredictionResult, PredictionError> {
        let loaded = self.registry.load(&request.circuit)?;
        self.infer(&loaded, request, weather_samples, driver_name)
    }

    fn infer(
        &self,
        loaded: &LoadedModel,
        request: &PredictionRequest,
        weather_samples: &[WeatherSample],
        driver_name: &str,
    ) -> Result<PredictionResult, PredictionError> {
        let weather = request.weather.resolve(weather_samples)?;
        let features = build_features(&loaded.schema, request, &weather);
        tracing::debug!(
            "Feature row for {} ({} columns): {:?}",
            loaded.name,
            features.len(),
            features.iter().filter(|(_, v)| *v != 0.0).collect::<Vec<_>>()
        );

        let seconds = loaded
            .model
            .predict_row(features.values())
            .map_err(|reason| PredictionError::ModelLoad {
                path: self.registry.artifact_path(&request.circuit),
                reason,
            })?;

        if !seconds.is_finite() || seconds < 0.0 {
            tracing::error!(
                "Model {} returned {} for {} lap {}",
                loaded.name,
                seconds,
                request.driver,
                request.lap_number
            );
            return Err(PredictionError::InvalidPrediction(seconds));
        }

        let time_str = format_lap_time(seconds);
        tracing::info!(
            "Predicted {} for {} at {} (lap {}, {} x{}, {})",
            time_str,
            request.driver,
            request.circuit,
            request.lap_number,
            request.compound,
            request.tyre_age,
            request.weather.key()
        );

        Ok(PredictionResult {
            seconds,
            time_str,
            driver_name: driver_name.to_string(),
            circuit: request.circuit.clone(),
            lap_number: request.lap_number,
            compound: request.compound,
            tyre_life: request.tyre_age,
            weather: request.weather,
        })
    }
}
