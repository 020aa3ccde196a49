// Feature builder - Turns a prediction request into a model input row
use crate::domain::features::FeatureVector;
use crate::domain::prediction::PredictionRequest;
use crate::domain::weather::WeatherFeatureSet;

/// Builds the single-row input for a model trained on `schema`.
///
/// Every schema feature starts at zero. Lap context and weather overwrite
/// their columns, and the driver and compound are one-hot encoded as
/// `Driver_<code>` and `Compound_<NAME>`. A one-hot column the model never saw
/// during training is skipped, since it only affects one input dimension.
pub fn build_features(
    schema: &[String],
    request: &PredictionRequest,
    weather: &WeatherFeatureSet,
) -> FeatureVector {
    let mut features = FeatureVector::zeros(schema);

    let lap_context = [
        ("LapNumber", request.lap_number as f64),
        ("Stint", request.stint as f64),
        ("TyreLife", request.tyre_age as f64),
        ("Year", request.year as f64),
    ];
    for (name, value) in lap_context.into_iter().chain(weather.channels()) {
        if !features.set(name, value) {
            tracing::debug!("Model schema has no {} column", name);
        }
    }

    let one_hot = [
        format!("Driver_{}", request.driver.trim().to_ascii_uppercase()),
        format!("Compound_{}", request.compound),
    ];
    for column in one_hot {
        if !features.set(&column, 1.0) {
            tracing::warn!("Unmodeled feature {}; leaving it out of the prediction", column);
        }
    }

    features
}
