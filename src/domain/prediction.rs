// Lap-time prediction request and result models
use super::error::PredictionError;
use super::lap::Compound;
use super::session::{SessionKey, SessionType};
use super::weather::WeatherScenario;
use serde::{Deserialize, Serialize};

pub const MAX_STINT: u32 = 5;

/// Everything needed to produce one lap-time prediction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub year: i32,
    pub circuit: String,
    #[serde(default)]
    pub session: SessionType,
    pub driver: String,
    pub lap_number: u32,
    pub compound: Compound,
    pub tyre_age: u32,
    pub stint: u32,
    pub weather: WeatherScenario,
}

impl PredictionRequest {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.year, self.circuit.clone(), self.session)
    }

    /// Checks the request against the bounds offered by the dashboard.
    pub fn validate(&self, total_laps: u32) -> Result<(), PredictionError> {
        let invalid =
            |msg: String| -> Result<(), PredictionError> { Err(PredictionError::InvalidRequest(msg)) };

        if self.driver.trim().is_empty() {
            return invalid("driver code is required".to_string());
        }
        if self.compound == Compound::Unknown {
            return invalid("tyre compound is required".to_string());
        }
        if !(1..=MAX_STINT).contains(&self.stint) {
            return invalid(format!("stint must be between 1 and {}", MAX_STINT));
        }
        if total_laps < 2 {
            return invalid(format!("session has only {} laps", total_laps));
        }
        if !(2..=total_laps).contains(&self.lap_number) {
            return invalid(format!("lap number must be between 2 and {}", total_laps));
        }
        if !(1..=total_laps).contains(&self.tyre_age) {
            return invalid(format!("tyre age must be between 1 and {}", total_laps));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionResult {
    pub seconds: f64,
    pub time_str: String,
    pub driver_name: String,
    pub circuit: String,
    pub lap_number: u32,
    pub compound: Compound,
    pub tyre_life: u32,
    pub weather: WeatherScenario,
}

/// Formats seconds as `M:SS.mmm`, rounding to the nearest millisecond.
pub fn format_lap_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let rem_ms = total_ms % 60_000;
    format!("{}:{:02}.{:03}", minutes, rem_ms / 1000, rem_ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PredictionRequest {
        PredictionRequest {
            year: 2024,
            circuit: "Monza".to_string(),
            session: SessionType::Race,
            driver: "LEC".to_string(),
            lap_number: 10,
            compound: Compound::Hard,
            tyre_age: 5,
            stint: 2,
            weather: WeatherScenario::HistoricalAverage,
        }
    }

    #[test]
    fn test_format_lap_time() {
        assert_eq!(format_lap_time(83.456), "1:23.456");
        assert_eq!(format_lap_time(59.999), "0:59.999");
        assert_eq!(format_lap_time(60.0), "1:00.000");
        assert_eq!(format_lap_time(119.9996), "2:00.000");
        assert_eq!(format_lap_time(72.05), "1:12.050");
    }

    #[test]
    fn test_validate_bounds() {
        assert!(request().validate(53).is_ok());

        let mut r = request();
        r.lap_number = 1;
        assert!(matches!(r.validate(53), Err(PredictionError::InvalidRequest(_))));

        let mut r = request();
        r.stint = 6;
        assert!(r.validate(53).is_err());

        let mut r = request();
        r.tyre_age = 54;
        assert!(r.validate(53).is_err());

        assert!(request().validate(1).is_err());
    }

    #[test]
    fn test_request_deserializes_with_default_session() {
        let json = r#"{
            "year": 2023,
            "circuit": "Silverstone",
            "driver": "HAM",
            "lap_number": 20,
            "compound": "MEDIUM",
            "tyre_age": 8,
            "stint": 2,
            "weather": "Simulate: Sunny & Hot"
        }"#;

        let r: PredictionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.session, SessionType::Race);
        assert_eq!(r.compound, Compound::Medium);
        assert_eq!(r.weather, WeatherScenario::SunnyAndHot);
    }
}
