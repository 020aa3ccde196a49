// Weather samples and simulated weather scenarios
use super::error::PredictionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample {
    pub air_temp: f64,
    pub track_temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
    pub rainfall: bool,
}

/// Session-wide aggregate of the weather samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherAverages {
    pub air_temp: f64,
    pub track_temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
    /// Statistical mode of the rainfall flag; a tie counts as dry.
    pub rainfall: bool,
}

impl WeatherAverages {
    pub fn from_samples(samples: &[WeatherSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = |f: fn(&WeatherSample) -> f64| samples.iter().map(f).sum::<f64>() / n;
        let wet = samples.iter().filter(|s| s.rainfall).count();

        Some(Self {
            air_temp: mean(|s| s.air_temp),
            track_temp: mean(|s| s.track_temp),
            humidity: mean(|s| s.humidity),
            pressure: mean(|s| s.pressure),
            wind_direction: mean(|s| s.wind_direction),
            wind_speed: mean(|s| s.wind_speed),
            rainfall: wet * 2 > samples.len(),
        })
    }
}

/// Concrete weather inputs handed to a lap-time model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherFeatureSet {
    pub air_temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub rainfall: f64,
    pub track_temp: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
}

impl WeatherFeatureSet {
    /// Feature names as used by the trained models, paired with their values.
    pub fn channels(&self) -> [(&'static str, f64); 7] {
        [
            ("AirTemp", self.air_temp),
            ("Humidity", self.humidity),
            ("Pressure", self.pressure),
            ("Rainfall", self.rainfall),
            ("TrackTemp", self.track_temp),
            ("WindDirection", self.wind_direction),
            ("WindSpeed", self.wind_speed),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WeatherScenario {
    HistoricalAverage,
    SunnyAndHot,
    CloudyAndCool,
    LightRain,
}

impl WeatherScenario {
    pub const ALL: [WeatherScenario; 4] = [
        WeatherScenario::HistoricalAverage,
        WeatherScenario::SunnyAndHot,
        WeatherScenario::CloudyAndCool,
        WeatherScenario::LightRain,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WeatherScenario::HistoricalAverage => "Use Historical Average",
            WeatherScenario::SunnyAndHot => "Simulate: Sunny & Hot",
            WeatherScenario::CloudyAndCool => "Simulate: Cloudy & Cool",
            WeatherScenario::LightRain => "Simulate: Light Rain",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            WeatherScenario::HistoricalAverage => "historical_average",
            WeatherScenario::SunnyAndHot => "sunny_hot",
            WeatherScenario::CloudyAndCool => "cloudy_cool",
            WeatherScenario::LightRain => "light_rain",
        }
    }

    /// Applies this scenario's fixed deltas to the session averages.
    pub fn apply(&self, avg: &WeatherAverages) -> WeatherFeatureSet {
        match self {
            WeatherScenario::HistoricalAverage => WeatherFeatureSet {
                air_temp: avg.air_temp,
                humidity: avg.humidity,
                pressure: avg.pressure,
                rainfall: if avg.rainfall { 1.0 } else { 0.0 },
                track_temp: avg.track_temp,
                wind_direction: avg.wind_direction,
                wind_speed: avg.wind_speed,
            },
            WeatherScenario::SunnyAndHot => WeatherFeatureSet {
                air_temp: avg.air_temp + 5.0,
                humidity: avg.humidity - 5.0,
                pressure: avg.pressure,
                rainfall: 0.0,
                track_temp: avg.track_temp + 5.0,
                wind_direction: avg.wind_direction,
                wind_speed: avg.wind_speed - 2.0,
            },
            WeatherScenario::CloudyAndCool => WeatherFeatureSet {
                air_temp: avg.air_temp - 3.0,
                humidity: avg.humidity + 10.0,
                pressure: avg.pressure,
                rainfall: 0.0,
                track_temp: avg.track_temp - 5.0,
                wind_direction: avg.wind_direction,
                wind_speed: avg.wind_speed * 1.5,
            },
            WeatherScenario::LightRain => WeatherFeatureSet {
                air_temp: avg.air_temp - 10.0,
                humidity: 98.0,
                pressure: avg.pressure,
                rainfall: 1.0,
                track_temp: avg.track_temp - 15.0,
                wind_direction: avg.wind_direction,
                wind_speed: avg.wind_speed * 1.5,
            },
        }
    }

    /// Resolves the scenario against a session's weather samples.
    pub fn resolve(&self, samples: &[WeatherSample]) -> Result<WeatherFeatureSet, PredictionError> {
        let averages =
            WeatherAverages::from_samples(samples).ok_or(PredictionError::InsufficientWeatherData)?;
        Ok(self.apply(&averages))
    }
}

impl fmt::Display for WeatherScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WeatherScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        WeatherScenario::ALL
            .into_iter()
            .find(|w| w.label().eq_ignore_ascii_case(s) || w.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown weather scenario '{}'", s))
    }
}

impl TryFrom<String> for WeatherScenario {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeatherScenario> for String {
    fn from(value: WeatherScenario) -> Self {
        value.label().to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(air: f64, track: f64, rain: bool) -> WeatherSample {
        WeatherSample {
            air_temp: air,
            track_temp: track,
            humidity: 50.0,
            pressure: 1012.0,
            wind_direction: 180.0,
            wind_speed: 4.0,
            rainfall: rain,
        }
    }

    fn samples() -> Vec<WeatherSample> {
        vec![sample(19.0, 34.0, false), sample(21.0, 36.0, false)]
    }

    #[test]
    fn test_historical_average_uses_means() {
        let w = WeatherScenario::HistoricalAverage.resolve(&samples()).unwrap();
        assert_eq!(w.air_temp, 20.0);
        assert_eq!(w.track_temp, 35.0);
        assert_eq!(w.humidity, 50.0);
        assert_eq!(w.rainfall, 0.0);
    }

    #[test]
    fn test_sunny_and_hot_deltas() {
        let w = WeatherScenario::SunnyAndHot.resolve(&samples()).unwrap();
        assert_eq!(w.air_temp, 25.0);
        assert_eq!(w.track_temp, 40.0);
        assert_eq!(w.humidity, 45.0);
        assert_eq!(w.wind_speed, 2.0);
        assert_eq!(w.rainfall, 0.0);
    }

    #[test]
    fn test_cloudy_and_cool_deltas() {
        let w = WeatherScenario::CloudyAndCool.resolve(&samples()).unwrap();
        assert_eq!(w.air_temp, 17.0);
        assert_eq!(w.humidity, 60.0);
        assert_eq!(w.track_temp, 30.0);
        assert_eq!(w.wind_speed, 6.0);
        assert_eq!(w.pressure, 1012.0);
    }

    #[test]
    fn test_light_rain_fixed_humidity() {
        let w = WeatherScenario::LightRain.resolve(&samples()).unwrap();
        assert_eq!(w.humidity, 98.0);
        assert_eq!(w.rainfall, 1.0);
        assert_eq!(w.air_temp, 10.0);
        assert_eq!(w.track_temp, 20.0);
        assert_eq!(w.wind_direction, 180.0);
    }

    #[test]
    fn test_empty_samples_fail_for_every_scenario() {
        for scenario in WeatherScenario::ALL {
            assert!(matches!(
                scenario.resolve(&[]),
                Err(PredictionError::InsufficientWeatherData)
            ));
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let samples = samples();
        for scenario in WeatherScenario::ALL {
            assert_eq!(scenario.resolve(&samples).unwrap(), scenario.resolve(&samples).unwrap());
        }
    }

    #[test]
    fn test_rainfall_mode() {
        let wet = vec![sample(15.0, 20.0, true), sample(15.0, 20.0, true), sample(15.0, 20.0, false)];
        let w = WeatherScenario::HistoricalAverage.resolve(&wet).unwrap();
        assert_eq!(w.rainfall, 1.0);

        let tie = vec![sample(15.0, 20.0, true), sample(15.0, 20.0, false)];
        let w = WeatherScenario::HistoricalAverage.resolve(&tie).unwrap();
        assert_eq!(w.rainfall, 0.0);
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(
            "Simulate: Light Rain".parse::<WeatherScenario>().unwrap(),
            WeatherScenario::LightRain
        );
        assert_eq!("sunny_hot".parse::<WeatherScenario>().unwrap(), WeatherScenario::SunnyAndHot);
        assert!("snow".parse::<WeatherScenario>().is_err());

        let json = serde_json::to_string(&WeatherScenario::CloudyAndCool).unwrap();
        assert_eq!(json, "\"Simulate: Cloudy & Cool\"");
    }
}
