// Session selection and the data bundle loaded for it
use super::lap::LapRecord;
use super::weather::WeatherSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Seasons the dashboard offers, newest first. The OpenF1 archive starts
/// with the 2023 season.
pub const SUPPORTED_YEARS: [i32; 2] = [2024, 2023];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SessionType {
    Practice1,
    Practice2,
    Practice3,
    Qualifying,
    SprintQualifying,
    SprintShootout,
    Sprint,
    #[default]
    Race,
}

impl SessionType {
    pub const ALL: [SessionType; 8] = [
        SessionType::Practice1,
        SessionType::Practice2,
        SessionType::Practice3,
        SessionType::Qualifying,
        SessionType::SprintQualifying,
        SessionType::SprintShootout,
        SessionType::Sprint,
        SessionType::Race,
    ];

    /// Session name as published by the timing feed.
    pub fn name(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "Practice 1",
            SessionType::Practice2 => "Practice 2",
            SessionType::Practice3 => "Practice 3",
            SessionType::Qualifying => "Qualifying",
            SessionType::SprintQualifying => "Sprint Qualifying",
            SessionType::SprintShootout => "Sprint Shootout",
            SessionType::Sprint => "Sprint",
            SessionType::Race => "Race",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "FP1",
            SessionType::Practice2 => "FP2",
            SessionType::Practice3 => "FP3",
            SessionType::Qualifying => "Q",
            SessionType::SprintQualifying => "SQ",
            SessionType::SprintShootout => "SS",
            SessionType::Sprint => "S",
            SessionType::Race => "R",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SessionType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s) || t.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown session type '{}'", s))
    }
}

impl TryFrom<String> for SessionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionType> for String {
    fn from(value: SessionType) -> Self {
        value.name().to_string()
    }
}

/// Identifies one session of one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub year: i32,
    pub circuit: String,
    pub session: SessionType,
}

impl SessionKey {
    pub fn new(year: i32, circuit: impl Into<String>, session: SessionType) -> Self {
        Self {
            year,
            circuit: circuit.into(),
            session,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.circuit, self.session)
    }
}

/// Classification entry for one driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverResult {
    pub code: String,
    pub full_name: String,
    pub team: String,
    pub position: Option<u32>,
    pub status: String,
}

/// A driver entered in a season, keyed by their three-letter code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonDriver {
    pub code: String,
    pub full_name: String,
}

/// Everything fetched for one session. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct SessionBundle {
    pub laps: Vec<LapRecord>,
    pub results: Vec<DriverResult>,
    pub total_laps: u32,
    pub weather: Vec<WeatherSample>,
}

impl SessionBundle {
    pub fn result_for(&self, driver: &str) -> Option<&DriverResult> {
        self.results.iter().find(|r| r.code == driver)
    }
}

pub type SharedSession = Arc<SessionBundle>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_type_parsing() {
        assert_eq!("R".parse::<SessionType>().unwrap(), SessionType::Race);
        assert_eq!("practice 2".parse::<SessionType>().unwrap(), SessionType::Practice2);
        assert_eq!("Sprint Shootout".parse::<SessionType>().unwrap(), SessionType::SprintShootout);
        assert!("Warmup".parse::<SessionType>().is_err());
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(2023, "Spa-Francorchamps", SessionType::Qualifying);
        assert_eq!(key.to_string(), "2023 Spa-Francorchamps Qualifying");
    }
}
