// Lap timing domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Laps slower than this multiple of the driver's fastest lap are not "quick laps".
const QUICK_LAP_THRESHOLD: f64 = 1.07;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compound {
    Hypersoft,
    Supersoft,
    Ultrasoft,
    Soft,
    Medium,
    Intermediate,
    Hard,
    Wet,
    Unknown,
}

impl Compound {
    /// Compounds a user can pick for a prediction.
    pub const SELECTABLE: [Compound; 8] = [
        Compound::Hypersoft,
        Compound::Supersoft,
        Compound::Ultrasoft,
        Compound::Soft,
        Compound::Medium,
        Compound::Intermediate,
        Compound::Hard,
        Compound::Wet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compound::Hypersoft => "HYPERSOFT",
            Compound::Supersoft => "SUPERSOFT",
            Compound::Ultrasoft => "ULTRASOFT",
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Intermediate => "INTERMEDIATE",
            Compound::Hard => "HARD",
            Compound::Wet => "WET",
            Compound::Unknown => "UNKNOWN",
        }
    }

    /// Lenient mapping for labels coming from timing feeds.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Compound::Unknown)
    }

    pub fn color(&self) -> &'static str {
        match self {
            Compound::Soft => "#FF3333",
            Compound::Medium => "#FFF200",
            Compound::Hard => "#F0F0F0",
            Compound::Intermediate => "#44D744",
            Compound::Wet => "#2772FF",
            _ => "grey",
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Compound::SELECTABLE
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| format!("unknown tyre compound '{}'", s))
    }
}

/// Speed trap readings (km/h) taken at fixed points of the lap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedTraps {
    pub intermediate_1: Option<f64>,
    pub intermediate_2: Option<f64>,
    pub finish_line: Option<f64>,
    pub speed_trap: Option<f64>,
}

impl SpeedTraps {
    /// Mean of the readings that are present.
    pub fn mean(&self) -> Option<f64> {
        let readings: Vec<f64> = [
            self.finish_line,
            self.speed_trap,
            self.intermediate_1,
            self.intermediate_2,
        ]
        .into_iter()
        .flatten()
        .collect();

        if readings.is_empty() {
            None
        } else {
            Some(readings.iter().sum::<f64>() / readings.len() as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapRecord {
    pub driver: String,
    pub driver_number: u32,
    pub team: String,
    pub lap_number: u32,
    pub stint: u32,
    pub compound: Compound,
    pub tyre_age: u32,
    pub lap_time: Option<Duration>,
    pub sectors: [Option<Duration>; 3],
    pub speed_traps: SpeedTraps,
    pub started_at: Option<DateTime<Utc>>,
}

impl LapRecord {
    /// Wall-clock window covered by this lap, when the feed reported both ends.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.started_at?;
        let duration = chrono::Duration::from_std(self.lap_time?).ok()?;
        Some((start, start + duration))
    }
}

/// One stint of a driver's tyre strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StintSummary {
    pub stint: u32,
    pub driver: String,
    pub start_lap: u32,
    pub end_lap: u32,
    pub compound: Compound,
    pub color: &'static str,
}

/// Laps set by `driver` that have a recorded lap time.
pub fn driver_laps(laps: &[LapRecord], driver: &str) -> Vec<LapRecord> {
    laps.iter()
        .filter(|lap| lap.driver == driver && lap.lap_time.is_some())
        .cloned()
        .collect()
}

pub fn fastest_lap(laps: &[LapRecord]) -> Option<&LapRecord> {
    laps.iter()
        .filter(|lap| lap.lap_time.is_some())
        .min_by_key(|lap| lap.lap_time)
}

/// Laps within 107% of the fastest lap in `laps`.
pub fn quick_laps(laps: &[LapRecord]) -> Vec<&LapRecord> {
    let Some(best) = fastest_lap(laps).and_then(|lap| lap.lap_time) else {
        return Vec::new();
    };
    let limit = best.as_secs_f64() * QUICK_LAP_THRESHOLD;

    laps.iter()
        .filter(|lap| {
            lap.lap_time
                .map(|t| t.as_secs_f64() < limit)
                .unwrap_or(false)
        })
        .collect()
}

/// Groups laps by stint number, in stint order.
pub fn stints(laps: &[LapRecord]) -> Vec<StintSummary> {
    let mut grouped: BTreeMap<u32, Vec<&LapRecord>> = BTreeMap::new();
    for lap in laps {
        grouped.entry(lap.stint).or_default().push(lap);
    }

    grouped
        .into_iter()
        .filter_map(|(stint, stint_laps)| {
            let first = stint_laps.first()?;
            let start_lap = stint_laps.iter().map(|l| l.lap_number).min()?;
            let end_lap = stint_laps.iter().map(|l| l.lap_number).max()?;
            Some(StintSummary {
                stint,
                driver: first.driver.clone(),
                start_lap,
                end_lap,
                compound: first.compound,
                color: first.compound.color(),
            })
        })
        .collect()
}

/// Most frequent compound among `laps`; ties resolve to the alphabetically
/// first compound name.
pub fn modal_compound<'a>(laps: impl IntoIterator<Item = &'a LapRecord>) -> Option<Compound> {
    let mut counts: BTreeMap<&'static str, (Compound, usize)> = BTreeMap::new();
    for lap in laps {
        counts
            .entry(lap.compound.as_str())
            .or_insert((lap.compound, 0))
            .1 += 1;
    }

    let mut best: Option<(Compound, usize)> = None;
    for (compound, n) in counts.into_values() {
        if best.map(|(_, m)| n > m).unwrap_or(true) {
            best = Some((compound, n));
        }
    }
    best.map(|(c, _)| c)
}
