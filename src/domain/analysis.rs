// Driver analysis domain model - narrative, metrics and chart bundle
use super::lap::{fastest_lap, modal_compound, LapRecord, StintSummary};
use super::prediction::format_lap_time;
use super::session::DriverResult;
use super::telemetry::{ChartData, LapTelemetry, TrackMap};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

const NOT_AVAILABLE: &str = "N/A";

/// Titled block of text lines shown next to the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPanel {
    pub title: String,
    pub lines: Vec<String>,
}

impl TextPanel {
    fn new(title: String, lines: Vec<String>) -> Self {
        Self { title, lines }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub position: String,
    pub fastest_lap: String,
    pub status: String,
    pub team: Option<String>,
}

impl HeadlineMetrics {
    pub fn new(result: Option<&DriverResult>, laps: &[LapRecord]) -> Self {
        let (position, status) = match result {
            Some(r) => (
                r.position
                    .map(|p| format!("P{}", p))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                r.status.clone(),
            ),
            None => (NOT_AVAILABLE.to_string(), "Did not participate".to_string()),
        };

        let fastest_lap = fastest_lap(laps)
            .and_then(|l| l.lap_time)
            .map(|t| format_lap_time(t.as_secs_f64()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            position,
            fastest_lap,
            status,
            team: laps.first().map(|l| l.team.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverAnalysis {
    pub title: String,
    pub metrics: HeadlineMetrics,
    pub narrative: TextPanel,
    pub sectors: Option<TextPanel>,
    pub nerd_stats: TextPanel,
    pub strategy: Vec<StintSummary>,
    pub charts: Vec<ChartData>,
    pub track_map: Option<TrackMap>,
}

/// Fastest lap and longest stint story, plus best sector times.
pub fn race_narrative(
    laps: &[LapRecord],
    driver_name: &str,
    circuit: &str,
    session: &str,
) -> (TextPanel, Option<TextPanel>) {
    let Some(fastest) = fastest_lap(laps) else {
        let narrative = TextPanel::new(
            format!("Analysis for {}", driver_name),
            vec![format!(
                "No valid lap data was found for {} in the {} at {}. They may not have set a representative lap time.",
                driver_name, session, circuit
            )],
        );
        return (narrative, None);
    };

    let lap_time = fastest
        .lap_time
        .map(|t| format_lap_time(t.as_secs_f64()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let avg_speed = fastest
        .speed_traps
        .mean()
        .map(|v| format!("{:.1} km/h", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut lines = vec![
        format!(
            "Fastest lap: Lap {} with a time of {} on {} tyres.",
            fastest.lap_number, lap_time, fastest.compound
        ),
        format!("Average speed during that lap: {}.", avg_speed),
    ];
    if let Some((stint_laps, compound)) = longest_stint(laps) {
        lines.push(format!(
            "Longest stint: {} laps on {} tyres.",
            stint_laps, compound
        ));
    }

    let sector_lines = best_sectors(laps)
        .iter()
        .enumerate()
        .map(|(i, best)| {
            let value = best
                .map(|(t, _)| format!("{} s", t.as_secs_f64()))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            format!("Best Time In Sector {}: {}", i + 1, value)
        })
        .collect();

    (
        TextPanel::new(
            format!("{}'s {} Analysis at {}", driver_name, session, circuit),
            lines,
        ),
        Some(TextPanel::new("Sector Insights".to_string(), sector_lines)),
    )
}

/// Lap count and dominant compound of the longest stint; the earliest stint wins ties.
fn longest_stint(laps: &[LapRecord]) -> Option<(usize, String)> {
    let mut by_stint: BTreeMap<u32, Vec<&LapRecord>> = BTreeMap::new();
    for lap in laps {
        by_stint.entry(lap.stint).or_default().push(lap);
    }

    let mut longest: Option<&Vec<&LapRecord>> = None;
    for stint_laps in by_stint.values() {
        if longest.map(|l| stint_laps.len() > l.len()).unwrap_or(true) {
            longest = Some(stint_laps);
        }
    }

    let stint_laps = longest?;
    let compound = modal_compound(stint_laps.iter().copied())?;
    Some((stint_laps.len(), compound.to_string()))
}

/// Best time and the lap it was set on, per sector.
fn best_sectors(laps: &[LapRecord]) -> [Option<(Duration, u32)>; 3] {
    let mut best: [Option<(Duration, u32)>; 3] = [None; 3];
    for lap in laps {
        for (i, sector) in lap.sectors.iter().enumerate() {
            if let Some(t) = sector {
                if best[i].map(|(b, _)| *t < b).unwrap_or(true) {
                    best[i] = Some((*t, lap.lap_number));
                }
            }
        }
    }
    best
}

/// Aggregates over the driver's laps and their car telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct NerdStats {
    pub total_time: Duration,
    pub total_distance_km: f64,
    pub avg_gear_shifts: f64,
    pub top_speed_kph: f64,
    pub drs_laps: usize,
    /// Sector name, lap number and time of the quickest sector the driver set.
    pub best_sector: Option<(String, u32, f64)>,
}

impl NerdStats {
    pub fn compute(laps: &[LapRecord], telemetry: &[LapTelemetry]) -> Option<Self> {
        if laps.is_empty() || telemetry.is_empty() {
            return None;
        }

        let total_time: Duration = laps.iter().filter_map(|l| l.lap_time).sum();
        let total_distance_km =
            telemetry.iter().map(LapTelemetry::distance_m).sum::<f64>() / 1000.0;
        let avg_gear_shifts = telemetry.iter().map(|t| t.gear_shifts() as f64).sum::<f64>()
            / telemetry.len() as f64;
        let top_speed_kph = telemetry
            .iter()
            .filter_map(LapTelemetry::top_speed)
            .fold(0.0, f64::max);
        let drs_laps = telemetry.iter().filter(|t| t.used_drs()).count();

        let mut best_sector: Option<(String, u32, f64)> = None;
        for (i, best) in best_sectors(laps).iter().enumerate() {
            if let Some((t, lap)) = best {
                let secs = t.as_secs_f64();
                if best_sector.as_ref().map(|(_, _, b)| secs < *b).unwrap_or(true) {
                    best_sector = Some((format!("Sector {}", i + 1), *lap, secs));
                }
            }
        }

        Some(Self {
            total_time,
            total_distance_km,
            avg_gear_shifts,
            top_speed_kph,
            drs_laps,
            best_sector,
        })
    }

    pub fn panel(stats: Option<&Self>, driver_name: &str) -> TextPanel {
        let title = "Stats for Nerds".to_string();
        let Some(s) = stats else {
            return TextPanel::new(
                title,
                vec![format!(
                    "No detailed telemetry or lap data found for {}.",
                    driver_name
                )],
            );
        };

        let best_sector = s
            .best_sector
            .as_ref()
            .map(|(name, lap, secs)| format!("{} on Lap {} ({:.3}s)", name, lap, secs))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        TextPanel::new(
            title,
            vec![
                format!("Total Driving Time: {}", format_total_time(s.total_time)),
                format!("Total Distance: {:.2} km", s.total_distance_km),
                format!("Average Gear Shifts per Lap: {:.0}", s.avg_gear_shifts),
                format!("Top Speed: {} km/h", s.top_speed_kph),
                format!("DRS Used on: {} laps", s.drs_laps),
                format!("Most Impressive Sector: {}", best_sector),
            ],
        )
    }
}

/// `H:MM:SS.mmm`
fn format_total_time(total: Duration) -> String {
    let ms = total.as_millis();
    format!(
        "{}:{:02}:{:02}.{:03}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        ms % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lap::tests::lap;
    use crate::domain::lap::Compound;
    use crate::domain::telemetry::tests::sample;

    fn with_sectors(mut l: LapRecord, s: [f64; 3]) -> LapRecord {
        l.sectors = s.map(|v| Some(Duration::from_secs_f64(v)));
        l
    }

    #[test]
    fn test_headline_metrics_placeholders() {
        let m = HeadlineMetrics::new(None, &[]);
        assert_eq!(m.position, "N/A");
        assert_eq!(m.fastest_lap, "N/A");
        assert_eq!(m.status, "Did not participate");
        assert_eq!(m.team, None);
    }

    #[test]
    fn test_headline_metrics_from_result() {
        let result = DriverResult {
            code: "NOR".to_string(),
            full_name: "Lando Norris".to_string(),
            team: "McLaren".to_string(),
            position: Some(2),
            status: "Finished".to_string(),
        };
        let laps = vec![lap("NOR", 5, 1, Compound::Soft, Some(83.456))];

        let m = HeadlineMetrics::new(Some(&result), &laps);
        assert_eq!(m.position, "P2");
        assert_eq!(m.fastest_lap, "1:23.456");
        assert_eq!(m.team.as_deref(), Some("McLaren"));
    }

    #[test]
    fn test_narrative_without_laps() {
        let (narrative, sectors) = race_narrative(&[], "Lando Norris", "Monza", "Race");
        assert_eq!(narrative.title, "Analysis for Lando Norris");
        assert!(narrative.lines[0].starts_with("No valid lap data was found for Lando Norris"));
        assert!(sectors.is_none());
    }

    #[test]
    fn test_narrative_fastest_lap_and_longest_stint() {
        let laps = vec![
            with_sectors(lap("NOR", 2, 1, Compound::Soft, Some(85.0)), [28.0, 29.0, 28.0]),
            lap("NOR", 3, 2, Compound::Hard, Some(84.0)),
            lap("NOR", 4, 2, Compound::Hard, Some(84.5)),
        ];

        let (narrative, sectors) = race_narrative(&laps, "Lando Norris", "Monza", "Race");
        assert_eq!(narrative.title, "Lando Norris's Race Analysis at Monza");
        assert_eq!(
            narrative.lines[0],
            "Fastest lap: Lap 3 with a time of 1:24.000 on HARD tyres."
        );
        assert_eq!(narrative.lines[1], "Average speed during that lap: N/A.");
        assert_eq!(narrative.lines[2], "Longest stint: 2 laps on HARD tyres.");

        let sectors = sectors.unwrap();
        assert_eq!(sectors.lines[0], "Best Time In Sector 1: 28 s");
    }

    #[test]
    fn test_nerd_stats() {
        let laps = vec![
            with_sectors(lap("NOR", 2, 1, Compound::Soft, Some(80.0)), [27.5, 26.0, 26.5]),
            with_sectors(lap("NOR", 3, 1, Compound::Soft, Some(81.0)), [27.0, 26.5, 27.5]),
        ];
        let mut telemetry = vec![
            LapTelemetry {
                lap_number: 2,
                samples: vec![sample(0, 300.0, 7, 12), sample(1000, 300.0, 8, 12)],
            },
            LapTelemetry {
                lap_number: 3,
                samples: vec![sample(0, 290.0, 8, 0), sample(1000, 320.0, 8, 0)],
            },
        ];
        for t in telemetry.iter_mut() {
            crate::domain::telemetry::add_distance(&mut t.samples);
        }

        let stats = NerdStats::compute(&laps, &telemetry).unwrap();
        assert_eq!(stats.total_time, Duration::from_secs(161));
        assert_eq!(stats.avg_gear_shifts, 0.5);
        assert_eq!(stats.top_speed_kph, 320.0);
        assert_eq!(stats.drs_laps, 1);
        assert_eq!(stats.best_sector, Some(("Sector 2".to_string(), 2, 26.0)));

        let panel = NerdStats::panel(Some(&stats), "Lando Norris");
        assert_eq!(panel.lines[0], "Total Driving Time: 0:02:41.000");
        assert_eq!(panel.lines[5], "Most Impressive Sector: Sector 2 on Lap 2 (26.000s)");

        assert!(NerdStats::compute(&laps, &[]).is_none());
        let empty = NerdStats::panel(None, "Lando Norris");
        assert_eq!(empty.lines[0], "No detailed telemetry or lap data found for Lando Norris.");
    }
}
