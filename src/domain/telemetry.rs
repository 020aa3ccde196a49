// Car telemetry and chart domain models
use serde::Serialize;

/// DRS channel values at or above this mean the flap was open.
pub const DRS_OPEN_THRESHOLD: u8 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    /// Milliseconds since the Unix epoch.
    pub time_ms: i64,
    pub speed_kph: f64,
    pub throttle: f64,
    pub brake: bool,
    pub rpm: f64,
    pub gear: u8,
    pub drs: u8,
    /// Metres covered since the first sample of the lap.
    pub distance_m: f64,
    /// Car position on the circuit map, when the feed has one.
    pub position: Option<(f64, f64)>,
}

/// One timestamped X/Y reading from the positioning feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub time_ms: i64,
    pub x: f64,
    pub y: f64,
}

/// Car data for one lap.
#[derive(Debug, Clone, PartialEq)]
pub struct LapTelemetry {
    pub lap_number: u32,
    pub samples: Vec<TelemetrySample>,
}

impl LapTelemetry {
    pub fn distance_m(&self) -> f64 {
        self.samples.last().map(|s| s.distance_m).unwrap_or(0.0)
    }

    pub fn gear_shifts(&self) -> usize {
        self.samples
            .windows(2)
            .filter(|pair| pair[0].gear != pair[1].gear)
            .count()
    }

    pub fn top_speed(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.speed_kph).reduce(f64::max)
    }

    pub fn used_drs(&self) -> bool {
        self.samples.iter().any(|s| s.drs >= DRS_OPEN_THRESHOLD)
    }
}

/// Integrates speed over time to fill in `distance_m`.
///
/// The first sample sits at 0 m; each later sample adds the distance covered
/// at its own speed since the previous sample.
pub fn add_distance(samples: &mut [TelemetrySample]) {
    let mut distance = 0.0;
    let mut previous_ms: Option<i64> = None;

    for sample in samples.iter_mut() {
        if let Some(prev) = previous_ms {
            let dt_s = (sample.time_ms - prev) as f64 / 1000.0;
            distance += sample.speed_kph / 3.6 * dt_s;
        }
        sample.distance_m = distance;
        previous_ms = Some(sample.time_ms);
    }
}

/// Gives every sample the latest position recorded at or before it. Samples
/// taken before the first position reading use that first reading.
/// `samples` and `positions` must both be sorted by time.
pub fn attach_positions(samples: &mut [TelemetrySample], positions: &[PositionSample]) {
    if positions.is_empty() {
        return;
    }

    let mut idx = 0;
    for sample in samples.iter_mut() {
        while idx + 1 < positions.len() && positions[idx + 1].time_ms <= sample.time_ms {
            idx += 1;
        }
        let p = positions[idx];
        sample.position = Some((p.x, p.y));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TracePoint {
    pub distance_m: f64,
    pub value: f64,
}

impl TracePoint {
    pub fn new(distance_m: f64, value: f64) -> Self {
        Self { distance_m, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<TracePoint>,
}

impl SeriesData {
    pub fn new(id: String, name: String, color: Option<String>, points: Vec<TracePoint>) -> Self {
        Self {
            id,
            name,
            color,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    /// Holds each value until the next sample (gear changes).
    Step,
    /// Filled down to zero (brake application).
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub series: Vec<SeriesData>,
}

impl ChartData {
    pub fn new(
        id: &str,
        title: &str,
        y_label: &str,
        kind: ChartKind,
        series: Vec<SeriesData>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            x_label: "Distance (m)".to_string(),
            y_label: y_label.to_string(),
            kind,
            series,
        }
    }
}

/// Speed, throttle, brake, RPM and gear traces against lap distance.
pub fn lap_trace_charts(samples: &[TelemetrySample]) -> Vec<ChartData> {
    if samples.is_empty() {
        return Vec::new();
    }

    let trace = |id: &str, name: &str, color: &str, value: fn(&TelemetrySample) -> f64| {
        let points = samples
            .iter()
            .map(|s| TracePoint::new(s.distance_m, value(s)))
            .collect();
        vec![SeriesData::new(
            id.to_string(),
            name.to_string(),
            Some(color.to_string()),
            points,
        )]
    };

    vec![
        ChartData::new(
            "speed",
            "Speed Trace",
            "Speed (Km/h)",
            ChartKind::Line,
            trace("speed", "Speed", "#FF1801", |s| s.speed_kph),
        ),
        ChartData::new(
            "throttle",
            "Throttle Application",
            "Throttle (%)",
            ChartKind::Line,
            trace("throttle", "Throttle", "#00D2BE", |s| s.throttle),
        ),
        ChartData::new(
            "brake",
            "Braking Points",
            "Brake Applied",
            ChartKind::Area,
            trace("brake", "Brake", "#E10600", |s| if s.brake { 1.0 } else { 0.0 }),
        ),
        ChartData::new(
            "rpm",
            "Engine RPM",
            "RPM",
            ChartKind::Line,
            trace("rpm", "RPM", "#ff4c4c", |s| s.rpm),
        ),
        ChartData::new(
            "gear",
            "Gear Shifts",
            "Gear",
            ChartKind::Step,
            trace("gear", "Gear", "#ff7f7f", |s| s.gear as f64),
        ),
    ]
}

const LOWEST_GEAR: f64 = 1.0;
const HIGHEST_GEAR: f64 = 8.0;

/// A piece of the racing line between two consecutive samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSegment {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub gear: u8,
    /// Gear scaled onto 0..=1 over gears 1 to 8, for colour mapping.
    pub gear_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMap {
    pub title: String,
    pub segments: Vec<TrackSegment>,
}

/// Racing line of one lap with every segment tagged by the gear in use at
/// its start. Segments missing a position at either end are left out.
pub fn gear_track_map(samples: &[TelemetrySample]) -> Option<TrackMap> {
    let segments: Vec<TrackSegment> = samples
        .windows(2)
        .filter_map(|pair| {
            let (x0, y0) = pair[0].position?;
            let (x1, y1) = pair[1].position?;
            let gear = pair[0].gear;
            let level = (gear as f64 - LOWEST_GEAR) / (HIGHEST_GEAR - LOWEST_GEAR);
            Some(TrackSegment {
                x: [x0, x1],
                y: [y0, y1],
                gear,
                gear_level: level.clamp(0.0, 1.0),
            })
        })
        .collect();

    if segments.is_empty() {
        return None;
    }
    Some(TrackMap {
        title: "Fastest Lap Gear Shift Visualization".to_string(),
        segments,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(time_ms: i64, speed_kph: f64, gear: u8, drs: u8) -> TelemetrySample {
        TelemetrySample {
            time_ms,
            speed_kph,
            throttle: 100.0,
            brake: false,
            rpm: 11000.0,
            gear,
            drs,
            distance_m: 0.0,
            position: None,
        }
    }

    fn at(time_ms: i64, x: f64, y: f64) -> PositionSample {
        PositionSample { time_ms, x, y }
    }

    #[test]
    fn test_attach_positions_uses_latest_reading() {
        let mut samples = vec![
            sample(0, 200.0, 5, 0),
            sample(250, 210.0, 5, 0),
            sample(520, 220.0, 6, 0),
        ];
        let positions = vec![at(100, 1.0, 2.0), at(300, 3.0, 4.0), at(500, 5.0, 6.0)];
        attach_positions(&mut samples, &positions);

        assert_eq!(samples[0].position, Some((1.0, 2.0)));
        assert_eq!(samples[1].position, Some((1.0, 2.0)));
        assert_eq!(samples[2].position, Some((5.0, 6.0)));

        let mut untouched = vec![sample(0, 200.0, 5, 0)];
        attach_positions(&mut untouched, &[]);
        assert_eq!(untouched[0].position, None);
    }

    #[test]
    fn test_gear_track_map_segments() {
        let mut samples = vec![
            sample(0, 90.0, 1, 0),
            sample(100, 150.0, 4, 0),
            sample(200, 300.0, 8, 0),
            sample(300, 310.0, 8, 0),
        ];
        samples[0].position = Some((0.0, 0.0));
        samples[1].position = Some((10.0, 5.0));
        samples[2].position = Some((20.0, 5.0));

        let map = gear_track_map(&samples).unwrap();
        assert_eq!(map.segments.len(), 2);
        assert_eq!(map.segments[0].x, [0.0, 10.0]);
        assert_eq!(map.segments[0].y, [0.0, 5.0]);
        assert_eq!(map.segments[0].gear, 1);
        assert_eq!(map.segments[0].gear_level, 0.0);
        assert_eq!(map.segments[1].gear, 4);
        assert!((map.segments[1].gear_level - 3.0 / 7.0).abs() < 1e-12);

        let mut neutral = vec![sample(0, 0.0, 0, 0), sample(100, 10.0, 8, 0)];
        neutral[0].position = Some((0.0, 0.0));
        neutral[1].position = Some((1.0, 1.0));
        assert_eq!(gear_track_map(&neutral).unwrap().segments[0].gear_level, 0.0);

        assert!(gear_track_map(&[sample(0, 100.0, 3, 0)]).is_none());
    }

    #[test]
    fn test_add_distance_integrates_speed() {
        let mut samples = vec![
            sample(0, 360.0, 7, 0),
            sample(1000, 360.0, 8, 0),
            sample(1500, 180.0, 8, 0),
        ];
        add_distance(&mut samples);

        assert_eq!(samples[0].distance_m, 0.0);
        assert_eq!(samples[1].distance_m, 100.0);
        assert_eq!(samples[2].distance_m, 125.0);
    }

    #[test]
    fn test_lap_statistics() {
        let lap = LapTelemetry {
            lap_number: 3,
            samples: vec![
                sample(0, 250.0, 6, 0),
                sample(100, 280.0, 7, 12),
                sample(200, 310.0, 8, 12),
                sample(300, 150.0, 4, 0),
            ],
        };

        assert_eq!(lap.gear_shifts(), 3);
        assert_eq!(lap.top_speed(), Some(310.0));
        assert!(lap.used_drs());
    }

    #[test]
    fn test_lap_trace_charts() {
        let mut samples = vec![sample(0, 100.0, 3, 0), sample(1000, 108.0, 4, 0)];
        add_distance(&mut samples);

        let charts = lap_trace_charts(&samples);
        let ids: Vec<&str> = charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["speed", "throttle", "brake", "rpm", "gear"]);
        assert_eq!(charts[4].kind, ChartKind::Step);
        assert_eq!(charts[0].series[0].points[1].distance_m, 30.0);
        assert!(lap_trace_charts(&[]).is_empty());
    }
}
