// OpenF1 repository implementation
use crate::application::session_repository::SessionDataSource;
use crate::domain::lap::{Compound, LapRecord, SpeedTraps};
use crate::domain::session::{
    DriverResult, SeasonDriver, SessionBundle, SessionKey, SessionType, SharedSession,
};
use crate::domain::telemetry::{add_distance, attach_positions, PositionSample, TelemetrySample};
use crate::domain::weather::WeatherSample;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub struct OpenF1Repository {
    base_url: String,
    client: reqwest::Client,
    session_ids: RwLock<HashMap<SessionKey, i64>>,
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    session_key: i64,
    location: String,
    #[serde(default)]
    date_start: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DriverRow {
    driver_number: u32,
    #[serde(default)]
    name_acronym: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LapRow {
    driver_number: u32,
    lap_number: u32,
    #[serde(default)]
    lap_duration: Option<f64>,
    #[serde(default)]
    duration_sector_1: Option<f64>,
    #[serde(default)]
    duration_sector_2: Option<f64>,
    #[serde(default)]
    duration_sector_3: Option<f64>,
    #[serde(default)]
    i1_speed: Option<f64>,
    #[serde(default)]
    i2_speed: Option<f64>,
    #[serde(default)]
    st_speed: Option<f64>,
    #[serde(default)]
    date_start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StintRow {
    driver_number: u32,
    stint_number: u32,
    #[serde(default)]
    lap_start: Option<u32>,
    #[serde(default)]
    lap_end: Option<u32>,
    #[serde(default)]
    compound: Option<String>,
    #[serde(default)]
    tyre_age_at_start: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    air_temperature: f64,
    track_temperature: f64,
    humidity: f64,
    pressure: f64,
    rainfall: f64,
    wind_direction: f64,
    wind_speed: f64,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    driver_number: u32,
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    number_of_laps: Option<u32>,
    #[serde(default)]
    dnf: bool,
    #[serde(default)]
    dns: bool,
    #[serde(default)]
    dsq: bool,
}

#[derive(Debug, Deserialize)]
struct CarDataRow {
    date: String,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    throttle: Option<f64>,
    #[serde(default)]
    brake: Option<f64>,
    #[serde(default)]
    rpm: Option<f64>,
    #[serde(default)]
    n_gear: Option<u8>,
    #[serde(default)]
    drs: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct LocationRow {
    date: String,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
}

impl OpenF1Repository {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            session_ids: RwLock::new(HashMap::new()),
        }
    }

    /// Filters are `(key, value)` pairs joined as `key=value`, so a key of
    /// `date>` yields the feed's `date>=` comparison.
    fn build_url(&self, endpoint: &str, filters: &[(&str, String)]) -> String {
        let query: Vec<String> = filters
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        format!("{}/{}?{}", self.base_url, endpoint, query.join("&"))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.build_url(endpoint, filters);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenF1 /{}", endpoint))?;

        // OpenF1 answers an empty result set with 404
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenF1 /{} failed with status {}: {}", endpoint, status, body);
        }

        response
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("Failed to parse OpenF1 /{} response", endpoint))
    }

    async fn race_sessions(&self, year: i32) -> Result<Vec<SessionRow>> {
        let mut rows: Vec<SessionRow> = self
            .fetch(
                "sessions",
                &[
                    ("year", year.to_string()),
                    ("session_name", SessionType::Race.name().to_string()),
                ],
            )
            .await?;
        rows.sort_by_key(|r| r.date_start.as_deref().and_then(parse_time));
        Ok(rows)
    }

    async fn session_id(&self, key: &SessionKey) -> Result<i64> {
        if let Some(id) = self.session_ids.read().await.get(key) {
            return Ok(*id);
        }

        let rows: Vec<SessionRow> = self
            .fetch(
                "sessions",
                &[
                    ("year", key.year.to_string()),
                    ("location", key.circuit.clone()),
                    ("session_name", key.session.name().to_string()),
                ],
            )
            .await?;
        let id = rows
            .first()
            .map(|r| r.session_key)
            .with_context(|| format!("No session found for {}", key))?;

        self.session_ids.write().await.insert(key.clone(), id);
        Ok(id)
    }
}

#[async_trait]
impl SessionDataSource for OpenF1Repository {
    async fn list_circuits(&self, year: i32) -> Result<Vec<String>> {
        let mut circuits: Vec<String> = Vec::new();
        for row in self.race_sessions(year).await? {
            if !circuits.contains(&row.location) {
                circuits.push(row.location);
            }
        }
        Ok(circuits)
    }

    async fn list_drivers(&self, year: i32) -> Result<Vec<SeasonDriver>> {
        let opener = self
            .race_sessions(year)
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("No races found for {}", year))?;

        let rows: Vec<DriverRow> = self
            .fetch("drivers", &[("session_key", opener.session_key.to_string())])
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                Some(SeasonDriver {
                    code: r.name_acronym?,
                    full_name: r.full_name.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn load_session(&self, key: &SessionKey) -> Result<SharedSession> {
        let id = self.session_id(key).await?.to_string();
        let filter = [("session_key", id)];

        let (drivers, laps, stints, weather, results) = futures::try_join!(
            self.fetch::<DriverRow>("drivers", &filter),
            self.fetch::<LapRow>("laps", &filter),
            self.fetch::<StintRow>("stints", &filter),
            self.fetch::<WeatherRow>("weather", &filter),
            self.fetch::<ResultRow>("session_result", &filter),
        )?;

        let drivers: HashMap<u32, DriverRow> =
            drivers.into_iter().map(|d| (d.driver_number, d)).collect();
        let total_laps = total_laps(&results, &laps);

        let bundle = SessionBundle {
            laps: build_laps(laps, &stints, &drivers),
            results: build_results(results, &drivers),
            total_laps,
            weather: build_weather(weather),
        };
        tracing::info!(
            "Loaded {}: {} laps, {} classified, {} weather samples",
            key,
            bundle.laps.len(),
            bundle.results.len(),
            bundle.weather.len()
        );

        Ok(Arc::new(bundle))
    }

    async fn lap_telemetry(&self, key: &SessionKey, lap: &LapRecord) -> Result<Vec<TelemetrySample>> {
        let (start, end) = lap
            .window()
            .with_context(|| format!("Lap {} has no timing window", lap.lap_number))?;
        let id = self.session_id(key).await?;

        let filters = [
            ("session_key", id.to_string()),
            ("driver_number", lap.driver_number.to_string()),
            ("date>", start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("date<", end.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ];

        let (car_data, locations) = tokio::join!(
            self.fetch::<CarDataRow>("car_data", &filters),
            self.fetch::<LocationRow>("location", &filters),
        );
        let rows = car_data?;
        // Positions only feed the track map
        let positions = match locations {
            Ok(rows) => build_positions(rows),
            Err(e) => {
                tracing::warn!("No position data for lap {}: {:#}", lap.lap_number, e);
                Vec::new()
            }
        };

        let mut samples = build_car_data(rows);
        attach_positions(&mut samples, &positions);
        if samples.is_empty() {
            anyhow::bail!("No car data for lap {}", lap.lap_number);
        }
        Ok(samples)
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn seconds(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(Duration::from_secs_f64)
}

/// Joins laps with the stint they belong to. Laps outside every known stint
/// are dropped, since compound and tyre age cannot be derived for them.
fn build_laps(
    rows: Vec<LapRow>,
    stints: &[StintRow],
    drivers: &HashMap<u32, DriverRow>,
) -> Vec<LapRecord> {
    let total = rows.len();
    let mut laps: Vec<LapRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let stint = stints.iter().find(|s| {
                s.driver_number == row.driver_number
                    && s.lap_start.map(|l| l <= row.lap_number).unwrap_or(true)
                    && s.lap_end.map(|l| row.lap_number <= l).unwrap_or(true)
            })?;
            let driver = drivers.get(&row.driver_number);
            let lap_start = stint.lap_start.unwrap_or(1);

            Some(LapRecord {
                driver: driver
                    .and_then(|d| d.name_acronym.clone())
                    .unwrap_or_else(|| row.driver_number.to_string()),
                driver_number: row.driver_number,
                team: driver
                    .and_then(|d| d.team_name.clone())
                    .unwrap_or_default(),
                lap_number: row.lap_number,
                stint: stint.stint_number,
                compound: stint
                    .compound
                    .as_deref()
                    .map(Compound::from_label)
                    .unwrap_or(Compound::Unknown),
                tyre_age: stint.tyre_age_at_start.unwrap_or(0)
                    + row.lap_number.saturating_sub(lap_start),
                lap_time: seconds(row.lap_duration),
                sectors: [
                    seconds(row.duration_sector_1),
                    seconds(row.duration_sector_2),
                    seconds(row.duration_sector_3),
                ],
                speed_traps: SpeedTraps {
                    intermediate_1: row.i1_speed,
                    intermediate_2: row.i2_speed,
                    finish_line: None,
                    speed_trap: row.st_speed,
                },
                started_at: row.date_start.as_deref().and_then(parse_time),
            })
        })
        .collect();

    if laps.len() < total {
        tracing::debug!("Dropped {} laps without stint data", total - laps.len());
    }
    laps.sort_by_key(|l| (l.driver_number, l.lap_number));
    laps
}

fn result_status(row: &ResultRow) -> String {
    if row.dsq {
        "Disqualified".to_string()
    } else if row.dns {
        "Did not start".to_string()
    } else if row.dnf {
        "Retired".to_string()
    } else {
        "Finished".to_string()
    }
}

fn build_results(rows: Vec<ResultRow>, drivers: &HashMap<u32, DriverRow>) -> Vec<DriverResult> {
    rows.into_iter()
        .filter_map(|row| {
            let driver = drivers.get(&row.driver_number)?;
            Some(DriverResult {
                code: driver.name_acronym.clone()?,
                full_name: driver.full_name.clone().unwrap_or_default(),
                team: driver.team_name.clone().unwrap_or_default(),
                position: row.position,
                status: result_status(&row),
            })
        })
        .collect()
}

fn total_laps(results: &[ResultRow], laps: &[LapRow]) -> u32 {
    results
        .iter()
        .filter_map(|r| r.number_of_laps)
        .max()
        .or_else(|| laps.iter().map(|l| l.lap_number).max())
        .unwrap_or(0)
}

fn build_weather(rows: Vec<WeatherRow>) -> Vec<WeatherSample> {
    rows.into_iter()
        .map(|r| WeatherSample {
            air_temp: r.air_temperature,
            track_temp: r.track_temperature,
            humidity: r.humidity,
            pressure: r.pressure,
            wind_direction: r.wind_direction,
            wind_speed: r.wind_speed,
            rainfall: r.rainfall > 0.0,
        })
        .collect()
}

fn build_car_data(rows: Vec<CarDataRow>) -> Vec<TelemetrySample> {
    let mut samples: Vec<TelemetrySample> = rows
        .into_iter()
        .filter_map(|r| {
            Some(TelemetrySample {
                time_ms: parse_time(&r.date)?.timestamp_millis(),
                speed_kph: r.speed?,
                throttle: r.throttle.unwrap_or(0.0),
                brake: r.brake.unwrap_or(0.0) > 0.0,
                rpm: r.rpm.unwrap_or(0.0),
                gear: r.n_gear.unwrap_or(0),
                drs: r.drs.unwrap_or(0),
                distance_m: 0.0,
                position: None,
            })
        })
        .collect();

    samples.sort_by_key(|s| s.time_ms);
    add_distance(&mut samples);
    samples
}

fn build_positions(rows: Vec<LocationRow>) -> Vec<PositionSample> {
    let mut positions: Vec<PositionSample> = rows
        .into_iter()
        .filter_map(|r| {
            Some(PositionSample {
                time_ms: parse_time(&r.date)?.timestamp_millis(),
                x: r.x?,
                y: r.y?,
            })
        })
        .collect();

    positions.sort_by_key(|p| p.time_ms);
    positions
}
