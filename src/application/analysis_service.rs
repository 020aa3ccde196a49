// Analysis service - Use case for the full race analysis of one driver
use crate::application::session_repository::SessionDataSource;
use crate::domain::analysis::{race_narrative, DriverAnalysis, HeadlineMetrics, NerdStats};
use crate::domain::lap::{driver_laps, fastest_lap, quick_laps, stints, LapRecord};
use crate::domain::session::SessionKey;
use crate::domain::telemetry::{gear_track_map, lap_trace_charts, ChartData, LapTelemetry, TrackMap};
use std::sync::Arc;

#[derive(Clone)]
pub struct AnalysisService {
    sessions: Arc<dyn SessionDataSource>,
}

impl AnalysisService {
    pub fn new(sessions: Arc<dyn SessionDataSource>) -> Self {
        Self { sessions }
    }

    pub async fn driver_analysis(
        &self,
        key: &SessionKey,
        driver: &str,
    ) -> anyhow::Result<DriverAnalysis> {
        let session = self.sessions.load_session(key).await?;
        let laps = driver_laps(&session.laps, driver);
        let result = session.result_for(driver);
        let driver_name = result
            .map(|r| r.full_name.clone())
            .unwrap_or_else(|| driver.to_string());

        tracing::debug!("{} timed laps for {} in {}", laps.len(), driver, key);

        let session_name = key.session.name();
        let (narrative, sectors) = race_narrative(&laps, &driver_name, &key.circuit, session_name);

        let telemetry = self.quick_lap_telemetry(key, &laps).await;
        let stats = NerdStats::compute(&laps, &telemetry);

        let (charts, track_map) = fastest_lap_charts(&laps, &telemetry);

        Ok(DriverAnalysis {
            title: format!("{} - {} {}", driver_name, key.circuit, key.year),
            metrics: HeadlineMetrics::new(result, &laps),
            narrative,
            sectors,
            nerd_stats: NerdStats::panel(stats.as_ref(), &driver_name),
            strategy: stints(&laps),
            charts,
            track_map,
        })
    }

    /// Car data for every quick lap. A lap whose telemetry cannot be fetched
    /// is logged and left out.
    async fn quick_lap_telemetry(&self, key: &SessionKey, laps: &[LapRecord]) -> Vec<LapTelemetry> {
        let mut telemetry = Vec::new();

        for lap in quick_laps(laps) {
            match self.sessions.lap_telemetry(key, lap).await {
                Ok(samples) if !samples.is_empty() => telemetry.push(LapTelemetry {
                    lap_number: lap.lap_number,
                    samples,
                }),
                Ok(_) => {
                    tracing::warn!("No telemetry samples for lap {}", lap.lap_number);
                }
                Err(e) => {
                    tracing::warn!("Could not load telemetry for lap {}: {:#}", lap.lap_number, e);
                }
            }
        }

        telemetry
    }
}

/// Trace charts and gear map of the fastest lap, built from the quick-lap
/// telemetry already fetched. The fastest lap is always a quick lap.
fn fastest_lap_charts(
    laps: &[LapRecord],
    telemetry: &[LapTelemetry],
) -> (Vec<ChartData>, Option<TrackMap>) {
    let Some(fastest) = fastest_lap(laps) else {
        return (Vec::new(), None);
    };

    match telemetry.iter().find(|t| t.lap_number == fastest.lap_number) {
        Some(lap) => (lap_trace_charts(&lap.samples), gear_track_map(&lap.samples)),
        None => {
            tracing::warn!(
                "Could not generate telemetry plots for fastest lap {}",
                fastest.lap_number
            );
            (Vec::new(), None)
        }
    }
}
