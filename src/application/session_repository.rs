// Repository trait for race session data access
use crate::domain::lap::LapRecord;
use crate::domain::session::{SeasonDriver, SessionKey, SharedSession};
use crate::domain::telemetry::TelemetrySample;
use async_trait::async_trait;

#[async_trait]
pub trait SessionDataSource: Send + Sync {
    /// Circuits (event locations) raced in a season, in calendar order
    async fn list_circuits(&self, year: i32) -> anyhow::Result<Vec<String>>;

    /// Drivers classified in the season's opening race
    async fn list_drivers(&self, year: i32) -> anyhow::Result<Vec<SeasonDriver>>;

    /// Laps, classification, lap count and weather for one session
    async fn load_session(&self, key: &SessionKey) -> anyhow::Result<SharedSession>;

    /// Car data recorded during one lap, with distance filled in
    async fn lap_telemetry(
        &self,
        key: &SessionKey,
        lap: &LapRecord,
    ) -> anyhow::Result<Vec<TelemetrySample>>;
}
