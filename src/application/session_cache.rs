// Memoizing session source - historical sessions never change once published
use crate::application::session_repository::SessionDataSource;
use crate::domain::lap::LapRecord;
use crate::domain::session::{SeasonDriver, SessionKey, SharedSession};
use crate::domain::telemetry::TelemetrySample;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Wraps a [`SessionDataSource`] and keeps every loaded session and driver
/// list for the lifetime of the process. Telemetry is not cached.
pub struct CachedSessionSource {
    inner: Arc<dyn SessionDataSource>,
    sessions: RwLock<HashMap<SessionKey, SharedSession>>,
    drivers: RwLock<HashMap<i32, Vec<SeasonDriver>>>,
}

impl CachedSessionSource {
    pub fn new(inner: Arc<dyn SessionDataSource>) -> Self {
        Self {
            inner,
            sessions: RwLock::new(HashMap::new()),
            drivers: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionDataSource for CachedSessionSource {
    async fn list_circuits(&self, year: i32) -> anyhow::Result<Vec<String>> {
        self.inner.list_circuits(year).await
    }

    async fn list_drivers(&self, year: i32) -> anyhow::Result<Vec<SeasonDriver>> {
        if let Some(drivers) = self.drivers.read().await.get(&year) {
            return Ok(drivers.clone());
        }

        let drivers = self.inner.list_drivers(year).await?;
        self.drivers.write().await.insert(year, drivers.clone());
        Ok(drivers)
    }

    async fn load_session(&self, key: &SessionKey) -> anyhow::Result<SharedSession> {
        if let Some(session) = self.sessions.read().await.get(key) {
            tracing::debug!("Session cache hit for {}", key);
            return Ok(session.clone());
        }

        tracing::info!("Loading session data for {}", key);
        let session = self.inner.load_session(key).await?;
        // Concurrent misses for the same key both fetch; the first insert wins.
        let mut sessions = self.sessions.write().await;
        Ok(sessions.entry(key.clone()).or_insert(session).clone())
    }

    async fn lap_telemetry(
        &self,
        key: &SessionKey,
        lap: &LapRecord,
    ) -> anyhow::Result<Vec<TelemetrySample>> {
        self.inner.lap_telemetry(key, lap).await
    }
}
