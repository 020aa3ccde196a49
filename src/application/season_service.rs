// Season service - Use case for the circuit and driver pickers
use crate::application::session_repository::SessionDataSource;
use crate::domain::session::{SeasonDriver, SUPPORTED_YEARS};
use std::sync::Arc;

#[derive(Clone)]
pub struct SeasonService {
    repository: Arc<dyn SessionDataSource>,
}

impl SeasonService {
    pub fn new(repository: Arc<dyn SessionDataSource>) -> Self {
        Self { repository }
    }

    pub fn is_supported(year: i32) -> bool {
        SUPPORTED_YEARS.contains(&year)
    }

    pub async fn list_circuits(&self, year: i32) -> anyhow::Result<Vec<String>> {
        self.repository.list_circuits(year).await
    }

    pub async fn list_drivers(&self, year: i32) -> anyhow::Result<Vec<SeasonDriver>> {
        self.repository.list_drivers(year).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_years() {
        assert!(SeasonService::is_supported(2023));
        assert!(SeasonService::is_supported(2024));
        assert!(!SeasonService::is_supported(2022));
        assert!(!SeasonService::is_supported(2018));
    }
}
