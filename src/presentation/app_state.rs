// Application state for HTTP handlers
use crate::application::analysis_service::AnalysisService;
use crate::application::commentary::CommentaryService;
use crate::application::predictor::LapTimePredictor;
use crate::application::season_service::SeasonService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub season_service: SeasonService,
    pub analysis_service: AnalysisService,
    pub predictor: LapTimePredictor,
    pub commentary: Option<Arc<dyn CommentaryService>>,
}
