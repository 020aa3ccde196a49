// Application layer - Use cases over the session data source and models
pub mod analysis_service;
pub mod commentary;
pub mod feature_builder;
pub mod model_registry;
pub mod predictor;
pub mod season_service;
pub mod session_cache;
pub mod session_repository;
