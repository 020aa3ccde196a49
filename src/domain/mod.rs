// Domain layer - Pure models and race-analysis rules
pub mod analysis;
pub mod error;
pub mod features;
pub mod lap;
pub mod model;
pub mod prediction;
pub mod session;
pub mod telemetry;
pub mod weather;
