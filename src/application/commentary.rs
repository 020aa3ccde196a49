// Commentary service - Generative "pundit's verdict" on a prediction
use crate::domain::prediction::PredictionResult;
use async_trait::async_trait;

/// Opaque text generator.
#[async_trait]
pub trait CommentaryService: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Broadcast-style brief describing a simulated lap.
pub fn commentary_prompt(result: &PredictionResult) -> String {
    format!(
        "You are a seasoned and witty F1 TV commentator. Your task is to analyze a lap time \
         simulation and present your findings in an exciting and insightful way for a live \
         broadcast. Use Markdown for formatting, including bold text and emojis, to make your \
         analysis engaging.\n\n\
         **The Simulation:**\n\
         - Driver: {}\n\
         - Track: {}\n\
         - Lap: {}\n\
         - Tyres: {} ({} laps old)\n\
         - Weather: '{}'\n\n\
         The simulation predicts a lap time of **{}**.\n\n\
         **Your Commentary (in a few short, exciting paragraphs):**",
        result.driver_name,
        result.circuit,
        result.lap_number,
        result.compound,
        result.tyre_life,
        result.weather,
        result.time_str
    )
}
