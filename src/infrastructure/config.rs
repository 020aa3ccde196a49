use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub openf1: OpenF1Settings,
    pub models: ModelSettings,
    pub commentary: CommentarySettings,
    #[serde(default)]
    pub circuits: CircuitSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenF1Settings {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelSettings {
    pub directory: String,
    pub extension: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommentarySettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CircuitSettings {
    #[serde(default)]
    pub events: Vec<CircuitEvent>,
}

/// Maps a circuit location to the official event name its model is trained under.
#[derive(Debug, Deserialize, Clone)]
pub struct CircuitEvent {
    pub location: String,
    pub event_name: String,
}

impl CircuitSettings {
    pub fn event_names(&self) -> HashMap<String, String> {
        self.events
            .iter()
            .map(|e| (e.location.clone(), e.event_name.clone()))
            .collect()
    }
}

fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_address", "0.0.0.0:8080")?
        .set_default("openf1.base_url", "https://api.openf1.org/v1")?
        .set_default("models.directory", "models")?
        .set_default("models.extension", "json")?
        .set_default("commentary.model", "models/gemini-2.5-flash")?
        .set_default(
            "commentary.base_url",
            "https://generativelanguage.googleapis.com/v1beta",
        )?)
}

/// Loads `config/app.toml` (optional) overlaid with `PITWALL__SECTION__KEY`
/// environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = defaults()?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("PITWALL")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults_apply_without_file() {
        let config: AppConfig = defaults().unwrap().build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.models.extension, "json");
        assert!(config.commentary.api_key.is_none());
        assert!(config.circuits.events.is_empty());
    }

    #[test]
    fn test_file_overrides_and_event_names() {
        let toml = r#"
            [models]
            directory = "/srv/models"

            [[circuits.events]]
            location = "Monza"
            event_name = "Italian Grand Prix"

            [[circuits.events]]
            location = "Yas Island"
            event_name = "Abu Dhabi Grand Prix"
        "#;

        let config: AppConfig = defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.models.directory, "/srv/models");
        assert_eq!(config.models.extension, "json");

        let names = config.circuits.event_names();
        assert_eq!(names.get("Yas Island").map(String::as_str), Some("Abu Dhabi Grand Prix"));
        assert_eq!(names.len(), 2);
    }
}
