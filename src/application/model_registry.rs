// Model registry - Per-circuit lap-time model artifacts on disk
use crate::domain::error::PredictionError;
use crate::domain::model::RegressionModel;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Characters that cannot appear in artifact file names.
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// A model ready for inference together with its input schema.
#[derive(Debug)]
pub struct LoadedModel {
    pub name: String,
    pub model: RegressionModel,
    pub schema: Vec<String>,
}

pub struct ModelRegistry {
    models_dir: PathBuf,
    extension: String,
    event_names: HashMap<String, String>,
    loaded: RwLock<HashMap<String, Arc<LoadedModel>>>,
}

impl ModelRegistry {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        event_names: HashMap<String, String>,
    ) -> Self {
        Self {
            models_dir: models_dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
            event_names,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Official event name for a circuit location, falling back to the location itself.
    pub fn event_name<'a>(&'a self, circuit: &'a str) -> &'a str {
        self.event_names
            .get(circuit)
            .map(String::as_str)
            .unwrap_or(circuit)
    }

    pub fn artifact_path(&self, circuit: &str) -> PathBuf {
        let safe_name = sanitize_event_name(self.event_name(circuit));
        self.models_dir
            .join(format!("{}_model.{}", safe_name, self.extension))
    }

    /// Loads (or reuses) the model trained for `circuit`.
    pub fn load(&self, circuit: &str) -> Result<Arc<LoadedModel>, PredictionError> {
        let path = self.artifact_path(circuit);
        let key = path.to_string_lossy().into_owned();

        if let Some(model) = self.loaded.read().ok().and_then(|m| m.get(&key).cloned()) {
            tracing::debug!("Model cache hit for {}", key);
            return Ok(model);
        }

        let loaded = Arc::new(read_artifact(circuit, &path)?);
        tracing::info!(
            "Loaded {} model {} with {} features",
            loaded.model.family(),
            loaded.name,
            loaded.schema.len()
        );

        if let Ok(mut cache) = self.loaded.write() {
            cache.insert(key, loaded.clone());
        }
        Ok(loaded)
    }
}

fn read_artifact(circuit: &str, path: &Path) -> Result<LoadedModel, PredictionError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PredictionError::ModelNotFound {
                circuit: circuit.to_string(),
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(PredictionError::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let model: RegressionModel =
        serde_json::from_str(&contents).map_err(|e| PredictionError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    model.validate().map_err(|reason| PredictionError::ModelLoad {
        path: path.to_path_buf(),
        reason,
    })?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let schema = model.feature_names().to_vec();

    Ok(LoadedModel {
        name,
        model,
        schema,
    })
}

/// Strips characters illegal in file names and replaces spaces with underscores.
pub fn sanitize_event_name(event_name: &str) -> String {
    event_name
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::tests::xgb_model;

    pub(crate) fn write_model(dir: &Path, file_name: &str, model: &RegressionModel) {
        let json = serde_json::to_string_pretty(model).unwrap();
        std::fs::write(dir.join(file_name), json).unwrap();
    }

    fn event_names() -> HashMap<String, String> {
        HashMap::from([("Monza".to_string(), "Italian Grand Prix".to_string())])
    }

    #[test]
    fn test_sanitize_event_name() {
        assert_eq!(sanitize_event_name("Italian Grand Prix"), "Italian_Grand_Prix");
        assert_eq!(sanitize_event_name("São Paulo Grand Prix"), "São_Paulo_Grand_Prix");
        assert_eq!(sanitize_event_name("Weird: <GP>/\"2024\"?|*"), "Weird_GP2024");
    }

    #[test]
    fn test_artifact_path_uses_event_name() {
        let registry = ModelRegistry::new("models", ".json", event_names());
        assert_eq!(
            registry.artifact_path("Monza"),
            PathBuf::from("models/Italian_Grand_Prix_model.json")
        );
        assert_eq!(
            registry.artifact_path("Yas Island"),
            PathBuf::from("models/Yas_Island_model.json")
        );
    }

    #[test]
    fn test_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path(), "json", event_names());

        match registry.load("Monza") {
            Err(PredictionError::ModelNotFound { circuit, path }) => {
                assert_eq!(circuit, "Monza");
                assert!(path.ends_with("Italian_Grand_Prix_model.json"));
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_and_reuse_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = xgb_model(&["LapNumber", "Driver_LEC"], 81.0);
        write_model(dir.path(), "Italian_Grand_Prix_model.json", &model);
        let registry = ModelRegistry::new(dir.path(), "json", event_names());

        let first = registry.load("Monza").unwrap();
        assert_eq!(first.schema, vec!["LapNumber", "Driver_LEC"]);
        assert_eq!(first.name, "Italian_Grand_Prix_model");

        let second = registry.load("Monza").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Zandvoort_model.json"), "{ not json").unwrap();
        let registry = ModelRegistry::new(dir.path(), "json", HashMap::new());

        assert!(matches!(
            registry.load("Zandvoort"),
            Err(PredictionError::ModelLoad { .. })
        ));
    }
}
