use crate::error::{PipelineError, PipelineResult};
use crate::persister::OutputPaths;
use liftoff_ml_preprocessing::{DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run settings. Every field has a default, so a JSON file only needs the
/// keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub artifact_file: String,
    pub metrics_file: String,
    pub test_fraction: f64,
    pub seed: u64,
    /// Train candidates on the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_path: PathBuf::from("data/spacex_clean.csv"),
            artifacts_dir: PathBuf::from("artifacts"),
            artifact_file: "best_model.json".into(),
            metrics_file: "metrics.txt".into(),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> PipelineResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| PipelineError::MissingInput {
            path: path.to_path_buf(),
            hint: format!("Could not read the config file ({e})."),
        })?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .map_err(|e| PipelineError::InvalidParameter(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.artifact_file.is_empty() || self.metrics_file.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "artifact_file and metrics_file must be non-empty".into(),
            ));
        }
        if self.artifact_file == self.metrics_file {
            return Err(PipelineError::InvalidParameter(
                "artifact_file and metrics_file must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            artifact: self.artifacts_dir.join(&self.artifact_file),
            metrics: self.artifacts_dir.join(&self.metrics_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, 42);
        let paths = config.output_paths();
        assert_eq!(paths.artifact, PathBuf::from("artifacts/best_model.json"));
        assert_eq!(paths.metrics, PathBuf::from("artifacts/metrics.txt"));
    }

    #[test]
    fn test_bad_fraction() {
        for f in [0.0, 1.0, -0.5, f64::NAN] {
            let config = PipelineConfig {
                test_fraction: f,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(PipelineError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_partial_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, r#"{ "seed": 7, "parallel": false }"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert!(!config.parallel);
        assert_eq!(config.test_fraction, 0.2);

        fs::write(&path, r#"{ "test_fraction": 2.0 }"#).unwrap();
        assert!(PipelineConfig::from_json_file(&path).is_err());
    }
}
