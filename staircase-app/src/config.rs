use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use staircase_experiment::ExperimentConfig;

/// Reads and validates an experiment configuration file
pub fn load_config(path: &Path) -> Result<ExperimentConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: ExperimentConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_complete_file() {
        let file = write(
            r#"{
                "initial_contrast": 0.2,
                "contrast_step": 0.02,
                "min_contrast": 0.01,
                "max_contrast": 0.5,
                "max_reversals": 8,
                "max_response_time_s": 2.0,
                "inter_stimulus_interval_s": 1.0
            }"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_reversals, 8);
        assert_eq!(config.contrast_step, 0.02);
    }

    #[test]
    fn missing_fields_are_an_error() {
        let file = write(r#"{ "initial_contrast": 0.2 }"#);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn invalid_values_are_an_error() {
        let file = write(
            r#"{
                "initial_contrast": 0.2,
                "contrast_step": 0.02,
                "min_contrast": 0.6,
                "max_contrast": 0.5,
                "max_reversals": 8,
                "max_response_time_s": 2.0,
                "inter_stimulus_interval_s": 1.0
            }"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config(Path::new("/nonexistent/staircase.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/staircase.json"));
    }
}
