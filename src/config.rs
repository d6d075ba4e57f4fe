use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything the pipeline needs, from one JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub access_token: String,
    pub organization: String,
    pub team: String,
    pub project: String,
    pub sprint: String,
    pub area_path: String,
    pub worker_id: String,
    pub reports_dir: String,
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hapi")
        .join("config.json")
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "access_token": "secret",
                "organization": "acme",
                "team": "platform",
                "project": "tools",
                "sprint": "Sprint 7",
                "area_path": "tools\\infra",
                "worker_id": "horey",
                "reports_dir": "/tmp/reports"
            }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sprint, "Sprint 7");
        assert_eq!(config.worker_id, "horey");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "access_token": "secret" }}"#).unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
