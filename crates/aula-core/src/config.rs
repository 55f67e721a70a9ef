//! Configuration for the aula client.
//!
//! YAML file with serde defaults, environment-variable overrides on top, and
//! a validation pass before anything touches the network. The default
//! location is `~/.config/aula/aula.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::AulaError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AulaConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    pub user: UserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Override for the state directory; defaults to the platform data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.aula.example".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AulaConfig {
    /// Default config file location, `~/.config/aula/aula.yaml`.
    pub fn default_path() -> Result<PathBuf, AulaError> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .ok_or_else(|| AulaError::Config("could not determine config directory".to_string()))?;
        Ok(config_dir.join("aula").join("aula.yaml"))
    }

    pub fn from_str(yaml: &str) -> Result<Self, AulaError> {
        let mut config: AulaConfig =
            serde_yaml::from_str(yaml).map_err(|err| AulaError::Config(err.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, AulaError> {
        let yaml = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|err| {
                AulaError::Config(format!(
                    "could not read {}: {err}",
                    path.as_ref().display()
                ))
            })?;
        Self::from_str(&yaml)
    }

    /// Build a configuration purely from environment variables, for running
    /// without a config file. `AULA_EMAIL` is required.
    pub fn from_env() -> Result<Self, AulaError> {
        let email = std::env::var("AULA_EMAIL")
            .map_err(|_| AulaError::Config("AULA_EMAIL is not set".to_string()))?;
        let mut config = Self {
            backend: BackendConfig::default(),
            user: UserConfig { email },
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("AULA_BASE_URL") {
            self.backend.base_url = base_url;
        }
        if let Ok(email) = std::env::var("AULA_EMAIL") {
            self.user.email = email;
        }
    }

    pub fn validate(&self) -> Result<(), AulaError> {
        if self.user.email.trim().is_empty() {
            return Err(AulaError::Config("user.email must be set".to_string()));
        }
        if !self.backend.base_url.starts_with("http") {
            return Err(AulaError::Config(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let yaml = r#"
user:
  email: "ana@colegio.edu"
"#;
        let config = AulaConfig::from_str(yaml).unwrap();
        assert_eq!(config.user.email, "ana@colegio.edu");
        assert_eq!(config.backend.base_url, default_base_url());
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.dir, None);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
backend:
  base_url: "https://backend.school.example"
  timeout_secs: 10

user:
  email: "ana@colegio.edu"

storage:
  dir: "/tmp/aula-state"

logging:
  level: "debug"
"#;
        let config = AulaConfig::from_str(yaml).unwrap();
        assert_eq!(config.backend.base_url, "https://backend.school.example");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.storage.dir, Some(PathBuf::from("/tmp/aula-state")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let yaml = r#"
user:
  email: ""
"#;
        assert!(matches!(
            AulaConfig::from_str(yaml),
            Err(AulaError::Config(_))
        ));
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let yaml = r#"
backend:
  base_url: "ftp://nope"
user:
  email: "ana@colegio.edu"
"#;
        assert!(matches!(
            AulaConfig::from_str(yaml),
            Err(AulaError::Config(_))
        ));
    }
}
