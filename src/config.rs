//! Application configuration.
//!
//! Stored as TOML at `$XDG_CONFIG_HOME/propsearch/config.toml` (or the
//! platform config dir). Every field has a default, so a missing file or a
//! partial one is fine.
//!
//! ```toml
//! [dataset]
//! path = "data/cleaned_master_for_chatbot.csv"
//!
//! [llm]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4.1"
//! api_key_env = "OPENAI_API_KEY"
//! timeout_secs = 60
//! temperature = 0.0
//!
//! [synthesis]
//! max_records = 50
//! temperature = 0.7
//! ```
//!
//! `PROPSEARCH_DATASET`, `PROPSEARCH_MODEL` and `PROPSEARCH_BASE_URL` override
//! the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::prepare::CLEANED_FILE;
use crate::llm::openai::DEFAULT_BASE_URL;
use crate::synth::DEFAULT_MAX_RECORDS;

pub const ENV_DATASET: &str = "PROPSEARCH_DATASET";
pub const ENV_MODEL: &str = "PROPSEARCH_MODEL";
pub const ENV_BASE_URL: &str = "PROPSEARCH_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API key not set: export {0} or add it to .env")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub llm: LlmConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(CLEANED_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Extraction temperature.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4.1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Most result rows included in the synthesis prompt.
    pub max_records: usize,
    pub temperature: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            temperature: 0.7,
        }
    }
}

impl AppConfig {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            tracing::debug!(path = %path.display(), "loaded config file");
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    ///
    /// - Primary: `$XDG_CONFIG_HOME/propsearch/config.toml`
    /// - Fallback: platform config dir (e.g. `~/.config/propsearch/config.toml` on Linux)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("propsearch").join("config.toml"));
        }

        dirs::config_dir()
            .map(|p| p.join("propsearch").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn apply_env(&mut self) {
        if let Some(path) = env_value(ENV_DATASET) {
            self.dataset.path = PathBuf::from(path);
        }
        if let Some(model) = env_value(ENV_MODEL) {
            self.llm.model = model;
        }
        if let Some(base_url) = env_value(ENV_BASE_URL) {
            self.llm.base_url = base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model cannot be empty".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("llm.base_url cannot be empty".into()));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key_env cannot be empty".into(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be positive".into(),
            ));
        }
        if self.synthesis.max_records == 0 {
            return Err(ConfigError::Validation(
                "synthesis.max_records must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(name: &'static str, value: &str) -> Self {
            unsafe { std::env::set_var(name, value) };
            Self(name)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            unsafe { std::env::remove_var(self.0) };
        }
    }

    #[test]
    #[serial]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.synthesis.max_records, 50);
        assert_eq!(config.dataset.path, PathBuf::from(CLEANED_FILE));
    }

    #[test]
    #[serial]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[llm]\nmodel = \"gpt-4o-mini\"\n\n[synthesis]\nmax_records = 10\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.synthesis.max_records, 10);
        assert_eq!(config.synthesis.temperature, 0.7);
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[synthesis]\nmax_records = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Validation(_))
        ));

        std::fs::write(&path, "[llm\nmodel = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").unwrap();

        let _model = EnvVar::set(ENV_MODEL, "from-env");
        let _data = EnvVar::set(ENV_DATASET, "/tmp/listings.csv");
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.dataset.path, PathBuf::from("/tmp/listings.csv"));
    }

    #[test]
    #[serial]
    fn test_config_path_respects_xdg() {
        let _xdg = EnvVar::set("XDG_CONFIG_HOME", "/tmp/xdg-test");
        assert_eq!(
            AppConfig::config_path().unwrap(),
            PathBuf::from("/tmp/xdg-test/propsearch/config.toml")
        );
    }

    #[test]
    #[serial]
    fn test_api_key_required_only_on_demand() {
        let llm = LlmConfig {
            api_key_env: "PROPSEARCH_TEST_KEY".into(),
            ..Default::default()
        };
        assert!(matches!(llm.api_key(), Err(ConfigError::MissingApiKey(_))));

        let _key = EnvVar::set("PROPSEARCH_TEST_KEY", "sk-test");
        assert_eq!(llm.api_key().unwrap(), "sk-test");
    }
}
