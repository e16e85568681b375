//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesdash.toml` files.

use crate::cli::OutputFormat;
use crate::qa::ModelBackend;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".salesdash.toml";

/// The dataset the dashboard was built around.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/Tizzy1279/Capstone_Project/refs/heads/main/sales_data.csv";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset source settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Question-answering model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Custom periods seeded into every session, name -> months.
    #[serde(default)]
    pub periods: BTreeMap<String, Vec<String>>,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output format for reports.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where the sales table comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// URL or local path of the CSV file.
    #[serde(default = "default_source")]
    pub source: String,

    /// Download timeout in seconds.
    #[serde(default = "default_dataset_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            timeout_seconds: default_dataset_timeout(),
        }
    }
}

fn default_source() -> String {
    DEFAULT_DATASET_URL.to_string()
}

fn default_dataset_timeout() -> u64 {
    60
}

/// Question-answering model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which model API to call.
    #[serde(default)]
    pub backend: ModelBackend,

    /// Model name. Empty means the backend's default.
    #[serde(default)]
    pub name: String,

    /// API base URL. Empty means the backend's default.
    #[serde(default)]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Largest serialized table, in characters, sent as context.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub api_token_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::default(),
            name: String::new(),
            url: String::new(),
            timeout_seconds: default_timeout(),
            max_context_chars: default_max_context_chars(),
            api_token_env: default_token_env(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_max_context_chars() -> usize {
    200_000
}

fn default_token_env() -> String {
    "HF_API_TOKEN".to_string()
}

impl ModelConfig {
    /// Fill empty name/url with the backend's defaults.
    pub fn apply_backend_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = match self.backend {
                ModelBackend::Huggingface => "distilbert-base-cased-distilled-squad",
                ModelBackend::Ollama => "llama3.2:latest",
            }
            .to_string();
        }
        if self.url.is_empty() {
            self.url = match self.backend {
                ModelBackend::Huggingface => "https://api-inference.huggingface.co",
                ModelBackend::Ollama => "http://localhost:11434",
            }
            .to_string();
        }
    }

    /// API token from the configured environment variable, if set.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Backend
    /// defaults are applied last so an explicit name or URL always wins.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref source) = args.dataset {
            self.dataset.source = source.clone();
        }

        if let Some(backend) = args.backend {
            if backend != self.model.backend {
                // name/url of another backend make no sense here
                self.model.name.clear();
                self.model.url.clear();
            }
            self.model.backend = backend;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.model_url {
            self.model.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        self.model.apply_backend_defaults();

        if let Some(format) = args.format {
            self.general.format = format;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that CLI validation cannot see because they come from the file.
    pub fn validate(&self) -> Result<()> {
        if self.model.timeout_seconds == 0 {
            anyhow::bail!("[model] timeout_seconds must be at least 1 second");
        }
        if self.dataset.timeout_seconds == 0 {
            anyhow::bail!("[dataset] timeout_seconds must be at least 1 second");
        }
        if self.model.max_context_chars == 0 {
            anyhow::bail!("[model] max_context_chars must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let mut config = Config::default();
        config.model.apply_backend_defaults();
        config.periods.insert(
            "H1".to_string(),
            ["01", "02", "03", "04", "05", "06"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dataset.source, DEFAULT_DATASET_URL);
        assert_eq!(config.model.backend, ModelBackend::Huggingface);
        assert_eq!(config.model.max_context_chars, 200_000);
        assert!(config.periods.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "json"
verbose = true

[dataset]
source = "data/sales.csv"

[model]
backend = "ollama"
timeout_seconds = 30

[periods]
H1 = ["01", "02", "03", "04", "05", "06"]
Holiday = ["11", "12"]
"#;

        let mut config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(config.general.verbose);
        assert_eq!(config.dataset.source, "data/sales.csv");
        assert_eq!(config.dataset.timeout_seconds, 60);
        assert_eq!(config.model.backend, ModelBackend::Ollama);
        assert_eq!(config.model.timeout_seconds, 30);
        assert_eq!(config.periods.get("Holiday").unwrap(), &vec!["11", "12"]);

        config.model.apply_backend_defaults();
        assert_eq!(config.model.url, "http://localhost:11434");
        assert_eq!(config.model.name, "llama3.2:latest");
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.dataset = Some("local.csv".to_string());
        args.model_url = Some("http://qa.internal".to_string());
        args.timeout = Some(5);
        args.format = Some(OutputFormat::Json);

        config.merge_with_args(&args);

        assert_eq!(config.dataset.source, "local.csv");
        assert_eq!(config.model.url, "http://qa.internal");
        assert_eq!(config.model.name, "distilbert-base-cased-distilled-squad");
        assert_eq!(config.model.timeout_seconds, 5);
        assert_eq!(config.general.format, OutputFormat::Json);
    }

    #[test]
    fn test_switching_backend_resets_defaults() {
        let mut config = Config::default();
        config.model.apply_backend_defaults();

        let mut args = make_args();
        args.backend = Some(ModelBackend::Ollama);
        config.merge_with_args(&args);

        assert_eq!(config.model.backend, ModelBackend::Ollama);
        assert_eq!(config.model.url, "http://localhost:11434");
    }

    #[test]
    fn test_zero_timeout_from_file_is_rejected() {
        let mut config: Config = toml::from_str("[model]\ntimeout_seconds = 0\n").unwrap();
        config.merge_with_args(&make_args());
        assert!(config.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(30);
        config.merge_with_args(&args);
        assert!(config.validate().is_ok());

        let config: Config = toml::from_str("[dataset]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[dataset]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[periods]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.periods.get("H1").map(|m| m.len()), Some(6));
    }
}
