mod chat;
mod defaults;
mod llm;
mod tool;
mod validation;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use chat::ChatConfig;
pub use defaults::{
    DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_LLM_ENDPOINT, DEFAULT_LLM_MODEL, DEFAULT_MAX_HISTORY,
    DEFAULT_SESSION_TIMEOUT_MS, DEFAULT_SESSION_TITLE, DEFAULT_TOOL_TIMEOUT_MS,
    DEFAULT_WELCOME_MESSAGE,
};
pub use llm::{normalize_endpoint, LlmConfig};
pub use tool::ToolConfig;
pub use validation::expand_vars_with;

use crate::error::SmartCustomError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load from the first config file found, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::get_config_paths()
            .into_iter()
            .find(|path| path.exists())
            .map(|path| Self::load_from(&path))
            .transpose()?
            .unwrap_or_default();

        config.apply_overrides_with(|key| env::var(key).ok());
        Ok(config)
    }

    /// Parse a single file, YAML or JSON by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: Config = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".smartcustom.yaml"),
            PathBuf::from(".smartcustom.yml"),
            PathBuf::from(".smartcustom.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("smartcustom");
            paths.push(config_dir.join("smartcustom.yaml"));
            paths.push(config_dir.join("smartcustom.yml"));
            paths.push(config_dir.join("smartcustom.json"));
        }

        paths
    }

    /// Apply `SMARTCUSTOM_*` overrides and expand `${VAR}` references, both
    /// resolved through `lookup`. Unparseable numbers are ignored.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SMARTCUSTOM_MAX_HISTORY").and_then(|s| s.parse().ok()) {
            self.chat.max_history = v;
        }
        if let Some(v) = lookup("SMARTCUSTOM_SESSION_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.chat.session_timeout_ms = v;
        }
        if let Some(v) = lookup("SMARTCUSTOM_CLEANUP_INTERVAL_MS").and_then(|s| s.parse().ok()) {
            self.chat.cleanup_interval_ms = v;
        }
        if let Some(v) = lookup("SMARTCUSTOM_TOOLS_ENABLED") {
            self.tool.enabled = matches!(v.to_lowercase().as_str(), "true" | "1" | "yes");
        }
        if let Some(v) = lookup("SMARTCUSTOM_TOOL_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.tool.timeout_ms = v;
        }
        if let Some(v) = lookup("SMARTCUSTOM_LLM_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Some(v) = lookup("SMARTCUSTOM_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("SMARTCUSTOM_API_KEY").or_else(|| lookup("OPENROUTER_API_KEY")) {
            self.llm.api_key = Some(v);
        }

        self.llm.endpoint = normalize_endpoint(&expand_vars_with(&self.llm.endpoint, &lookup));
        self.llm.api_key = self
            .llm
            .api_key
            .as_deref()
            .map(|key| expand_vars_with(key, &lookup))
            .filter(|key| !key.is_empty() && !key.contains("${"));
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chat.max_history == 0 {
            return Err(SmartCustomError::Config(
                "chat.max_history must be at least 1".to_string(),
            ));
        }
        if self.chat.session_timeout_ms == 0 {
            return Err(SmartCustomError::Config(
                "chat.session_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.chat.cleanup_interval_ms == 0 {
            return Err(SmartCustomError::Config(
                "chat.cleanup_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.tool.timeout_ms == 0 {
            return Err(SmartCustomError::Config(
                "tool.timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
