use serde::{Deserialize, Serialize};

use super::defaults::{default_llm_endpoint, default_llm_model, default_request_timeout_secs};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            system_prompt: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Accept a base URL (`.../v1`) or a full chat-completions URL.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else if endpoint.ends_with("/v1") {
        format!("{}/chat/completions", endpoint)
    } else if endpoint.ends_with("/v1/") {
        format!("{}chat/completions", endpoint)
    } else {
        format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
    }
}
