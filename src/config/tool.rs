use serde::{Deserialize, Serialize};

use super::defaults::{default_tool_timeout_ms, default_tools_enabled};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolConfig {
    #[serde(default = "default_tools_enabled")]
    pub enabled: bool,
    /// Upper bound the orchestrator puts on a single tool call.
    #[serde(default = "default_tool_timeout_ms")]
    pub timeout_ms: u64,
    /// Built-in tools to register in the disabled state.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            enabled: default_tools_enabled(),
            timeout_ms: default_tool_timeout_ms(),
            disabled: Vec::new(),
        }
    }
}
