use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Outcome of a single tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    pub timestamp: DateTime<Local>,
}

impl ToolResult {
    fn new(success: bool) -> Self {
        Self {
            success,
            message: None,
            data: None,
            error: None,
            metadata: HashMap::new(),
            timestamp: Local::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        let mut result = Self::new(true);
        result.message = Some(message.into());
        result
    }

    pub fn success_with_data(message: impl Into<String>, data: Value) -> Self {
        let mut result = Self::success(message);
        result.data = Some(data);
        result
    }

    pub fn error(error: impl Into<String>) -> Self {
        let mut result = Self::new(false);
        result.error = Some(error.into());
        result
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Text handed back to a language model as the tool's answer.
    pub fn to_llm_content(&self) -> String {
        if self.success {
            match (&self.data, &self.message) {
                (Some(data), _) => data.to_string(),
                (None, Some(message)) => message.clone(),
                (None, None) => "ok".to_string(),
            }
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("unknown tool failure")
            )
        }
    }
}
