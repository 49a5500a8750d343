use serde::{Deserialize, Serialize};

use super::defaults::{
    default_cleanup_interval_ms, default_max_history, default_session_timeout_ms,
    default_session_title, default_welcome_message,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    #[serde(default = "default_session_title")]
    pub default_title: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            session_timeout_ms: default_session_timeout_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            welcome_message: default_welcome_message(),
            default_title: default_session_title(),
        }
    }
}
