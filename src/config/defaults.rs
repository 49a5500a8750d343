pub const DEFAULT_MAX_HISTORY: usize = 20;
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 3_600_000; // 1 hour
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 300_000; // 5 minutes
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm the customer support assistant. How can I help you?";
pub const DEFAULT_SESSION_TITLE: &str = "New conversation";
pub const DEFAULT_LLM_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-4o-mini";

pub fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

pub fn default_session_timeout_ms() -> u64 {
    DEFAULT_SESSION_TIMEOUT_MS
}

pub fn default_cleanup_interval_ms() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_MS
}

pub fn default_welcome_message() -> String {
    DEFAULT_WELCOME_MESSAGE.to_string()
}

pub fn default_session_title() -> String {
    DEFAULT_SESSION_TITLE.to_string()
}

pub fn default_tools_enabled() -> bool {
    true
}

pub fn default_tool_timeout_ms() -> u64 {
    DEFAULT_TOOL_TIMEOUT_MS
}

pub fn default_llm_endpoint() -> String {
    DEFAULT_LLM_ENDPOINT.to_string()
}

pub fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

pub fn default_request_timeout_secs() -> u64 {
    60
}
