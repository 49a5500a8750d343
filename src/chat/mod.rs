mod client;
mod models;
mod orchestrator;
pub mod response;

pub use client::{LlmClient, OpenAiClient};
pub use models::{
    ChatRequest, ChatResponse, ChatResponseType, Completion, FunctionCall, LlmMessage, ToolCall,
};
pub use orchestrator::ChatOrchestrator;
