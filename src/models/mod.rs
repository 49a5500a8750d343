mod message;
mod session;
mod tool_result;

pub use message::{Message, MessageType, TokenUsage};
pub use session::Session;
pub use tool_result::ToolResult;
