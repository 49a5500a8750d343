mod builtin;
mod registry;
mod tool;

pub use builtin::{builtin_tools, register_builtin_tools};
pub use registry::{ToolRegistry, ToolSnapshot};
pub use tool::{format_tools_for_llm, Tool, ToolHandler, DEFAULT_TOOL_VERSION};
