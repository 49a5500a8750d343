use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::ToolResult;

pub const DEFAULT_TOOL_VERSION: &str = "1.0.0";

pub type ToolHandler =
    Box<dyn Fn(Value) -> BoxFuture<'static, Result<ToolResult, String>> + Send + Sync>;

/// A named unit of executable behavior.
///
/// Everything except the enabled flag is fixed at construction. The flag is
/// flipped through [`ToolRegistry`](super::ToolRegistry) so that its cached
/// views are invalidated alongside.
pub struct Tool {
    name: String,
    description: String,
    input_schema: Value,
    version: String,
    enabled: AtomicBool,
    handler: ToolHandler,
}

impl Tool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult, String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({ "type": "object", "properties": {} }),
            version: DEFAULT_TOOL_VERSION.to_string(),
            enabled: AtomicBool::new(true),
            handler: Box::new(move |args| handler(args).boxed()),
        }
    }

    /// Wrap a synchronous handler.
    pub fn from_fn<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value) -> Result<ToolResult, String> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(name, description, move |args: Value| {
            let handler = Arc::clone(&handler);
            async move { handler(&args) }
        })
    }

    pub fn with_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = input_schema;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Start out disabled once registered.
    pub fn disabled(self) -> Self {
        self.enabled.store(false, Ordering::Release);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Returns the previous value.
    pub(crate) fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }

    pub(crate) fn call(&self, args: Value) -> BoxFuture<'static, Result<ToolResult, String>> {
        (self.handler)(args)
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

/// Describe tools in the OpenAI function-calling format.
pub fn format_tools_for_llm(tools: &[Arc<Tool>]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.input_schema(),
                }
            })
        })
        .collect()
}
