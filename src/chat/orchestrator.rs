use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::client::LlmClient;
use super::models::{ChatRequest, ChatResponse, Completion, LlmMessage, ToolCall};
use crate::config::{ChatConfig, ToolConfig};
use crate::error::{Result, SmartCustomError};
use crate::models::{Message, Session, TokenUsage, ToolResult};
use crate::session::SessionStore;
use crate::tools::{format_tools_for_llm, Tool, ToolRegistry};

// Failure plus the session it happened in, if one was resolved.
type TurnError = (Option<String>, SmartCustomError);

/// Builds one chat turn on top of the session store, the tool registry and
/// a language-model client.
pub struct ChatOrchestrator {
    sessions: Arc<SessionStore>,
    tools: Arc<ToolRegistry>,
    client: Arc<dyn LlmClient>,
    chat_config: ChatConfig,
    tool_config: ToolConfig,
    system_prompt: Option<String>,
}

impl ChatOrchestrator {
    pub fn new(
        sessions: Arc<SessionStore>,
        tools: Arc<ToolRegistry>,
        client: Arc<dyn LlmClient>,
        chat_config: ChatConfig,
        tool_config: ToolConfig,
    ) -> Self {
        Self {
            sessions,
            tools,
            client,
            chat_config,
            tool_config,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub async fn chat(&self, request: &ChatRequest) -> ChatResponse {
        self.chat_with_tools(request, &[]).await
    }

    /// Run a turn offering the named tools (those that exist and are enabled).
    pub async fn chat_with_tools(&self, request: &ChatRequest, tool_names: &[String]) -> ChatResponse {
        match self.run_turn(request, tool_names).await {
            Ok(response) => response,
            Err((session_id, e)) => {
                error!(error = %e, "Chat turn failed");
                ChatResponse::error(session_id, format!("Failed to process chat request: {}", e))
            }
        }
    }

    async fn run_turn(
        &self,
        request: &ChatRequest,
        tool_names: &[String],
    ) -> std::result::Result<ChatResponse, TurnError> {
        let session = self.resolve_session(request);
        let session_id = session.session_id.clone();
        let fail = |e: SmartCustomError| (Some(session_id.clone()), e);

        let session = self
            .sessions
            .append_message(&session_id, Message::user(session_id.as_str(), request.message.as_str()))
            .map_err(fail)?;

        let offered = self.offered_tools(tool_names);
        let tool_defs = format_tools_for_llm(&offered);
        let mut history = self.build_history(&session);

        let mut completion = self
            .client
            .complete(&history, &tool_defs)
            .await
            .map_err(fail)?;
        let mut usage = completion.usage;
        let mut tools_used = Vec::new();

        if !completion.tool_calls.is_empty() {
            if offered.is_empty() {
                warn!(
                    calls = completion.tool_calls.len(),
                    "Model requested tools although none were offered; ignoring the calls"
                );
            } else {
                history.push(LlmMessage::assistant_tool_calls(
                    completion.content.clone(),
                    completion.tool_calls.clone(),
                ));
                for call in &completion.tool_calls {
                    let result = self.run_tool_call(call, &offered).await;
                    tools_used.push(call.function.name.clone());
                    history.push(LlmMessage::tool(call.id.as_str(), result.to_llm_content()));
                }

                // Tool results are fed back once; the follow-up gets no tools.
                completion = self.client.complete(&history, &[]).await.map_err(fail)?;
                usage = merge_usage(usage, completion.usage);
            }
        }

        let Completion { content, .. } = completion;
        let content = content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| fail(SmartCustomError::Other("Model returned an empty reply".to_string())))?;
        let mut reply = Message::assistant(session_id.as_str(), content);
        if let Some(usage) = usage {
            reply = reply.with_token_usage(usage);
        }
        self.sessions
            .append_message(&session_id, reply.clone())
            .map_err(fail)?;

        let mut response = ChatResponse::from_message(&reply);
        response.tools_used = tools_used;
        Ok(response)
    }

    fn resolve_session(&self, request: &ChatRequest) -> Session {
        request
            .session_id
            .as_deref()
            .and_then(|id| self.sessions.get(id))
            .unwrap_or_else(|| {
                self.sessions
                    .create(request.user_id.as_deref(), &self.chat_config.default_title)
            })
    }

    fn offered_tools(&self, tool_names: &[String]) -> Vec<Arc<Tool>> {
        if !self.tool_config.enabled || tool_names.is_empty() {
            return Vec::new();
        }
        self.tools
            .get_enabled()
            .iter()
            .filter(|tool| tool_names.iter().any(|name| name == tool.name()))
            .cloned()
            .collect()
    }

    fn build_history(&self, session: &Session) -> Vec<LlmMessage> {
        let mut history = Vec::with_capacity(session.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            history.push(LlmMessage::new("system", prompt.as_str()));
        }
        history.extend(session.messages.iter().map(LlmMessage::from));
        history
    }

    async fn run_tool_call(&self, call: &ToolCall, offered: &[Arc<Tool>]) -> ToolResult {
        let name = call.function.name.as_str();
        if !offered.iter().any(|tool| tool.name() == name) {
            warn!(tool = %name, "Model requested a tool that was not offered");
            return ToolResult::error(format!("Tool not available: {}", name));
        }

        let arguments = match parse_arguments(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(e) => return ToolResult::error(format!("Invalid tool arguments: {}", e)),
        };
        if let Err(e) = self.tools.validate_arguments(name, &arguments) {
            return ToolResult::error(format!("Invalid tool arguments: {}", e));
        }

        debug!(tool = %name, "Running tool call");
        let limit = Duration::from_millis(self.tool_config.timeout_ms);
        match tokio::time::timeout(limit, self.tools.execute(name, &arguments)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(tool = %name, timeout_ms = self.tool_config.timeout_ms, "Tool call timed out");
                ToolResult::error(format!("Tool timed out after {} ms: {}", self.tool_config.timeout_ms, name))
            }
        }
    }
}

/// Models send an empty string for argument-less calls.
fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(raw)?)
}

fn merge_usage(first: Option<TokenUsage>, second: Option<TokenUsage>) -> Option<TokenUsage> {
    match (first, second) {
        (Some(a), Some(b)) => Some(TokenUsage::new(
            a.prompt_tokens.saturating_add(b.prompt_tokens),
            a.generation_tokens.saturating_add(b.generation_tokens),
        )),
        (a, b) => a.or(b),
    }
}
