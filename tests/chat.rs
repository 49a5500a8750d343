use async_trait::async_trait;
use serde_json::{json, Value};
use smartcustom::chat::response::{extract_content, extract_usage, parse_completion, parse_tool_calls};
use smartcustom::chat::{
    ChatOrchestrator, ChatRequest, ChatResponseType, Completion, FunctionCall, LlmClient,
    LlmMessage, ToolCall,
};
use smartcustom::config::{ChatConfig, ToolConfig};
use smartcustom::models::{MessageType, TokenUsage};
use smartcustom::session::SessionStore;
use smartcustom::tools::{register_builtin_tools, ToolRegistry};
use smartcustom::{Result, SmartCustomError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays scripted completions and records what it was asked.
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<(Vec<LlmMessage>, Vec<Value>)>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<Completion>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<(Vec<LlmMessage>, Vec<Value>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, messages: &[LlmMessage], tools: &[Value]) -> Result<Completion> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), tools.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SmartCustomError::Other("no scripted reply".to_string())))
    }
}

fn text(content: &str, usage: Option<TokenUsage>) -> Result<Completion> {
    Ok(Completion {
        content: Some(content.to_string()),
        tool_calls: Vec::new(),
        usage,
    })
}

fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        tool_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

fn orchestrator(client: Arc<ScriptedClient>, tool_config: ToolConfig) -> ChatOrchestrator {
    let registry = Arc::new(ToolRegistry::new());
    register_builtin_tools(&registry, &tool_config);
    ChatOrchestrator::new(
        Arc::new(SessionStore::new(20)),
        registry,
        client,
        ChatConfig::default(),
        tool_config,
    )
}

fn all_tools() -> Vec<String> {
    vec!["echo".to_string(), "time_now".to_string(), "calculator".to_string()]
}

#[tokio::test]
async fn test_chat_creates_session_and_records_turn() {
    let client = ScriptedClient::new(vec![text("Your order shipped.", Some(TokenUsage::new(12, 4)))]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let response = orchestrator
        .chat(&ChatRequest::new("Where is my order?").with_user("u1"))
        .await;

    assert_eq!(response.response_type, ChatResponseType::Assistant);
    assert_eq!(response.message.as_deref(), Some("Your order shipped."));
    assert!(response.done);
    assert_eq!(response.token_usage, Some(TokenUsage::new(12, 4)));

    let session_id = response.session_id.unwrap();
    let session = orchestrator.sessions().get(&session_id).unwrap();
    let types: Vec<MessageType> = session.messages.iter().map(|m| m.message_type).collect();
    assert_eq!(
        types,
        vec![MessageType::System, MessageType::User, MessageType::Assistant]
    );
    assert_eq!(orchestrator.sessions().list_by_user("u1").len(), 1);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let (messages, tools) = &requests[0];
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "system");
    assert_eq!(messages[1].content.as_deref(), Some("Where is my order?"));
    assert!(tools.is_empty());
}

#[tokio::test]
async fn test_chat_continues_existing_session() {
    let client = ScriptedClient::new(vec![text("first", None), text("second", None)]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let first = orchestrator.chat(&ChatRequest::new("hello")).await;
    let session_id = first.session_id.unwrap();
    let second = orchestrator
        .chat(&ChatRequest::new("again").with_session(session_id.as_str()))
        .await;

    assert_eq!(second.session_id.as_deref(), Some(session_id.as_str()));
    assert_eq!(orchestrator.sessions().get(&session_id).unwrap().messages.len(), 5);
    assert_eq!(client.requests()[1].0.len(), 4);
}

#[tokio::test]
async fn test_chat_with_tools_runs_tool_calls() {
    let client = ScriptedClient::new(vec![
        Ok(Completion {
            content: None,
            tool_calls: vec![tool_call("call_1", "echo", r#"{"text":"ping"}"#)],
            usage: Some(TokenUsage::new(10, 3)),
        }),
        text("The tool said ping.", Some(TokenUsage::new(20, 5))),
    ]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let response = orchestrator
        .chat_with_tools(&ChatRequest::new("echo ping"), &all_tools())
        .await;

    assert!(!response.is_error());
    assert_eq!(response.message.as_deref(), Some("The tool said ping."));
    assert_eq!(response.tools_used, vec!["echo".to_string()]);
    assert_eq!(response.token_usage, Some(TokenUsage::new(30, 8)));

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].1.len(), 3);
    assert!(requests[1].1.is_empty());

    let follow_up = &requests[1].0;
    let tool_message = follow_up.last().unwrap();
    assert_eq!(tool_message.role, "tool");
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_message.content.as_deref().unwrap().contains("ping"));
    assert_eq!(follow_up[follow_up.len() - 2].role, "assistant");
}

#[tokio::test]
async fn test_disabled_tools_are_not_offered() {
    let client = ScriptedClient::new(vec![text("ok", None)]);
    let tool_config = ToolConfig {
        disabled: vec!["calculator".to_string()],
        ..ToolConfig::default()
    };
    let orchestrator = orchestrator(Arc::clone(&client), tool_config);
    assert!(orchestrator.tools().has_tool("calculator"));

    orchestrator
        .chat_with_tools(&ChatRequest::new("hi"), &all_tools())
        .await;

    let offered: Vec<String> = client.requests()[0]
        .1
        .iter()
        .map(|def| def["function"]["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(offered, vec!["echo".to_string(), "time_now".to_string()]);
}

#[tokio::test]
async fn test_tools_switched_off_in_config() {
    let client = ScriptedClient::new(vec![text("ok", None)]);
    let tool_config = ToolConfig {
        enabled: false,
        ..ToolConfig::default()
    };
    let orchestrator = orchestrator(Arc::clone(&client), tool_config);

    orchestrator
        .chat_with_tools(&ChatRequest::new("hi"), &all_tools())
        .await;
    assert!(client.requests()[0].1.is_empty());
}

#[tokio::test]
async fn test_unoffered_tool_call_is_reported_back() {
    let client = ScriptedClient::new(vec![
        Ok(Completion {
            content: None,
            tool_calls: vec![tool_call("call_9", "calculator", r#"{"operation":"add","operand1":1,"operand2":2}"#)],
            usage: None,
        }),
        text("Sorry, I cannot calculate that.", None),
    ]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let response = orchestrator
        .chat_with_tools(&ChatRequest::new("1+2?"), &["echo".to_string()])
        .await;

    assert!(!response.is_error());
    let follow_up = &client.requests()[1].0;
    let tool_message = follow_up.last().unwrap();
    assert!(tool_message.content.as_deref().unwrap().starts_with("Error:"));
}

#[tokio::test]
async fn test_tool_calls_without_offered_tools_store_no_empty_reply() {
    let client = ScriptedClient::new(vec![Ok(Completion {
        content: None,
        tool_calls: vec![tool_call("call_1", "echo", "{}")],
        usage: None,
    })]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let response = orchestrator.chat(&ChatRequest::new("hello")).await;

    assert!(response.is_error());
    assert!(response.error.unwrap().contains("empty reply"));
    assert_eq!(client.requests().len(), 1);

    let session = orchestrator
        .sessions()
        .get(response.session_id.as_deref().unwrap())
        .unwrap();
    assert!(session
        .messages
        .iter()
        .all(|m| m.message_type != MessageType::Assistant));
}

#[tokio::test]
async fn test_tool_calls_alongside_text_keep_the_text() {
    let client = ScriptedClient::new(vec![Ok(Completion {
        content: Some("Let me answer directly.".to_string()),
        tool_calls: vec![tool_call("call_1", "echo", "{}")],
        usage: None,
    })]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let response = orchestrator.chat(&ChatRequest::new("hello")).await;

    assert!(!response.is_error());
    assert_eq!(response.message.as_deref(), Some("Let me answer directly."));
    assert!(response.tools_used.is_empty());
}

#[tokio::test]
async fn test_llm_failure_becomes_error_response() {
    let client = ScriptedClient::new(vec![Err(SmartCustomError::Api {
        status: 503,
        message: "upstream unavailable".to_string(),
    })]);
    let orchestrator = orchestrator(Arc::clone(&client), ToolConfig::default());

    let response = orchestrator.chat(&ChatRequest::new("hello").with_user("u2")).await;

    assert!(response.is_error());
    assert!(response.message.is_none());
    let error = response.error.unwrap();
    assert!(error.starts_with("Failed to process chat request:"));
    assert!(error.contains("upstream unavailable"));

    // The user message is kept even though the model failed.
    let session = orchestrator
        .sessions()
        .get(response.session_id.as_deref().unwrap())
        .unwrap();
    assert_eq!(session.last_message().unwrap().message_type, MessageType::User);
}

#[test]
fn test_extract_content() {
    let response = json!({
        "choices": [{
            "message": {"content": "Hello, world!", "role": "assistant"}
        }]
    });
    assert_eq!(extract_content(&response).unwrap(), Some("Hello, world!".to_string()));

    let without = json!({"choices": [{"message": {"role": "assistant"}}]});
    assert_eq!(extract_content(&without).unwrap(), None);

    assert!(extract_content(&json!({"choices": []})).is_err());
    assert!(extract_content(&json!({})).is_err());
}

#[test]
fn test_parse_tool_calls() {
    let response = json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_123",
                    "type": "function",
                    "function": {"name": "echo", "arguments": "{\"text\": \"hi\"}"}
                }]
            }
        }]
    });
    let calls = parse_tool_calls(&response).unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_123");
    assert_eq!(calls[0].function.name, "echo");

    let plain = json!({"choices": [{"message": {"role": "assistant", "content": "No tools needed"}}]});
    assert!(parse_tool_calls(&plain).unwrap().is_empty());
}

#[test]
fn test_parse_completion_with_usage() {
    let response = json!({
        "choices": [{"message": {"role": "assistant", "content": "hi"}}],
        "usage": {"prompt_tokens": 7, "completion_tokens": 3, "total_tokens": 10}
    });
    let completion = parse_completion(&response).unwrap();
    assert_eq!(completion.content.as_deref(), Some("hi"));
    assert!(completion.tool_calls.is_empty());
    assert_eq!(completion.usage, Some(TokenUsage::new(7, 3)));

    assert_eq!(extract_usage(&json!({"choices": []})), None);
}
