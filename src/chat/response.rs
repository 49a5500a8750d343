use serde_json::Value;

use super::models::{Completion, ToolCall};
use crate::error::{Result, SmartCustomError};
use crate::models::TokenUsage;

fn first_message(response_json: &Value) -> Result<&Value> {
    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| SmartCustomError::Other("No choices in response".to_string()))?;

    let first_choice = choices
        .first()
        .ok_or_else(|| SmartCustomError::Other("Empty choices array".to_string()))?;

    first_choice
        .get("message")
        .ok_or_else(|| SmartCustomError::Other("No message in response".to_string()))
}

/// Extract tool calls from a non-streaming response, if any.
pub fn parse_tool_calls(response_json: &Value) -> Result<Vec<ToolCall>> {
    let message = first_message(response_json)?;
    match message.get("tool_calls") {
        Some(Value::Array(calls)) if !calls.is_empty() => {
            Ok(serde_json::from_value(Value::Array(calls.clone()))?)
        }
        _ => Ok(Vec::new()),
    }
}

/// Extract content from a non-streaming response
pub fn extract_content(response_json: &Value) -> Result<Option<String>> {
    let message = first_message(response_json)?;
    Ok(message
        .get("content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string()))
}

/// Usage block, when the provider reports one.
pub fn extract_usage(response_json: &Value) -> Option<TokenUsage> {
    let usage = response_json.get("usage")?;
    let prompt = usage.get("prompt_tokens")?.as_u64()?;
    let completion = usage.get("completion_tokens")?.as_u64()?;
    Some(TokenUsage::new(
        u32::try_from(prompt).unwrap_or(u32::MAX),
        u32::try_from(completion).unwrap_or(u32::MAX),
    ))
}

pub fn parse_completion(response_json: &Value) -> Result<Completion> {
    Ok(Completion {
        content: extract_content(response_json)?,
        tool_calls: parse_tool_calls(response_json)?,
        usage: extract_usage(response_json),
    })
}
