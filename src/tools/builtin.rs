use serde_json::{json, Value};

use super::registry::ToolRegistry;
use super::tool::Tool;
use crate::config::ToolConfig;
use crate::models::ToolResult;

/// Register the built-in tools, disabling the ones listed in config.
/// Returns the names that were registered.
pub fn register_builtin_tools(registry: &ToolRegistry, config: &ToolConfig) -> Vec<String> {
    let mut registered = Vec::new();
    for tool in builtin_tools() {
        let name = tool.name().to_string();
        let tool = if config.disabled.iter().any(|d| d == &name) {
            tool.disabled()
        } else {
            tool
        };
        if registry.register(tool) {
            registered.push(name);
        }
    }
    registered
}

pub fn builtin_tools() -> Vec<Tool> {
    vec![
        Tool::from_fn(
            "echo",
            "Echo back the provided arguments. Useful for testing tool calling.",
            handle_echo,
        )
        .with_schema(json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to echo back"
                }
            }
        })),
        Tool::from_fn(
            "time_now",
            "Get the current date and time in RFC 3339 format.",
            handle_time_now,
        )
        .with_schema(json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })),
        Tool::from_fn(
            "calculator",
            "Perform arithmetic: add, subtract, multiply, divide, power, sqrt, percentage.",
            handle_calculator,
        )
        .with_schema(json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide", "power", "sqrt", "percentage"],
                    "description": "Operation to perform"
                },
                "operand1": {
                    "type": "number",
                    "description": "First operand"
                },
                "operand2": {
                    "type": "number",
                    "description": "Second operand (not needed for sqrt)"
                }
            },
            "required": ["operation", "operand1"],
            "additionalProperties": false
        })),
    ]
}

// Tool handlers

pub fn handle_echo(args: &Value) -> Result<ToolResult, String> {
    Ok(ToolResult::success_with_data("echo", args.clone()))
}

pub fn handle_time_now(_args: &Value) -> Result<ToolResult, String> {
    let now = chrono::Local::now();
    Ok(ToolResult::success_with_data(
        "current time",
        json!({ "now": now.to_rfc3339() }),
    ))
}

pub fn handle_calculator(args: &Value) -> Result<ToolResult, String> {
    let operation = args
        .get("operation")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing required argument: operation".to_string())?
        .to_lowercase();
    let operand1 = args.get("operand1").and_then(|v| v.as_f64());
    let operand2 = args.get("operand2").and_then(|v| v.as_f64());

    let binary = |name: &str| -> Result<(f64, f64), String> {
        match (operand1, operand2) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(format!("{} requires operand1 and operand2", name)),
        }
    };

    let value = match operation.as_str() {
        "add" => binary("add").map(|(a, b)| a + b),
        "subtract" => binary("subtract").map(|(a, b)| a - b),
        "multiply" => binary("multiply").map(|(a, b)| a * b),
        "divide" => binary("divide").and_then(|(a, b)| {
            if b == 0.0 {
                Err("Division by zero".to_string())
            } else {
                Ok(a / b)
            }
        }),
        "power" => binary("power").map(|(a, b)| a.powf(b)),
        "percentage" => binary("percentage").map(|(a, b)| a * b / 100.0),
        "sqrt" => match operand1 {
            Some(a) if a < 0.0 => Err("Cannot take the square root of a negative number".to_string()),
            Some(a) => Ok(a.sqrt()),
            None => Err("sqrt requires operand1".to_string()),
        },
        other => Err(format!("Unsupported operation: {}", other)),
    };

    Ok(match value {
        Ok(result) => ToolResult::success_with_data(
            format!("{} completed", operation),
            json!({ "result": result, "operation": operation }),
        ),
        Err(e) => ToolResult::error(e),
    })
}
