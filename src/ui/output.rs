use colored::*;
use smartcustom::chat::ChatResponse;
use smartcustom::models::{MessageType, Session};
use smartcustom::tools::Tool;
use std::sync::Arc;

pub fn display_reply(response: &ChatResponse) {
    if let Some(error) = &response.error {
        display_error(error);
        return;
    }
    if !response.tools_used.is_empty() {
        println!(
            "{}",
            format!("[tools] {}", response.tools_used.join(", ")).dimmed()
        );
    }
    println!("{}", response.message.as_deref().unwrap_or_default());
    if let Some(usage) = response.token_usage {
        println!(
            "{}",
            format!(
                "[tokens] prompt={} generation={} total={}",
                usage.prompt_tokens, usage.generation_tokens, usage.total_tokens
            )
            .dimmed()
        );
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "Error:".red(), error);
}

pub fn display_tools(tools: &[Arc<Tool>]) {
    if tools.is_empty() {
        println!("{}", "No tools registered.".yellow());
        return;
    }
    for tool in tools {
        let status = if tool.is_enabled() {
            "enabled".green()
        } else {
            "disabled".red()
        };
        println!(
            "  {} v{} [{}] - {}",
            tool.name().cyan(),
            tool.version(),
            status,
            tool.description()
        );
    }
}

pub fn display_sessions(sessions: &[Session], current: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No sessions.".yellow());
        return;
    }
    for session in sessions {
        let marker = if Some(session.session_id.as_str()) == current {
            "*"
        } else {
            " "
        };
        let turns = session
            .messages
            .iter()
            .filter(|m| m.message_type == MessageType::User)
            .count();
        println!(
            "{} {} {} ({} messages, {} user turns, updated {})",
            marker,
            session.session_id.cyan(),
            session.title,
            session.messages.len(),
            turns,
            session.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
