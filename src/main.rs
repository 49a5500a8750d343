mod cli;
mod ui;

use clap::Parser;
use colored::*;
use smartcustom::chat::{ChatOrchestrator, ChatRequest, OpenAiClient};
use smartcustom::config::{normalize_endpoint, Config};
use smartcustom::session::{ExpirySweeper, SessionStore};
use smartcustom::tools::{register_builtin_tools, ToolRegistry};
use std::io::Write;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::Args;
use ui::{display_error, display_reply, display_sessions, display_tools};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            display_error(&format!("{:#}", e));
            process::exit(1);
        }
    };
    if let Some(endpoint) = &args.api_endpoint {
        config.llm.endpoint = normalize_endpoint(endpoint);
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if args.no_tools {
        config.tool.enabled = false;
    }
    if let Err(e) = config.validate() {
        display_error(&e.to_string());
        process::exit(1);
    }

    let client = match OpenAiClient::new(&config.llm) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            display_error(&e.to_string());
            process::exit(1);
        }
    };

    let registry = Arc::new(ToolRegistry::new());
    let registered = register_builtin_tools(&registry, &config.tool);
    tracing::info!(tools = ?registered, "Registered built-in tools");

    let store = Arc::new(SessionStore::from_config(&config.chat));
    let sweeper = ExpirySweeper::from_config(&config.chat).spawn(Arc::clone(&store));

    let orchestrator = ChatOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        client,
        config.chat.clone(),
        config.tool.clone(),
    )
    .with_system_prompt(config.llm.system_prompt.clone());

    run_repl(&orchestrator, &args).await;

    sweeper.shutdown().await;
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "smartcustom=debug"
    } else {
        "smartcustom=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_repl(orchestrator: &ChatOrchestrator, args: &Args) {
    let store = orchestrator.sessions();
    let registry = orchestrator.tools();
    let user = args.user.as_deref();
    let mut current: Option<String> = None;

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".green().bold());
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                display_error(&format!("Failed to read input: {}", e));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            "/quit" | "/exit" => break,
            "/help" => print_help(),
            "/new" => {
                current = None;
                println!("{}", "Next message starts a new conversation.".cyan());
            }
            "/tools" => display_tools(&registry.get_all()),
            "/enable" | "/disable" => {
                let ok = if command == "/enable" {
                    registry.enable(rest)
                } else {
                    registry.disable(rest)
                };
                if ok {
                    println!("{}", format!("{} {}", &command[1..], rest).green());
                } else {
                    display_error(&format!("Tool not found: {}", rest));
                }
            }
            "/sessions" => match user {
                Some(user) => display_sessions(&store.list_by_user(user), current.as_deref()),
                None => match current.as_deref().and_then(|id| store.get(id)) {
                    Some(session) => display_sessions(&[session], current.as_deref()),
                    None => display_sessions(&[], None),
                },
            },
            "/use" => {
                if store.get(rest).is_some() {
                    current = Some(rest.to_string());
                    println!("{}", format!("Switched to {}", rest).cyan());
                } else {
                    display_error(&format!("Session not found: {}", rest));
                }
            }
            "/delete" => {
                let id = if rest.is_empty() {
                    current.clone().unwrap_or_default()
                } else {
                    rest.to_string()
                };
                if store.delete(&id) {
                    if current.as_deref() == Some(id.as_str()) {
                        current = None;
                    }
                    println!("{}", format!("Deleted {}", id).green());
                } else {
                    display_error(&format!("Session not found: {}", id));
                }
            }
            _ if command.starts_with('/') => {
                display_error(&format!("Unknown command: {}", command));
            }
            _ => {
                let mut request = ChatRequest::new(line);
                if let Some(id) = &current {
                    request = request.with_session(id.as_str());
                }
                if let Some(user) = user {
                    request = request.with_user(user);
                }

                let tool_names: Vec<String> = if args.tools.is_empty() {
                    registry
                        .get_enabled()
                        .iter()
                        .map(|tool| tool.name().to_string())
                        .collect()
                } else {
                    args.tools.clone()
                };

                let response = orchestrator.chat_with_tools(&request, &tool_names).await;
                if let Some(id) = &response.session_id {
                    current = Some(id.clone());
                }
                display_reply(&response);
            }
        }
    }
}

fn print_help() {
    println!(
        "{}",
        "Commands: /new /sessions /use <id> /delete [id] /tools /enable <name> /disable <name> /help /quit"
            .dimmed()
    );
}
