use serde_json::json;
use smartcustom::models::ToolResult;
use smartcustom::tools::{Tool, ToolRegistry};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn echo_tool(name: &str) -> Tool {
    Tool::from_fn(name, "Echo the arguments back", |args| {
        Ok(ToolResult::success_with_data("echo", args.clone()))
    })
}

fn counting_tool(name: &str, counter: Arc<AtomicUsize>) -> Tool {
    Tool::from_fn(name, "Counts invocations", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::success("counted"))
    })
}

fn names(tools: &[Arc<Tool>]) -> Vec<String> {
    tools.iter().map(|t| t.name().to_string()).collect()
}

#[test]
fn test_register_rejects_duplicates_and_keeps_original() {
    let registry = ToolRegistry::new();
    assert!(registry.register(echo_tool("echo").with_version("1.0.0")));
    assert!(!registry.register(echo_tool("echo").with_version("2.0.0")));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("echo").unwrap().version(), "1.0.0");
}

#[test]
fn test_register_rejects_blank_name() {
    let registry = ToolRegistry::new();
    assert!(!registry.register(echo_tool("")));
    assert!(!registry.register(echo_tool("   ")));
    assert!(registry.is_empty());
}

#[test]
fn test_concurrent_register_same_name_has_single_winner() {
    let registry = Arc::new(ToolRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register(echo_tool("shared")))
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(registry.get_all().len(), 1);
}

#[test]
fn test_get_all_observes_register_and_unregister() {
    let registry = ToolRegistry::new();
    assert!(registry.get_all().is_empty());

    registry.register(echo_tool("b"));
    registry.register(echo_tool("a"));
    assert_eq!(names(&registry.get_all()), vec!["a", "b"]);

    assert!(registry.unregister("a"));
    assert_eq!(names(&registry.get_all()), vec!["b"]);
    assert!(!registry.has_tool("a"));

    assert!(!registry.unregister("a"));
}

#[test]
fn test_enabled_view_is_subset_of_all() {
    let registry = ToolRegistry::new();
    registry.register(echo_tool("a"));
    registry.register(echo_tool("b").disabled());
    registry.register(echo_tool("c"));

    assert_eq!(names(&registry.get_enabled()), vec!["a", "c"]);

    assert!(registry.disable("c"));
    assert!(registry.enable("b"));
    let enabled = names(&registry.get_enabled());
    let all: HashSet<String> = names(&registry.get_all()).into_iter().collect();
    assert_eq!(enabled, vec!["a", "b"]);
    assert!(enabled.iter().all(|n| all.contains(n)));

    assert!(!registry.enable("missing"));
    assert!(!registry.disable("missing"));
}

#[tokio::test]
async fn test_registries_own_their_tools() {
    let first = ToolRegistry::new();
    let second = ToolRegistry::new();
    assert!(first.register(echo_tool("echo")));
    assert!(second.register(echo_tool("echo")));

    // Warm the cached view before toggling the other registry.
    assert_eq!(names(&second.get_enabled()), vec!["echo"]);
    assert!(first.disable("echo"));

    assert!(first.get_enabled().is_empty());
    assert_eq!(names(&second.get_enabled()), vec!["echo"]);
    assert!(second.get("echo").unwrap().is_enabled());
    assert!(second.execute("echo", &json!({})).await.success);
    assert!(!first.execute("echo", &json!({})).await.success);
}

#[tokio::test]
async fn test_execute_echo() {
    let registry = ToolRegistry::new();
    registry.register(echo_tool("echo"));

    let result = registry.execute("echo", &json!({"x": 1})).await;
    assert!(result.success);
    assert_eq!(result.data, Some(json!({"x": 1})));
}

#[tokio::test]
async fn test_execute_missing_tool() {
    let registry = ToolRegistry::new();
    let result = registry.execute("nonexistent", &json!({})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_execute_disabled_tool_does_not_run() {
    let registry = ToolRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register(counting_tool("echo", Arc::clone(&counter)));

    assert!(registry.disable("echo"));
    let result = registry.execute("echo", &json!({})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("disabled"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    assert!(registry.enable("echo"));
    assert!(registry.execute("echo", &json!({})).await.success);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_converts_handler_error() {
    let registry = ToolRegistry::new();
    registry.register(Tool::from_fn("broken", "Always fails", |_| {
        Err("database unavailable".to_string())
    }));

    let result = registry.execute("broken", &json!({})).await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Tool execution failed: database unavailable")
    );
}

#[tokio::test]
async fn test_execute_contains_panics() {
    let registry = ToolRegistry::new();
    registry.register(Tool::from_fn("panicky", "Panics", |_| -> Result<ToolResult, String> {
        panic!("index out of range")
    }));
    registry.register(Tool::new("async_panicky", "Panics after await", |_| async {
        tokio::task::yield_now().await;
        if true {
            panic!("async failure");
        }
        Ok::<_, String>(ToolResult::success("unreachable"))
    }));
    registry.register(echo_tool("echo"));

    let result = registry.execute("panicky", &json!({})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("index out of range"));

    let result = registry.execute("async_panicky", &json!({})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("async failure"));

    // The registry stays usable.
    assert!(registry.execute("echo", &json!({})).await.success);
    assert_eq!(registry.get_all().len(), 3);
}

#[test]
fn test_concurrent_readers_see_consistent_views() {
    let registry = Arc::new(ToolRegistry::new());
    for i in 0..10 {
        registry.register(echo_tool(&format!("tool-{}", i)));
    }

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for round in 0..200 {
                let name = format!("tool-{}", round % 10);
                if round % 2 == 0 {
                    registry.disable(&name);
                } else {
                    registry.enable(&name);
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    let all = registry.get_all();
                    let enabled = registry.get_enabled();
                    assert_eq!(all.len(), 10);
                    assert!(enabled.len() <= all.len());
                    assert!(enabled.iter().all(|t| t.name().starts_with("tool-")));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    let enabled_now: Vec<String> = registry
        .get_all()
        .iter()
        .filter(|t| t.is_enabled())
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(names(&registry.get_enabled()), enabled_now);
}
