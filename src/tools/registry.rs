use futures::FutureExt;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, warn};

use super::tool::Tool;
use crate::models::ToolResult;

/// Shared, immutable listing of tools returned by the registry views.
pub type ToolSnapshot = Arc<[Arc<Tool>]>;

struct RegistryState {
    tools: HashMap<String, Arc<Tool>>,
    // Bumped by register/unregister.
    membership_version: u64,
    // Bumped by every mutation, enable/disable included.
    enabled_version: u64,
}

/// Memoized snapshot stamped with the state version it was computed from.
/// A version mismatch marks it dirty.
#[derive(Default)]
struct CachedView {
    slot: Mutex<Option<(u64, ToolSnapshot)>>,
}

impl CachedView {
    fn get_or_compute<F>(&self, version: u64, compute: F) -> ToolSnapshot
    where
        F: FnOnce() -> Vec<Arc<Tool>>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_version, snapshot)) = slot.as_ref() {
            if *cached_version == version {
                return Arc::clone(snapshot);
            }
        }
        let snapshot: ToolSnapshot = compute().into();
        *slot = Some((version, Arc::clone(&snapshot)));
        snapshot
    }
}

/// Authoritative name → tool map with cached "all" and "enabled" views.
pub struct ToolRegistry {
    state: RwLock<RegistryState>,
    all_view: CachedView,
    enabled_view: CachedView,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                tools: HashMap::new(),
                membership_version: 0,
                enabled_version: 0,
            }),
            all_view: CachedView::default(),
            enabled_view: CachedView::default(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a tool under its name. Returns false, leaving the registry
    /// untouched, when the name is blank or already taken.
    ///
    /// The registry takes ownership: the enabled flag lives in the tool, so a
    /// tool shared between registries would let one invalidate the other's views.
    pub fn register(&self, tool: Tool) -> bool {
        let tool = Arc::new(tool);
        if tool.name().trim().is_empty() {
            warn!("Rejected tool registration with an empty name");
            return false;
        }

        let mut state = self.write_state();
        if state.tools.contains_key(tool.name()) {
            warn!(tool = %tool.name(), "Rejected duplicate tool registration");
            return false;
        }
        debug!(tool = %tool.name(), version = %tool.version(), "Registered tool");
        state.tools.insert(tool.name().to_string(), tool);
        state.membership_version += 1;
        state.enabled_version += 1;
        true
    }

    pub fn unregister(&self, name: &str) -> bool {
        let mut state = self.write_state();
        if state.tools.remove(name).is_none() {
            return false;
        }
        debug!(tool = %name, "Unregistered tool");
        state.membership_version += 1;
        state.enabled_version += 1;
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<Tool>> {
        self.read_state().tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.read_state().tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read_state().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered tool, sorted by name.
    pub fn get_all(&self) -> ToolSnapshot {
        // The state read lock is held while computing so the snapshot matches
        // the version it is stamped with.
        let state = self.read_state();
        self.all_view
            .get_or_compute(state.membership_version, || sorted(state.tools.values()))
    }

    /// Tools whose enabled flag is set, sorted by name.
    pub fn get_enabled(&self) -> ToolSnapshot {
        let state = self.read_state();
        self.enabled_view.get_or_compute(state.enabled_version, || {
            sorted(state.tools.values().filter(|tool| tool.is_enabled()))
        })
    }

    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut state = self.write_state();
        let Some(tool) = state.tools.get(name) else {
            return false;
        };
        let previous = tool.set_enabled(enabled);
        if previous != enabled {
            debug!(tool = %name, enabled, "Toggled tool");
        }
        state.enabled_version += 1;
        true
    }

    /// Run a tool. Absent and disabled tools, handler errors and handler
    /// panics all come back as failed results.
    pub async fn execute(&self, name: &str, parameters: &Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::error(format!("Tool not found: {}", name));
        };
        if !tool.is_enabled() {
            return ToolResult::error(format!("Tool is disabled: {}", name));
        }

        debug!(tool = %name, "Executing tool");
        let outcome = AssertUnwindSafe(async { tool.call(parameters.clone()).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                debug!(tool = %name, success = result.success, "Tool finished");
                result
            }
            Ok(Err(message)) => {
                warn!(tool = %name, error = %message, "Tool returned an error");
                ToolResult::error(format!("Tool execution failed: {}", message))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(tool = %name, error = %message, "Tool panicked");
                ToolResult::error(format!("Tool execution failed: {}", message))
            }
        }
    }

    /// Check arguments against the tool's JSON schema (draft 7).
    pub fn validate_arguments(&self, tool_name: &str, arguments: &Value) -> Result<(), String> {
        let tool = self
            .get(tool_name)
            .ok_or_else(|| format!("Tool not found: {}", tool_name))?;

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(tool.input_schema())
            .map_err(|e| format!("Invalid tool schema: {}", e))?;

        if let Err(errors) = schema.validate(arguments) {
            let error_messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(error_messages.join("; "));
        }

        Ok(())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted<'a>(tools: impl Iterator<Item = &'a Arc<Tool>>) -> Vec<Arc<Tool>> {
    let mut tools: Vec<Arc<Tool>> = tools.cloned().collect();
    tools.sort_by(|a, b| a.name().cmp(b.name()));
    tools
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}
