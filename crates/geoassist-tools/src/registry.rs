//! Registry for tool implementations.

use crate::tool::Tool;
use log::{debug, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory registry mapping tool names to implementations.
///
/// Populated once at startup; the set of registered names must be a superset
/// of whatever the assistant descriptor advertises. The registry never
/// executes anything itself — dispatch is the `ToolDispatcher`'s job.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    /// Map of tool name to implementation.
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool by name.
    ///
    /// Returns false and leaves the existing entry untouched when the name
    /// is already taken, so a misconfigured startup fails fast and loudly.
    pub fn register(&self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.name().to_string();
        let mut tools = self.tools.write();
        if tools.contains_key(&name) {
            warn!("ignoring duplicate tool registration (name={})", name);
            return false;
        }
        debug!("registering tool (name={})", name);
        tools.insert(name, tool);
        true
    }

    /// Fetch a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// List all registered tool names.
    pub fn list(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    /// Return remote function schemas for all registered tools.
    pub fn function_specs(&self) -> Vec<Value> {
        self.tools
            .read()
            .values()
            .map(|tool| tool.function_spec())
            .collect()
    }
}
