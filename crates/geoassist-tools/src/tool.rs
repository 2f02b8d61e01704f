//! Tool trait definition and function-schema presentation.

use crate::context::ToolContext;
use async_trait::async_trait;
use geoassist_protocol::{ToolError, ToolOutput, UiPayload};
use serde_json::{Value, json};
use std::fmt::Debug;

/// Interface for application-defined tools callable by the assistant.
///
/// `previous` carries the accumulated outputs of earlier requires-action
/// rounds within the same user turn, so one tool's result can inform a later
/// call before anything is persisted to application state.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Return the tool name, the unique key the assistant calls it by.
    fn name(&self) -> &str;
    /// Return the human-readable tool description.
    fn description(&self) -> &str;
    /// Return the JSON schema `properties` object for tool arguments.
    fn properties(&self) -> Value;

    /// Return the required argument names.
    fn required(&self) -> Vec<String> {
        Vec::new()
    }

    /// Invoke the tool with the application context, parsed arguments, and
    /// the outputs of prior rounds in the same turn.
    async fn call(
        &self,
        ctx: &ToolContext,
        args: Value,
        previous: &[ToolOutput],
    ) -> Result<Value, ToolError>;

    /// Render a successful output into a UI payload, if this tool has a
    /// user-visible product.
    fn render(&self, _args: &Value, _output: &Value) -> Option<UiPayload> {
        None
    }

    /// Build the remote function schema advertised for this tool.
    fn function_spec(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": {
                    "type": "object",
                    "properties": self.properties(),
                    "required": self.required(),
                },
            },
        })
    }
}
