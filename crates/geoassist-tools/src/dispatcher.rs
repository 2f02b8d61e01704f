//! Batch execution of requires-action tool calls.

use crate::context::ToolContext;
use crate::registry::ToolRegistry;
use geoassist_protocol::{ToolCall, ToolOutput, UiPayload};
use log::{debug, warn};
use serde_json::{Value, json};

/// Executes the pending tool calls of one requires-action round.
///
/// Every failure mode (unknown name, unparsable arguments, callback error)
/// is converted into a structured `{"success": false, "details": …}` output
/// so a single bad call never aborts the batch or the run. Calls are awaited
/// sequentially, one at a time, within a batch.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: ToolRegistry,
    context: ToolContext,
}

impl ToolDispatcher {
    /// Create a dispatcher over the given registry and application context.
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        Self { registry, context }
    }

    /// Borrow the underlying registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one batch of tool calls.
    ///
    /// `previous` holds the accumulated outputs of earlier rounds within the
    /// same user turn. The result always contains exactly one output per
    /// input call, tagged with the originating call id.
    pub async fn dispatch(&self, calls: &[ToolCall], previous: &[ToolOutput]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let output = self.execute(call, previous).await;
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }

    /// Render the outputs of a final round through each tool's renderer.
    ///
    /// Outputs consumed mid-chain by a later call are intermediate and must
    /// not pass through here.
    pub fn render_batch(&self, calls: &[ToolCall], outputs: &[ToolOutput]) -> Vec<UiPayload> {
        let mut payloads = Vec::new();
        for output in outputs {
            let Some(call) = calls.iter().find(|call| call.id == output.tool_call_id) else {
                continue;
            };
            let Some(tool) = self.registry.get(&call.name) else {
                continue;
            };
            let args = parse_arguments(&call.arguments).unwrap_or_else(|_| json!({}));
            if let Some(payload) = tool.render(&args, &output.output) {
                payloads.push(payload);
            }
        }
        payloads
    }

    async fn execute(&self, call: &ToolCall, previous: &[ToolOutput]) -> Value {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(
                "tool call names an unregistered tool (call_id={}, name={})",
                call.id, call.name
            );
            return error_output(format!("tool not found: {}", call.name));
        };
        let args = match parse_arguments(&call.arguments) {
            Ok(args) => args,
            Err(err) => {
                warn!(
                    "tool call arguments failed to parse (call_id={}, name={}): {}",
                    call.id, call.name, err
                );
                return error_output(format!("invalid arguments: {err}"));
            }
        };
        debug!(
            "executing tool call (call_id={}, name={}, previous_outputs={})",
            call.id,
            call.name,
            previous.len()
        );
        match tool.call(&self.context, args, previous).await {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    "tool call failed (call_id={}, name={}): {}",
                    call.id, call.name, err
                );
                error_output(err.to_string())
            }
        }
    }
}

/// Parse a raw JSON argument string; an empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw)
}

/// Structured failure output submitted in place of a tool result.
fn error_output(details: String) -> Value {
    json!({ "success": false, "details": details })
}
