//! Wire protocol types for GeoAssist runs, tool calls, and stream updates.

mod client;
mod tool;

pub use client::{AssistantClient, ClientError, RunEventStream};
pub use tool::ToolError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote-assigned identifier for an assistant descriptor.
pub type AssistantId = String;
/// Remote-assigned identifier for a conversation thread.
pub type ThreadId = String;
/// Remote-assigned identifier for a run.
pub type RunId = String;
/// Remote-assigned identifier for a tool call within a run.
pub type ToolCallId = String;

/// Descriptor body pushed to the remote service when creating or updating
/// an assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSpec {
    /// Unique assistant name used for remote lookup.
    pub name: String,
    /// System instructions for the assistant.
    pub instructions: String,
    /// Model identifier under the remote provider.
    pub model: String,
    /// Version tag used to detect descriptor drift.
    pub version: String,
    /// Function schemas for every registered tool.
    pub tools: Vec<Value>,
}

/// The remote service's record of an assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantDescriptor {
    /// Remote-assigned assistant id.
    pub id: AssistantId,
    /// Assistant name.
    pub name: String,
    /// Version tag stored remotely.
    pub version: String,
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is queued for execution.
    Queued,
    /// Run is actively producing output.
    InProgress,
    /// Run is paused waiting for tool outputs.
    RequiresAction,
    /// Run finished successfully.
    Completed,
    /// Run failed remotely.
    Failed,
    /// Run was cancelled.
    Cancelled,
    /// Run expired before completing.
    Expired,
}

impl RunStatus {
    /// Whether the status is final: no further transitions or streaming.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }

    /// Return the status as its snake_case wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
        }
    }
}

/// A tool invocation requested by the remote service.
///
/// Emitted once per requires-action round and consumed exactly once by the
/// dispatcher. Arguments stay as the raw JSON string the service produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Remote-assigned call id.
    pub id: ToolCallId,
    /// Registered tool name to invoke.
    pub name: String,
    /// Raw JSON argument string.
    pub arguments: String,
}

/// Result of one tool call, submitted back as part of an atomic batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    /// Id of the call this output answers.
    pub tool_call_id: ToolCallId,
    /// Result payload of the call.
    pub output: Value,
}

/// Events emitted by a streamed run.
///
/// A run stream yields text deltas in emission order and resolves with
/// exactly one `RequiresAction` or `Terminal` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum RunEvent {
    /// Incremental text fragment from the assistant.
    TextDelta { delta: String },
    /// Run paused to request tool execution.
    RequiresAction {
        run_id: RunId,
        tool_calls: Vec<ToolCall>,
    },
    /// Run reached a terminal status.
    Terminal { run_id: RunId, status: RunStatus },
}

/// User turn payload posted to a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum MessageContent {
    /// Plain text user message.
    Text { content: String },
    /// Image message for the one-shot vision path.
    Image { prompt: String, url: String },
}

/// Structured payload produced by a tool renderer and forwarded to the UI
/// alongside the assistant text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiPayload {
    /// Name of the tool that produced the payload.
    pub tool_name: String,
    /// Renderer output consumed by the UI.
    pub data: Value,
}

/// One update pushed through the stream sink.
///
/// `text` is the full accumulated buffer, never a fragment, so the UI never
/// reconstructs state. The terminal update of a turn carries `is_final`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageUpdate {
    /// Full accumulated assistant text.
    pub text: String,
    /// Rendered tool payloads, present only on finalization.
    pub payloads: Vec<UiPayload>,
    /// Marks the terminal update of the turn.
    pub is_final: bool,
}

/// Sink receiving stream updates during orchestration.
pub trait StreamSink: Send + Sync {
    /// Deliver one update to the UI layer.
    fn emit(&self, update: MessageUpdate);
}

#[cfg(test)]
mod tests {
    use super::RunStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn run_status_terminality() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(!RunStatus::RequiresAction.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
    }

    #[test]
    fn run_status_wire_strings_round_trip() {
        for status in [
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::RequiresAction,
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Cancelled,
            RunStatus::Expired,
        ] {
            let encoded = serde_json::to_string(&status).expect("encode");
            assert_eq!(encoded, format!("\"{}\"", status.as_str()));
        }
    }
}
